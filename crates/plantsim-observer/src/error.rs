//! Error types for the Observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use plantsim_model::{ModelError, WriteError};

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The address space rejected the write.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// The address space could not serve the node.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A component the route needs is not attached.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl ObserverError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Write(e) => match e {
                WriteError::AccessDenied { .. } => StatusCode::FORBIDDEN,
                WriteError::OutOfRange { .. } | WriteError::TypeMismatch { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                WriteError::NotWritable(_) => StatusCode::CONFLICT,
                WriteError::Model(m) => model_status(m),
            },
            Self::Model(m) => model_status(m),
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

const fn model_status(error: &ModelError) -> StatusCode {
    match error {
        ModelError::UnknownNode(_) | ModelError::WrongNodeKind { .. } => StatusCode::NOT_FOUND,
        ModelError::NodeDisabled(_) => StatusCode::CONFLICT,
        ModelError::DuplicateNode(_)
        | ModelError::InvalidDefinition { .. }
        | ModelError::StaleHandle(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use plantsim_types::{DataType, NodeId};

    use super::*;

    #[test]
    fn write_rejections_map_to_distinct_statuses() {
        let node = NodeId::new("Demo.OverridePercentage");
        let denied = ObserverError::from(WriteError::AccessDenied {
            node: node.clone(),
            user: "anonymous".to_owned(),
            reason: "no credentials".to_owned(),
        });
        let range = ObserverError::from(WriteError::OutOfRange {
            node: node.clone(),
            value: 150.0,
            min: 0.0,
            max: 100.0,
        });
        let mismatch = ObserverError::from(WriteError::TypeMismatch {
            node: node.clone(),
            expected: DataType::Double,
            actual: DataType::Boolean,
        });
        let read_only = ObserverError::from(WriteError::NotWritable(node.clone()));
        let unknown = ObserverError::from(ModelError::UnknownNode(node));

        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        assert_eq!(range.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(mismatch.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(read_only.status(), StatusCode::CONFLICT);
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }
}
