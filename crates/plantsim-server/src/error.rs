//! Error types for the engine binary.
//!
//! [`ServerError`] wraps every failure mode of startup so `main` can
//! propagate with `?` and attach context through `anyhow`.

/// Top-level startup error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: plantsim_core::config::ConfigError,
    },

    /// The address space could not be built or a demo node did not
    /// resolve.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: plantsim_core::plant::SetupError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: plantsim_observer::StartupError,
    },

    /// Logging could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
