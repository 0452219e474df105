//! Variable definitions and their value backing.
//!
//! A [`Variable`] is either *stored* (the store owns the value behind a
//! per-variable lock) or *computed* (the value is read from a
//! [`ValueSource`] owned elsewhere, typically a simulator). Computed
//! variables are never writable through the store, whatever their access
//! level or range.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use plantsim_types::{AccessLevel, DataType, NodeId, Role, Value, ValueRange};

use crate::error::{ModelError, WriteError};

/// Static description of a variable node.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// Stable identifier.
    pub node_id: NodeId,
    /// Display name shown to clients.
    pub display_name: String,
    /// Declared data type; every stored value carries this tag.
    pub data_type: DataType,
    /// Optional inclusive engineering range (numeric types only).
    pub range: Option<ValueRange>,
    /// Whether external clients may write.
    pub access: AccessLevel,
    /// Roles allowed to write. Empty means any caller, including anonymous.
    pub write_roles: BTreeSet<Role>,
    /// Whether successful writes are forwarded to the historian.
    pub historized: bool,
}

impl VariableDefinition {
    /// A read-only, non-historized variable without a range.
    pub fn new(node_id: impl Into<NodeId>, display_name: &str, data_type: DataType) -> Self {
        Self {
            node_id: node_id.into(),
            display_name: display_name.to_owned(),
            data_type,
            range: None,
            access: AccessLevel::ReadOnly,
            write_roles: BTreeSet::new(),
            historized: false,
        }
    }

    /// Attach an inclusive range.
    #[must_use]
    pub fn with_range(mut self, range: ValueRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Make the variable externally writable by the given roles (empty
    /// slice: writable by anyone).
    #[must_use]
    pub fn writable_by(mut self, roles: &[Role]) -> Self {
        self.access = AccessLevel::ReadWrite;
        self.write_roles = roles.iter().copied().collect();
        self
    }

    /// Forward successful writes to the historian.
    #[must_use]
    pub fn historized(mut self) -> Self {
        self.historized = true;
        self
    }

    /// Check `value` against the declared type and range.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::TypeMismatch`] or [`WriteError::OutOfRange`].
    pub fn validate(&self, value: &Value) -> Result<(), WriteError> {
        let actual = value.data_type();
        if actual != self.data_type {
            return Err(WriteError::TypeMismatch {
                node: self.node_id.clone(),
                expected: self.data_type,
                actual,
            });
        }
        if let Some(range) = self.range
            && let Some(numeric) = value.as_f64()
            && !range.contains(numeric)
        {
            return Err(WriteError::OutOfRange {
                node: self.node_id.clone(),
                value: numeric,
                min: range.min,
                max: range.max,
            });
        }
        Ok(())
    }
}

/// A value owned outside the store and exposed through a computed getter.
pub trait ValueSource: Send + Sync + fmt::Debug {
    /// Return the current value.
    fn current(&self) -> Value;
}

/// A single-writer value cell that implements [`ValueSource`].
///
/// The simulator that owns the value keeps one clone and calls
/// [`set`](Self::set) after each tick; the address space keeps another and
/// reads it on demand.
#[derive(Debug, Clone)]
pub struct SharedValue(Arc<RwLock<Value>>);

impl SharedValue {
    /// Create a cell holding `initial`.
    pub fn new(initial: Value) -> Self {
        Self(Arc::new(RwLock::new(initial)))
    }

    /// Replace the published value.
    pub fn set(&self, value: Value) {
        *self.0.write() = value;
    }
}

impl ValueSource for SharedValue {
    fn current(&self) -> Value {
        self.0.read().clone()
    }
}

/// Where a variable's value lives.
#[derive(Debug)]
enum Backing {
    /// Value owned by the store.
    Stored(RwLock<Value>),
    /// Value read through a getter.
    Computed(Arc<dyn ValueSource>),
}

/// Runtime variable node: definition plus value backing.
#[derive(Debug)]
pub struct Variable {
    definition: VariableDefinition,
    backing: Backing,
    enabled: AtomicBool,
}

impl Variable {
    /// Create a stored variable.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidDefinition`] if the initial value does
    /// not satisfy the definition, or a range is attached to a non-numeric
    /// type.
    pub fn stored(definition: VariableDefinition, initial: Value) -> Result<Self, ModelError> {
        check_definition(&definition, &initial)?;
        Ok(Self {
            definition,
            backing: Backing::Stored(RwLock::new(initial)),
            enabled: AtomicBool::new(true),
        })
    }

    /// Create a computed (externally read-only) variable.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidDefinition`] if the source's current
    /// value does not carry the declared data type.
    pub fn computed(
        mut definition: VariableDefinition,
        source: Arc<dyn ValueSource>,
    ) -> Result<Self, ModelError> {
        let current = source.current();
        if current.data_type() != definition.data_type {
            return Err(ModelError::InvalidDefinition {
                node: definition.node_id,
                reason: format!(
                    "computed source yields {:?}, declared {:?}",
                    current.data_type(),
                    definition.data_type
                ),
            });
        }
        definition.access = AccessLevel::ReadOnly;
        Ok(Self {
            definition,
            backing: Backing::Computed(source),
            enabled: AtomicBool::new(true),
        })
    }

    /// The static definition.
    pub const fn definition(&self) -> &VariableDefinition {
        &self.definition
    }

    /// Whether the value comes from a computed getter.
    pub const fn is_computed(&self) -> bool {
        matches!(self.backing, Backing::Computed(_))
    }

    /// Whether the node is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Read the current value.
    pub fn read(&self) -> Value {
        match &self.backing {
            Backing::Stored(cell) => cell.read().clone(),
            Backing::Computed(source) => source.current(),
        }
    }

    /// Validate and store `value`. The check and the store happen under the
    /// same write lock, so concurrent readers see either the old or the new
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::NotWritable`] for computed variables, or the
    /// validation error from [`VariableDefinition::validate`].
    pub fn write(&self, value: Value) -> Result<(), WriteError> {
        self.write_with(value, |_| ())
    }

    /// Like [`write`](Self::write), then hand the stored value to
    /// `on_stored` before the write lock is released. Concurrent writers
    /// reach `on_stored` in the order their values were stored.
    pub(crate) fn write_with(
        &self,
        value: Value,
        on_stored: impl FnOnce(&Value),
    ) -> Result<(), WriteError> {
        match &self.backing {
            Backing::Computed(_) => Err(WriteError::NotWritable(self.definition.node_id.clone())),
            Backing::Stored(cell) => {
                let mut guard = cell.write();
                self.definition.validate(&value)?;
                *guard = value;
                let stored: &Value = &guard;
                on_stored(stored);
                Ok(())
            }
        }
    }
}

/// Reject definitions whose initial value or range is inconsistent.
fn check_definition(definition: &VariableDefinition, initial: &Value) -> Result<(), ModelError> {
    if definition.range.is_some() && !definition.data_type.is_numeric() {
        return Err(ModelError::InvalidDefinition {
            node: definition.node_id.clone(),
            reason: format!("range on non-numeric type {:?}", definition.data_type),
        });
    }
    definition
        .validate(initial)
        .map_err(|e| ModelError::InvalidDefinition {
            node: definition.node_id.clone(),
            reason: format!("initial value rejected: {e}"),
        })
}
