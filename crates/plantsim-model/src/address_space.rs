//! The address space: node registry, handle resolution, and the variable
//! store read/write contract.
//!
//! An [`AddressSpace`] is assembled once through an [`AddressSpaceBuilder`]
//! and is structurally immutable afterwards. Identifiers are resolved into
//! typed handles ([`VariableHandle`], [`ObjectHandle`]) at startup; ticks
//! use the handles directly and never search by identifier.
//!
//! Values are interior-mutable, one lock per variable. Two write paths
//! exist:
//!
//! - [`AddressSpace::write`] for simulators. It validates type and range but
//!   skips the permission gate.
//! - [`AddressSpace::write_as`] for external clients. It consults the
//!   [`PermissionGate`] first.
//!
//! Both forward the stored value of a historized variable to the
//! [`Historian`] while the variable's write lock is still held, stamped with
//! the caller's timestamp.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use plantsim_types::{NodeId, Value};
use tracing::{debug, info};

use crate::access::{AccessDecision, AllowAll, Credentials, PermissionGate};
use crate::error::{ModelError, WriteError};
use crate::historian::{Historian, NullHistorian};
use crate::variable::{ValueSource, Variable, VariableDefinition};

/// Kind of a node in the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A value-holding variable.
    Variable,
    /// An oscillating condition.
    Condition,
    /// A limit alarm.
    Alarm,
    /// An object that emits plain events.
    EventSource,
}

/// Validated handle to a variable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableHandle(usize);

/// Validated handle to a condition, alarm, or event-source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    index: usize,
    kind: NodeKind,
}

impl ObjectHandle {
    /// Kind of the node the handle refers to.
    pub const fn kind(self) -> NodeKind {
        self.kind
    }
}

/// A non-variable node.
#[derive(Debug)]
pub struct ObjectNode {
    node_id: NodeId,
    display_name: String,
    kind: NodeKind,
    enabled: AtomicBool,
}

impl ObjectNode {
    /// Stable identifier.
    pub const fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Node kind.
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Whether the node is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

/// Registry slot for an identifier.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Variable(usize),
    Object(usize),
}

/// Incrementally assembles an [`AddressSpace`].
#[derive(Debug, Default)]
pub struct AddressSpaceBuilder {
    variables: Vec<Variable>,
    objects: Vec<ObjectNode>,
    index: BTreeMap<NodeId, Slot>,
}

impl AddressSpaceBuilder {
    /// Start an empty address space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stored variable with its initial value.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateNode`] or
    /// [`ModelError::InvalidDefinition`].
    pub fn add_variable(
        &mut self,
        definition: VariableDefinition,
        initial: Value,
    ) -> Result<&mut Self, ModelError> {
        self.ensure_unique(&definition.node_id)?;
        let variable = Variable::stored(definition, initial)?;
        self.push_variable(variable);
        Ok(self)
    }

    /// Register a variable whose value is read through `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateNode`] or
    /// [`ModelError::InvalidDefinition`].
    pub fn add_computed_variable(
        &mut self,
        definition: VariableDefinition,
        source: Arc<dyn ValueSource>,
    ) -> Result<&mut Self, ModelError> {
        self.ensure_unique(&definition.node_id)?;
        let variable = Variable::computed(definition, source)?;
        self.push_variable(variable);
        Ok(self)
    }

    /// Register a condition, alarm, or event-source node.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateNode`], or
    /// [`ModelError::InvalidDefinition`] if `kind` is
    /// [`NodeKind::Variable`].
    pub fn add_object(
        &mut self,
        node_id: impl Into<NodeId>,
        display_name: &str,
        kind: NodeKind,
    ) -> Result<&mut Self, ModelError> {
        let node_id = node_id.into();
        if kind == NodeKind::Variable {
            return Err(ModelError::InvalidDefinition {
                node: node_id,
                reason: "variables must be added with add_variable".to_owned(),
            });
        }
        self.ensure_unique(&node_id)?;
        let idx = self.objects.len();
        self.index.insert(node_id.clone(), Slot::Object(idx));
        self.objects.push(ObjectNode {
            node_id,
            display_name: display_name.to_owned(),
            kind,
            enabled: AtomicBool::new(true),
        });
        Ok(self)
    }

    /// Finish with no historian and a gate that allows every write to a
    /// read-write variable.
    pub fn build(self) -> AddressSpace {
        self.build_with(Arc::new(NullHistorian), Arc::new(AllowAll))
    }

    /// Finish with the given historian and permission gate.
    pub fn build_with(
        self,
        historian: Arc<dyn Historian>,
        gate: Arc<dyn PermissionGate>,
    ) -> AddressSpace {
        info!(
            variables = self.variables.len(),
            objects = self.objects.len(),
            "Address space built"
        );
        AddressSpace {
            variables: self.variables,
            objects: self.objects,
            index: self.index,
            historian,
            gate,
        }
    }

    fn ensure_unique(&self, node_id: &NodeId) -> Result<(), ModelError> {
        if self.index.contains_key(node_id) {
            return Err(ModelError::DuplicateNode(node_id.clone()));
        }
        Ok(())
    }

    fn push_variable(&mut self, variable: Variable) {
        let idx = self.variables.len();
        self.index
            .insert(variable.definition().node_id.clone(), Slot::Variable(idx));
        self.variables.push(variable);
    }
}

/// The live information model shared by simulators and external clients.
pub struct AddressSpace {
    variables: Vec<Variable>,
    objects: Vec<ObjectNode>,
    index: BTreeMap<NodeId, Slot>,
    historian: Arc<dyn Historian>,
    gate: Arc<dyn PermissionGate>,
}

impl core::fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AddressSpace")
            .field("variables", &self.variables.len())
            .field("objects", &self.objects.len())
            .finish_non_exhaustive()
    }
}

impl AddressSpace {
    // -------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------

    /// Resolve a variable identifier into a handle.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] or [`ModelError::WrongNodeKind`].
    pub fn resolve_variable(&self, node_id: &NodeId) -> Result<VariableHandle, ModelError> {
        match self.index.get(node_id) {
            Some(Slot::Variable(idx)) => Ok(VariableHandle(*idx)),
            Some(Slot::Object(idx)) => Err(ModelError::WrongNodeKind {
                node: node_id.clone(),
                expected: NodeKind::Variable,
                actual: self
                    .objects
                    .get(*idx)
                    .map_or(NodeKind::EventSource, ObjectNode::kind),
            }),
            None => Err(ModelError::UnknownNode(node_id.clone())),
        }
    }

    /// Resolve a condition, alarm, or event-source identifier, checking that
    /// the node has the `expected` kind.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] or [`ModelError::WrongNodeKind`].
    pub fn resolve_object(
        &self,
        node_id: &NodeId,
        expected: NodeKind,
    ) -> Result<ObjectHandle, ModelError> {
        match self.index.get(node_id) {
            Some(Slot::Object(idx)) => {
                let actual = self
                    .objects
                    .get(*idx)
                    .map(ObjectNode::kind)
                    .ok_or(ModelError::StaleHandle(*idx))?;
                if actual != expected {
                    return Err(ModelError::WrongNodeKind {
                        node: node_id.clone(),
                        expected,
                        actual,
                    });
                }
                Ok(ObjectHandle {
                    index: *idx,
                    kind: actual,
                })
            }
            Some(Slot::Variable(_)) => Err(ModelError::WrongNodeKind {
                node: node_id.clone(),
                expected,
                actual: NodeKind::Variable,
            }),
            None => Err(ModelError::UnknownNode(node_id.clone())),
        }
    }

    // -------------------------------------------------------------------
    // Handle access
    // -------------------------------------------------------------------

    /// The variable behind `handle`, if it is still enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NodeDisabled`] or [`ModelError::StaleHandle`].
    pub fn variable(&self, handle: VariableHandle) -> Result<&Variable, ModelError> {
        let variable = self
            .variables
            .get(handle.0)
            .ok_or(ModelError::StaleHandle(handle.0))?;
        if !variable.is_enabled() {
            return Err(ModelError::NodeDisabled(variable.definition().node_id.clone()));
        }
        Ok(variable)
    }

    /// The object behind `handle`, if it is still enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NodeDisabled`] or [`ModelError::StaleHandle`].
    pub fn object(&self, handle: ObjectHandle) -> Result<&ObjectNode, ModelError> {
        let object = self
            .objects
            .get(handle.index)
            .ok_or(ModelError::StaleHandle(handle.index))?;
        if !object.is_enabled() {
            return Err(ModelError::NodeDisabled(object.node_id.clone()));
        }
        Ok(object)
    }

    /// Read the current value of a variable.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NodeDisabled`] or [`ModelError::StaleHandle`].
    pub fn read(&self, handle: VariableHandle) -> Result<Value, ModelError> {
        self.variable(handle).map(Variable::read)
    }

    /// Simulator write path: validate type and range, store, and record
    /// the stored value at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns a [`WriteError`]; the stored value is unchanged on error.
    pub fn write(
        &self,
        handle: VariableHandle,
        value: Value,
        timestamp: DateTime<Utc>,
    ) -> Result<(), WriteError> {
        let variable = self.variable(handle)?;
        self.store(variable, value, timestamp)
    }

    /// External write path: consult the permission gate, then behave as
    /// [`write`](Self::write).
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::AccessDenied`] if the gate refuses, otherwise
    /// any error from the simulator path.
    pub fn write_as(
        &self,
        credentials: Option<&Credentials>,
        handle: VariableHandle,
        value: Value,
        timestamp: DateTime<Utc>,
    ) -> Result<(), WriteError> {
        let variable = self.variable(handle)?;
        let definition = variable.definition();
        if variable.is_computed() {
            return Err(WriteError::NotWritable(definition.node_id.clone()));
        }
        if let AccessDecision::Denied(reason) = self.gate.check_write(credentials, definition) {
            let user = credentials.map_or_else(|| "anonymous".to_owned(), |c| c.user.clone());
            debug!(node = %definition.node_id, user, %reason, "External write denied");
            return Err(WriteError::AccessDenied {
                node: definition.node_id.clone(),
                user,
                reason: reason.to_string(),
            });
        }
        self.store(variable, value, timestamp)
    }

    /// Record the current value of a computed variable at `timestamp`
    /// after its owner changed it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NodeDisabled`] or [`ModelError::StaleHandle`].
    pub fn notify_changed(
        &self,
        handle: VariableHandle,
        timestamp: DateTime<Utc>,
    ) -> Result<(), ModelError> {
        let variable = self.variable(handle)?;
        self.record(variable.definition(), timestamp, &variable.read());
        Ok(())
    }

    fn store(
        &self,
        variable: &Variable,
        value: Value,
        timestamp: DateTime<Utc>,
    ) -> Result<(), WriteError> {
        variable.write_with(value, |stored| {
            self.record(variable.definition(), timestamp, stored);
        })
    }

    fn record(&self, definition: &VariableDefinition, timestamp: DateTime<Utc>, value: &Value) {
        if definition.historized {
            self.historian.record(&definition.node_id, timestamp, value);
        }
    }

    // -------------------------------------------------------------------
    // Runtime enable / disable
    // -------------------------------------------------------------------

    /// Enable or disable a node. Handles to a disabled node fail with
    /// [`ModelError::NodeDisabled`] until it is enabled again.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`].
    pub fn set_enabled(&self, node_id: &NodeId, enabled: bool) -> Result<(), ModelError> {
        match self.index.get(node_id) {
            Some(Slot::Variable(idx)) => {
                if let Some(variable) = self.variables.get(*idx) {
                    variable.set_enabled(enabled);
                }
            }
            Some(Slot::Object(idx)) => {
                if let Some(object) = self.objects.get(*idx) {
                    object.enabled.store(enabled, Ordering::Release);
                }
            }
            None => return Err(ModelError::UnknownNode(node_id.clone())),
        }
        info!(node = %node_id, enabled, "Node enable state changed");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Browsing
    // -------------------------------------------------------------------

    /// Iterate over every variable with its handle, disabled ones included.
    pub fn variables(&self) -> impl Iterator<Item = (VariableHandle, &Variable)> {
        self.variables
            .iter()
            .enumerate()
            .map(|(idx, var)| (VariableHandle(idx), var))
    }

    /// Iterate over every non-variable node.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectNode> {
        self.objects.iter()
    }

    /// Total number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroUsize;

    use plantsim_types::{DataType, Role, ValueRange};

    use super::*;
    use crate::access::{RoleGate, UserTable};
    use crate::historian::RingHistorian;
    use crate::variable::SharedValue;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    struct Fixture {
        space: AddressSpace,
        historian: Arc<RingHistorian>,
        ramp: SharedValue,
    }

    fn fixture() -> Fixture {
        let historian = Arc::new(RingHistorian::new(NonZeroUsize::new(8).unwrap()));
        let mut users = UserTable::new();
        users.insert("op", "pw", [Role::Operator]);
        let gate = Arc::new(RoleGate::new(Arc::new(users)));
        let ramp = SharedValue::new(Value::Double(0.0));

        let mut builder = AddressSpaceBuilder::new();
        builder
            .add_variable(
                VariableDefinition::new("T.Percent", "Percent", DataType::Double)
                    .with_range(ValueRange::new(0.0, 100.0).unwrap())
                    .writable_by(&[Role::Operator])
                    .historized(),
                Value::Double(50.0),
            )
            .unwrap()
            .add_variable(
                VariableDefinition::new("T.Counter", "Counter", DataType::UInt32),
                Value::UInt32(1),
            )
            .unwrap()
            .add_computed_variable(
                VariableDefinition::new("T.Ramp", "Ramp", DataType::Double).historized(),
                Arc::new(ramp.clone()),
            )
            .unwrap()
            .add_object("T.Condition", "Condition", NodeKind::Condition)
            .unwrap();

        let space = builder.build_with(historian.clone(), gate);
        Fixture {
            space,
            historian,
            ramp,
        }
    }

    #[test]
    fn resolves_known_nodes() {
        let f = fixture();
        assert!(f.space.resolve_variable(&NodeId::new("T.Percent")).is_ok());
        assert!(
            f.space
                .resolve_object(&NodeId::new("T.Condition"), NodeKind::Condition)
                .is_ok()
        );
        assert_eq!(f.space.node_count(), 4);
    }

    #[test]
    fn unknown_and_wrong_kind_fail_resolution() {
        let f = fixture();
        assert!(matches!(
            f.space.resolve_variable(&NodeId::new("T.Missing")),
            Err(ModelError::UnknownNode(_))
        ));
        assert!(matches!(
            f.space.resolve_variable(&NodeId::new("T.Condition")),
            Err(ModelError::WrongNodeKind {
                actual: NodeKind::Condition,
                ..
            })
        ));
        assert!(matches!(
            f.space
                .resolve_object(&NodeId::new("T.Condition"), NodeKind::Alarm),
            Err(ModelError::WrongNodeKind { .. })
        ));
    }

    #[test]
    fn duplicate_node_is_rejected() {
        let mut builder = AddressSpaceBuilder::new();
        let def = VariableDefinition::new("Dup", "Dup", DataType::Boolean);
        assert!(builder.add_variable(def.clone(), Value::Boolean(false)).is_ok());
        assert!(matches!(
            builder.add_variable(def, Value::Boolean(false)),
            Err(ModelError::DuplicateNode(_))
        ));
    }

    #[test]
    fn out_of_range_write_changes_nothing() {
        let f = fixture();
        let h = f.space.resolve_variable(&NodeId::new("T.Percent")).unwrap();
        let before = f.space.read(h).unwrap();

        let result = f.space.write(h, Value::Double(120.0), now());
        assert!(matches!(result, Err(WriteError::OutOfRange { .. })));
        assert_eq!(f.space.read(h).unwrap(), before);
        assert!(f.historian.history(&NodeId::new("T.Percent")).is_empty());
    }

    #[test]
    fn successful_write_is_historized() {
        let f = fixture();
        let h = f.space.resolve_variable(&NodeId::new("T.Percent")).unwrap();
        f.space.write(h, Value::Double(75.0), now()).unwrap();
        let history = f.historian.history(&NodeId::new("T.Percent"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.first().map(|r| r.value.clone()), Some(Value::Double(75.0)));
    }

    #[test]
    fn historian_receives_each_stored_value_at_the_given_time() {
        let f = fixture();
        let percent = f.space.resolve_variable(&NodeId::new("T.Percent")).unwrap();
        let ramp = f.space.resolve_variable(&NodeId::new("T.Ramp")).unwrap();
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let t1 = t0.checked_add_signed(chrono::TimeDelta::seconds(1)).unwrap();

        f.space.write(percent, Value::Double(5.0), t0).unwrap();
        f.space.write(percent, Value::Double(10.0), t1).unwrap();
        f.ramp.set(Value::Double(2.5));
        f.space.notify_changed(ramp, t1).unwrap();

        let history: Vec<(DateTime<Utc>, Value)> = f
            .historian
            .history(&NodeId::new("T.Percent"))
            .into_iter()
            .map(|r| (r.timestamp, r.value))
            .collect();
        assert_eq!(
            history,
            vec![(t0, Value::Double(5.0)), (t1, Value::Double(10.0))]
        );
        let ramp_history = f.historian.history(&NodeId::new("T.Ramp"));
        assert_eq!(ramp_history.len(), 1);
        assert_eq!(ramp_history.first().map(|r| r.timestamp), Some(t1));
        assert_eq!(ramp_history.first().map(|r| r.value.clone()), Some(Value::Double(2.5)));
    }

    #[test]
    fn concurrent_writers_each_historize_their_own_value() {
        let historian = Arc::new(RingHistorian::new(NonZeroUsize::new(1024).unwrap()));
        let mut builder = AddressSpaceBuilder::new();
        builder
            .add_variable(
                VariableDefinition::new("T.Percent", "Percent", DataType::Double)
                    .writable_by(&[])
                    .historized(),
                Value::Double(0.0),
            )
            .unwrap();
        let space = builder.build_with(historian.clone(), Arc::new(AllowAll));
        let h = space.resolve_variable(&NodeId::new("T.Percent")).unwrap();
        let creds = Credentials::new("op", "pw");

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..200_u32 {
                    space.write(h, Value::Double(f64::from(i)), now()).unwrap();
                }
            });
            scope.spawn(|| {
                for i in 0..200_u32 {
                    let value = Value::Double(1000.0 + f64::from(i));
                    space.write_as(Some(&creds), h, value, now()).unwrap();
                }
            });
        });

        let recorded: Vec<f64> = historian
            .history(&NodeId::new("T.Percent"))
            .into_iter()
            .filter_map(|r| r.value.as_f64())
            .collect();
        let mut sorted = recorded.clone();
        sorted.sort_by(f64::total_cmp);
        let expected: Vec<f64> = (0..200_u32)
            .map(f64::from)
            .chain((0..200_u32).map(|i| 1000.0 + f64::from(i)))
            .collect();
        assert_eq!(sorted, expected);
        assert_eq!(recorded.last().copied(), space.read(h).unwrap().as_f64());
    }

    #[test]
    fn external_write_consults_gate() {
        let f = fixture();
        let h = f.space.resolve_variable(&NodeId::new("T.Percent")).unwrap();

        let denied = f.space.write_as(None, h, Value::Double(10.0), now());
        assert!(matches!(denied, Err(WriteError::AccessDenied { .. })));
        assert_eq!(f.space.read(h).unwrap(), Value::Double(50.0));

        let creds = Credentials::new("op", "pw");
        assert!(f.space.write_as(Some(&creds), h, Value::Double(10.0), now()).is_ok());
        assert_eq!(f.space.read(h).unwrap(), Value::Double(10.0));

        let out = f.space.write_as(Some(&creds), h, Value::Double(-1.0), now());
        assert!(matches!(out, Err(WriteError::OutOfRange { .. })));
    }

    #[test]
    fn simulator_write_bypasses_gate() {
        let f = fixture();
        let h = f.space.resolve_variable(&NodeId::new("T.Counter")).unwrap();
        assert!(f.space.write(h, Value::UInt32(7), now()).is_ok());
        let ext = f.space.write_as(None, h, Value::UInt32(8), now());
        assert!(matches!(ext, Err(WriteError::AccessDenied { .. })));
        assert_eq!(f.space.read(h).unwrap(), Value::UInt32(7));
    }

    #[test]
    fn computed_variable_is_read_only_externally() {
        let f = fixture();
        let h = f.space.resolve_variable(&NodeId::new("T.Ramp")).unwrap();
        let creds = Credentials::new("op", "pw");
        assert!(matches!(
            f.space.write_as(Some(&creds), h, Value::Double(1.0), now()),
            Err(WriteError::NotWritable(_))
        ));

        f.ramp.set(Value::Double(3.5));
        assert_eq!(f.space.read(h).unwrap(), Value::Double(3.5));
        f.space.notify_changed(h, now()).unwrap();
        assert_eq!(f.historian.history(&NodeId::new("T.Ramp")).len(), 1);
    }

    #[test]
    fn disabled_node_fails_through_handle() {
        let f = fixture();
        let id = NodeId::new("T.Counter");
        let h = f.space.resolve_variable(&id).unwrap();
        f.space.set_enabled(&id, false).unwrap();
        assert!(matches!(f.space.read(h), Err(ModelError::NodeDisabled(_))));
        assert!(matches!(
            f.space.write(h, Value::UInt32(2), now()),
            Err(WriteError::Model(ModelError::NodeDisabled(_)))
        ));
        f.space.set_enabled(&id, true).unwrap();
        assert_eq!(f.space.read(h).unwrap(), Value::UInt32(1));
    }

    #[test]
    fn object_kind_cannot_be_variable() {
        let mut builder = AddressSpaceBuilder::new();
        assert!(matches!(
            builder.add_object("X", "X", NodeKind::Variable),
            Err(ModelError::InvalidDefinition { .. })
        ));
    }
}
