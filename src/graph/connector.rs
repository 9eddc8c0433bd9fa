use super::block::{BlockId, BlockType};
use super::data::DataType;
use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a connector, assigned by the `ConnectorRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorId(pub u64);

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Where a connector sits relative to the flow of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectorType {
    /// The socket through which a block hangs off its upstream neighbour.
    Before,
    /// The next statement in a chain.
    After,
    /// The first statement of a nested body.
    Inner,
    /// A value input.
    Extension,
    /// A container slot on the Root or Drawer.
    Internal,
}

impl ConnectorType {
    /// Downstream connectors' occupants conceptually follow the owner.
    pub fn is_downstream(self) -> bool {
        !matches!(self, ConnectorType::Before)
    }
}

/// Disambiguates connectors of the same type on one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectorRole {
    Default,
    Input,
    Output,
    Conditional,
    IfTrue,
    IfFalse,
    LoopInner,
    FunctionBody,
    Return,
    Argument,
    Target,
}

/// A single compatibility rule. A connector accepts a remote only when every
/// predicate passes.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectorPredicate {
    /// The remote connector must have one of these types.
    ConnectorTypes(Vec<ConnectorType>),
    /// The remote connector must be owned by one of these block types.
    OwnerTypes(Vec<BlockType>),
    /// Carried value types must be compatible. Passes when either side
    /// carries none.
    MatchesValueType,
}

impl ConnectorPredicate {
    fn check(&self, local: &Connector, remote: &Connector) -> bool {
        match self {
            ConnectorPredicate::ConnectorTypes(types) => types.contains(&remote.connector_type),
            ConnectorPredicate::OwnerTypes(types) => remote
                .owner_type
                .map(|owner| types.contains(&owner))
                .unwrap_or(false),
            ConnectorPredicate::MatchesValueType => match (&local.value_type, &remote.value_type) {
                (Some(a), Some(b)) => a.is_compatible(b),
                _ => true,
            },
        }
    }
}

/// A typed attachment point on a block through which exactly one edge may pass.
#[derive(Debug, Clone)]
pub struct Connector {
    id: ConnectorId,
    pub connector_type: ConnectorType,
    pub role: ConnectorRole,
    pub predicates: Vec<ConnectorPredicate>,
    pub value_type: Option<DataType>,
    owner: Option<BlockId>,
    owner_type: Option<BlockType>,
}

impl Connector {
    pub fn new(connector_type: ConnectorType, role: ConnectorRole) -> Self {
        Self {
            id: ConnectorId(0),
            connector_type,
            role,
            predicates: Vec::new(),
            value_type: None,
            owner: None,
            owner_type: None,
        }
    }

    pub fn with_predicate(mut self, predicate: ConnectorPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_value_type(mut self, value_type: DataType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn id(&self) -> ConnectorId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ConnectorId) {
        self.id = id;
    }

    pub fn owner(&self) -> Option<BlockId> {
        self.owner
    }

    pub fn owner_type(&self) -> Option<BlockType> {
        self.owner_type
    }

    /// Binds the connector to its block. Owners are assigned exactly once.
    pub fn assign_owner(&mut self, owner: BlockId, owner_type: BlockType) -> Result<(), GraphError> {
        if let Some(existing) = self.owner {
            return Err(GraphError::OwnerAlreadyAssigned {
                connector: self.id,
                owner: existing,
            });
        }
        self.owner = Some(owner);
        self.owner_type = Some(owner_type);
        Ok(())
    }

    pub fn is_downstream(&self) -> bool {
        self.connector_type.is_downstream()
    }

    /// Whether this side accepts an edge to `remote`.
    ///
    /// Without predicates anything but a container slot is accepted.
    pub fn allows(&self, remote: &Connector) -> bool {
        if self.predicates.is_empty() {
            return remote.connector_type != ConnectorType::Internal;
        }
        self.predicates.iter().all(|p| p.check(self, remote))
    }

    /// Symmetric compatibility: both sides must agree.
    pub fn is_compatible(&self, remote: &Connector) -> bool {
        self.allows(remote) && remote.allows(self)
    }
}
