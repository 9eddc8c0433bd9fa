use super::connector::ConnectorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An unordered pair of connectors describing one proposed or realized edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Connection {
    pub from: ConnectorId,
    pub to: ConnectorId,
}

impl Connection {
    pub fn new(from: ConnectorId, to: ConnectorId) -> Self {
        Self { from, to }
    }

    pub fn involves(&self, connector: ConnectorId) -> bool {
        self.from == connector || self.to == connector
    }

    /// The side opposite `connector`, if `connector` is part of this pair.
    pub fn other(&self, connector: ConnectorId) -> Option<ConnectorId> {
        if self.from == connector {
            Some(self.to)
        } else if self.to == connector {
            Some(self.from)
        } else {
            None
        }
    }

    /// Picks the side found in `owned`, the connectors of the block asking.
    pub fn local_side(&self, owned: &[ConnectorId]) -> Option<ConnectorId> {
        if owned.contains(&self.from) {
            Some(self.from)
        } else if owned.contains(&self.to) {
            Some(self.to)
        } else {
            None
        }
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        (self.from == other.from && self.to == other.to)
            || (self.from == other.to && self.to == other.from)
    }
}

impl Eq for Connection {}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.from, self.to)
    }
}
