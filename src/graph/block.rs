use super::connected::ConnectedBlocks;
use super::connector::ConnectorId;
use super::data::{BlockData, ContainerKind};
use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, opaque identity of a block, assigned once by the `BlockRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// The closed set of block kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    Function,
    FunctionInvoke,
    Expression,
    Value,
    Variable,
    VarInit,
    VarSet,
    Loop,
    Conditional,
    LogicNot,
    LogicJunction,
    LogicComparison,
    MathOperation,
    Comment,
    Root,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A typed node in the program graph.
#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    data: BlockData,
    pub(crate) connectors: Vec<ConnectorId>,
    pub(crate) connected: ConnectedBlocks,
    pub draggable: bool,
    pub(crate) is_in_drawer: bool,
    pub(crate) removed: bool,
}

impl Block {
    pub(crate) fn new(id: BlockId, data: BlockData) -> Self {
        let draggable = !matches!(data, BlockData::Root { .. });
        Self {
            id,
            data,
            connectors: Vec::new(),
            connected: ConnectedBlocks::new(),
            draggable,
            is_in_drawer: false,
            removed: false,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn block_type(&self) -> BlockType {
        self.data.block_type()
    }

    /// A copy of the payload. Mutation goes through `Workspace::update_data`.
    pub fn data(&self) -> BlockData {
        self.data.clone()
    }

    /// Borrowed view used by the compiler and helpers inside the crate.
    pub(crate) fn data_ref(&self) -> &BlockData {
        &self.data
    }

    /// Swaps in a new payload after validating it. Returns the previous one.
    pub(crate) fn replace_data(&mut self, data: BlockData) -> Result<BlockData, GraphError> {
        if data.block_type() != self.block_type() {
            return Err(GraphError::TypeChange {
                block: self.id,
                from: self.block_type(),
                to: data.block_type(),
            });
        }
        data.validate().map_err(|message| GraphError::InvalidData {
            block: self.id,
            message,
        })?;
        Ok(std::mem::replace(&mut self.data, data))
    }

    pub fn connectors(&self) -> &[ConnectorId] {
        &self.connectors
    }

    pub fn connected(&self) -> &ConnectedBlocks {
        &self.connected
    }

    pub fn is_in_drawer(&self) -> bool {
        self.is_in_drawer
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self.data {
            BlockData::Root { container } => Some(container),
            _ => None,
        }
    }
}
