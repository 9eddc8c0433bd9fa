//! The serialized form of a program: blocks plus the edges between them.

use crate::error::LoadError;
use crate::graph::{BlockData, BlockId, ConnectorType, ContainerKind};
use crate::registry::Point;
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};

/// A program as saved by the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramDocument {
    pub blocks: Vec<BlockDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: String,
    pub data: BlockData,
    #[serde(default)]
    pub position: Option<Point>,
    /// Set for blocks that sit directly on the canvas or in the drawer.
    #[serde(default)]
    pub container: Option<ContainerKind>,
}

/// Attaches `target`'s Before to the `source_handle` socket of `source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDefinition {
    pub source: String,
    pub source_handle: String,
    pub target: String,
}

/// Conversion from other program formats.
pub trait IntoProgram {
    fn into_program(self) -> Result<ProgramDocument, LoadError>;
}

impl IntoProgram for ProgramDocument {
    fn into_program(self) -> Result<ProgramDocument, LoadError> {
        Ok(self)
    }
}

impl IntoProgram for &str {
    fn into_program(self) -> Result<ProgramDocument, LoadError> {
        ProgramDocument::from_json(self)
    }
}

impl ProgramDocument {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        serde_json::from_str(json).map_err(|e| LoadError::JsonParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        serde_json::to_string_pretty(self).map_err(|e| LoadError::JsonParseError(e.to_string()))
    }

    pub fn block(&self, id: &str) -> Option<&BlockDefinition> {
        self.blocks.iter().find(|b| b.id == id)
    }
}

/// Splits a handle such as `input-1` into its kind and index. A bare kind
/// means index 0.
pub fn parse_handle(handle: &str) -> Option<(ConnectorType, usize)> {
    let (kind, index) = match handle.split_once('-') {
        Some((kind, index)) => (kind, index.parse::<usize>().ok()?),
        None => (handle, 0),
    };
    let connector_type = match kind {
        "after" => ConnectorType::After,
        "inner" => ConnectorType::Inner,
        "input" => ConnectorType::Extension,
        _ => return None,
    };
    Some((connector_type, index))
}

/// The connector of `block` a handle names.
pub(crate) fn resolve_handle(
    workspace: &Workspace,
    block: BlockId,
    block_id: &str,
    handle: &str,
) -> Result<crate::graph::ConnectorId, LoadError> {
    let invalid = || LoadError::InvalidHandle {
        block_id: block_id.to_string(),
        handle: handle.to_string(),
    };
    let (connector_type, index) = parse_handle(handle).ok_or_else(invalid)?;
    workspace
        .connectors_of(block, connector_type)?
        .get(index)
        .copied()
        .ok_or_else(invalid)
}
