use crate::compiler::{ExpressionTemplate, TargetLanguage};
use crate::graph::{BlockId, BlockType, Connection, ConnectorId, ConnectorType};
use std::time::Duration;
use thiserror::Error;

/// Violations of the block-graph invariants.
///
/// These signal a programming error in the caller, never ordinary user input,
/// and are not retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Block {0} is not registered")]
    UnknownBlock(BlockId),

    #[error("Connector {0} is not registered")]
    UnknownConnector(ConnectorId),

    #[error("Connector {connector} already belongs to block {owner}")]
    OwnerAlreadyAssigned {
        connector: ConnectorId,
        owner: BlockId,
    },

    #[error("Connection {connection} does not involve block {block} or its chain")]
    UnrelatedConnection {
        block: BlockId,
        connection: Connection,
    },

    #[error("Connector {connector} on block {block} is already occupied")]
    ConnectorOccupied {
        block: BlockId,
        connector: ConnectorId,
    },

    #[error("Block {block} has no {connector_type:?} connector")]
    MissingConnector {
        block: BlockId,
        connector_type: ConnectorType,
    },

    #[error("Block {0} is not attached to anything")]
    NotAttached(BlockId),

    #[error("Block {0} is already attached upstream; disconnect it first")]
    AlreadyAttached(BlockId),

    #[error("Attaching block {block} below {target} would create a cycle")]
    WouldCreateCycle { block: BlockId, target: BlockId },

    #[error("Block {0} still has live connections; disconnect or remove its children first")]
    RemoveWithLiveEdges(BlockId),

    #[error("Block {block} cannot change type from {from} to {to}")]
    TypeChange {
        block: BlockId,
        from: BlockType,
        to: BlockType,
    },

    #[error("Invalid data for block {block}: {message}")]
    InvalidData { block: BlockId, message: String },

    #[error("Invalid {block_type} payload: {message}")]
    InvalidPayload {
        block_type: BlockType,
        message: String,
    },
}

/// Errors that can occur while generating source code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Block {block} of type {block_type} cannot be compiled")]
    UnsupportedBlock {
        block: BlockId,
        block_type: BlockType,
    },

    #[error("Template {template:?} has no {target} form")]
    MissingTemplate {
        template: ExpressionTemplate,
        target: TargetLanguage,
    },

    #[error("Editable expression {block} has no {target} source")]
    MissingSource {
        block: BlockId,
        target: TargetLanguage,
    },

    #[error("The program declares no function to use as an entry point")]
    NoEntrypoint,

    #[error("Entry point '{0}' is not declared")]
    UnknownEntrypoint(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors that can occur when loading a program document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Failed to parse program JSON: {0}")]
    JsonParseError(String),

    #[error("Block id '{0}' is defined more than once")]
    DuplicateBlock(String),

    #[error("Block '{missing_block_id}' not found, which is required by an edge from '{source_block_id}'")]
    BlockNotFound {
        missing_block_id: String,
        source_block_id: String,
    },

    #[error("Block '{block_id}' has no connector for handle '{handle}'")]
    InvalidHandle { block_id: String, handle: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Status reported by the transpilation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranspileStatus {
    SyntaxError,
    TypeError,
    Unavailable,
}

/// Errors reported by the collaborators that run compiled code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Transpilation failed ({status:?}): {message}")]
    Transpile {
        status: TranspileStatus,
        message: String,
    },

    #[error("Execution exceeded the {0:?} time limit")]
    Timeout(Duration),

    #[error("Execution failed: {0}")]
    Execution(String),
}
