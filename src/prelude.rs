//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the tsunagi crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use tsunagi::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let mut session = Session::new();
//! let workspace = session.workspace_mut();
//!
//! let function = workspace.create_block(BlockData::Function {
//!     name: "main".to_string(),
//!     params: Vec::new(),
//!     return_type: DataType::Void,
//! })?;
//! workspace.add_to_canvas(function, Some(Point::new(0.0, 0.0)))?;
//! session.flush()?;
//!
//! let result = session.compile(TargetLanguage::ReasonML)?;
//! println!("{}", result.code);
//! # Ok(())
//! # }
//! ```

// Sessions and the graph
pub use crate::session::{Session, SessionBuilder};
pub use crate::workspace::{Dropped, Workspace, WorkspaceConfig, WorkspaceEvent};

// Block model
pub use crate::graph::{
    BlockData, BlockId, BlockType, ComparisonOp, Connection, ConnectorId, ConnectorRole, ConnectorType,
    ContainerKind, DataType, JunctionOp, MathOp, Parameter,
};
pub use crate::registry::Point;

// Compilation
pub use crate::compiler::{CompilationResult, CompileProps, Compiler, ExpressionTemplate, TargetLanguage};
pub use crate::document::{IntoProgram, ProgramDocument};

// Error types
pub use crate::error::{BackendError, CompileError, GraphError, LoadError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
