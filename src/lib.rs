//! # Tsunagi - Block Graph and Compiler Core
//!
//! **Tsunagi** is the engine behind a block-based visual programming editor. It keeps
//! the program as a graph of typed blocks joined through typed connectors, enforces
//! the editing protocol (attach, splice, displace, snap) and compiles the graph to
//! JavaScript or ReasonML source.
//!
//! ## Core Workflow
//!
//! 1.  **Load a Program**: Parse a saved `ProgramDocument` (or implement `IntoProgram`
//!     for your own format) and hand it to `Session::load`.
//! 2.  **Edit**: Drag, drop, clone and delete blocks through the `Session` and its
//!     `Workspace`. Variables and functions stay in sync with their declarations as
//!     the deferred event queue is drained.
//! 3.  **Compile**: Build a `Compiler` for a target language and compile the canvas.
//! 4.  **Run**: Hand the result to an `ExecutionBackend`, going through a
//!     `TranspileService` first for ReasonML.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tsunagi::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("program.json")?;
//!
//!     let mut session = Session::new();
//!     let ids = session.load(json.as_str())?;
//!     println!("Loaded {} blocks", ids.len());
//!
//!     let compiler = Compiler::builder(TargetLanguage::JavaScript)
//!         .with_indent(4)
//!         .build();
//!     let result = session.compile_with(&compiler)?;
//!
//!     println!("Entry point: {}", result.entrypoint);
//!     println!("{}", result.code);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod compiler;
pub mod document;
pub mod error;
pub mod graph;
pub mod helpers;
pub mod prelude;
pub mod registry;
pub mod session;
pub mod workspace;
