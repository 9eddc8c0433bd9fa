//! Derived state kept in sync with the graph through workspace events.

pub mod declarations;
pub mod function;
pub mod variable;

pub use declarations::{DeclarationKind, DeclarationTracker, TrackedDeclaration};
pub use function::{FunctionHelper, FunctionKind, FunctionSignature};
pub use variable::{VariableHelper, VariableKind, VariableSignature};
