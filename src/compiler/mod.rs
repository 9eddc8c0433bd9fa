use crate::error::CompileError;
use crate::graph::{BlockData, BlockId};
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};

pub mod base;
pub mod javascript;
pub mod reason;
pub mod templates;

use base::{BaseCompiler, TargetSyntax};
use javascript::JavaScript;
use reason::ReasonMl;
pub use templates::{ExpressionTemplate, TargetLanguage};

/// Callbacks every compiled program expects from its runner, in order.
pub const RUNTIME_CALLBACKS: [&str; 2] = ["__markExecuting", "__delay"];

/// Context threaded by value through the recursive compile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileProps {
    /// Continuation appended once, at the block whose `after` is empty.
    pub resolve_function: Option<String>,
}

/// A whole compiled program, ready for the execution runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    pub code: String,
    pub entrypoint: String,
    pub arg_names: Vec<String>,
}

pub struct Compiler {
    target: TargetLanguage,
    indent: String,
    entrypoint: Option<String>,
}

pub struct CompilerBuilder {
    target: TargetLanguage,
    indent: usize,
    entrypoint: Option<String>,
}

impl CompilerBuilder {
    pub fn new(target: TargetLanguage) -> Self {
        Self {
            target,
            indent: 2,
            entrypoint: None,
        }
    }

    /// Spaces per nesting level.
    pub fn with_indent(mut self, spaces: usize) -> Self {
        self.indent = spaces;
        self
    }

    /// Uses `name` as the entry point instead of `main` or the first function.
    pub fn with_entrypoint(mut self, name: &str) -> Self {
        self.entrypoint = Some(name.to_string());
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            target: self.target,
            indent: " ".repeat(self.indent),
            entrypoint: self.entrypoint,
        }
    }
}

impl Compiler {
    pub fn builder(target: TargetLanguage) -> CompilerBuilder {
        CompilerBuilder::new(target)
    }

    pub fn new(target: TargetLanguage) -> Self {
        CompilerBuilder::new(target).build()
    }

    pub fn target(&self) -> TargetLanguage {
        self.target
    }

    /// Compiles one block and everything downstream of it.
    pub fn compile_block(
        &self,
        workspace: &Workspace,
        block: BlockId,
        props: CompileProps,
    ) -> Result<String, CompileError> {
        match self.target {
            TargetLanguage::JavaScript => {
                let target = JavaScript::new(&self.indent);
                BaseCompiler::new(workspace, &target).compile(block, props)
            }
            TargetLanguage::ReasonML => {
                let target = ReasonMl::new(&self.indent);
                BaseCompiler::new(workspace, &target).compile(block, props)
            }
        }
    }

    /// Compiles every function on the canvas into one program.
    pub fn compile_root(&self, workspace: &Workspace) -> Result<CompilationResult, CompileError> {
        match self.target {
            TargetLanguage::JavaScript => self.compile_program(workspace, &JavaScript::new(&self.indent)),
            TargetLanguage::ReasonML => self.compile_program(workspace, &ReasonMl::new(&self.indent)),
        }
    }

    fn compile_program<T: TargetSyntax>(
        &self,
        workspace: &Workspace,
        target: &T,
    ) -> Result<CompilationResult, CompileError> {
        let mut names = Vec::new();
        let mut functions = Vec::new();
        for block in workspace.children_of(workspace.root())? {
            match workspace.data(block)? {
                BlockData::Function { name, .. } => {
                    names.push(name);
                    functions.push(block);
                }
                other => {
                    tracing::debug!("skipping top-level {} block {}", other.block_type(), block);
                }
            }
        }

        let entrypoint = match &self.entrypoint {
            Some(name) if names.contains(name) => name.clone(),
            Some(name) => return Err(CompileError::UnknownEntrypoint(name.clone())),
            None => names
                .iter()
                .find(|n| n.as_str() == "main")
                .or_else(|| names.first())
                .cloned()
                .ok_or(CompileError::NoEntrypoint)?,
        };

        let mut compiler = BaseCompiler::new(workspace, target);
        let mut compiled = Vec::with_capacity(functions.len());
        for block in functions {
            compiled.push(compiler.compile(block, CompileProps::default())?);
        }
        tracing::info!(
            "compiled {} function(s) for {}, entry point '{}'",
            compiled.len(),
            target.language(),
            entrypoint
        );

        Ok(CompilationResult {
            code: target.program(compiled),
            entrypoint,
            arg_names: RUNTIME_CALLBACKS.iter().map(|s| s.to_string()).collect(),
        })
    }
}
