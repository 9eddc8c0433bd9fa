//! One editor session: the workspace, its derived state and the event loop.

use crate::compiler::{CompilationResult, Compiler, TargetLanguage};
use crate::document::{IntoProgram, resolve_handle};
use crate::error::{CompileError, GraphError, LoadError};
use crate::graph::{BlockId, Connection, ConnectorType, ContainerKind};
use crate::helpers::{FunctionHelper, VariableHelper};
use crate::registry::Point;
use crate::workspace::{Deferred, Dropped, Workspace, WorkspaceConfig, WorkspaceEvent};
use ahash::AHashMap;

/// Upper bound on ticks in one `flush`, in case handlers keep scheduling work.
const MAX_FLUSH_TICKS: usize = 10_000;

type Listener = Box<dyn FnMut(&WorkspaceEvent)>;

pub struct Session {
    workspace: Workspace,
    variables: VariableHelper,
    functions: FunctionHelper,
    listeners: Vec<Listener>,
}

pub struct SessionBuilder {
    config: WorkspaceConfig,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: WorkspaceConfig::default(),
        }
    }

    pub fn with_snap_radius(mut self, radius: f64) -> Self {
        self.config.snap_radius = radius;
        self
    }

    pub fn with_displacement_offset(mut self, offset: Point) -> Self {
        self.config.displacement_offset = offset;
        self
    }

    pub fn build(self) -> Session {
        Session {
            workspace: Workspace::new(self.config),
            variables: VariableHelper::new(),
            functions: FunctionHelper::new(),
            listeners: Vec::new(),
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn new() -> Self {
        SessionBuilder::new().build()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    pub fn variables(&self) -> &VariableHelper {
        &self.variables
    }

    pub fn functions(&self) -> &FunctionHelper {
        &self.functions
    }

    /// Registers a listener called for every event after the helpers saw it.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&WorkspaceEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Runs one scheduling tick. Work queued while it runs waits for the next.
    /// Returns the number of tasks processed.
    pub fn tick(&mut self) -> Result<usize, GraphError> {
        let tasks = self.workspace.events.take_tick();
        let count = tasks.len();
        for task in tasks {
            match task {
                Deferred::Event(event) => {
                    self.variables.handle(&mut self.workspace, &event)?;
                    self.functions.handle(&mut self.workspace, &event)?;
                    for listener in &mut self.listeners {
                        listener(&event);
                    }
                }
                Deferred::RemoveBlock(block) => {
                    if !self.workspace.contains(block) {
                        tracing::debug!("block {} already removed", block);
                        continue;
                    }
                    self.workspace.excise(block)?;
                }
            }
        }
        Ok(count)
    }

    /// Ticks until nothing is queued. Returns the number of tasks processed.
    pub fn flush(&mut self) -> Result<usize, GraphError> {
        let mut total = 0;
        for _ in 0..MAX_FLUSH_TICKS {
            if self.workspace.events.is_empty() {
                return Ok(total);
            }
            total += self.tick()?;
        }
        tracing::warn!(
            "event queue still busy after {} ticks; {} task(s) left",
            MAX_FLUSH_TICKS,
            self.workspace.pending_tasks()
        );
        Ok(total)
    }

    /// Drops every block and all derived state.
    pub fn reset(&mut self) {
        self.workspace.reset();
        self.variables.clear();
        self.functions.clear();
    }

    /// Replaces the session's program with `program`.
    ///
    /// Returns the block created for each document id.
    pub fn load<P: IntoProgram>(&mut self, program: P) -> Result<AHashMap<String, BlockId>, LoadError> {
        let document = program.into_program()?;
        self.reset();

        let mut ids: AHashMap<String, BlockId> = AHashMap::new();
        for definition in &document.blocks {
            if ids.contains_key(&definition.id) {
                return Err(LoadError::DuplicateBlock(definition.id.clone()));
            }
            let block = self.workspace.create_block(definition.data.clone())?;
            if let Some(position) = definition.position {
                self.workspace.set_block_position(block, position);
            }
            ids.insert(definition.id.clone(), block);
        }

        for definition in &document.blocks {
            let Some(block) = ids.get(&definition.id).copied() else {
                continue;
            };
            match definition.container {
                Some(ContainerKind::Canvas) => self.workspace.add_to_canvas(block, definition.position)?,
                Some(ContainerKind::Drawer) => self.workspace.add_to_drawer(block, definition.position)?,
                None => {}
            }
        }

        for edge in &document.edges {
            let source = *ids.get(&edge.source).ok_or_else(|| LoadError::BlockNotFound {
                missing_block_id: edge.source.clone(),
                source_block_id: edge.source.clone(),
            })?;
            let target = *ids.get(&edge.target).ok_or_else(|| LoadError::BlockNotFound {
                missing_block_id: edge.target.clone(),
                source_block_id: edge.source.clone(),
            })?;
            let local = resolve_handle(&self.workspace, source, &edge.source, &edge.source_handle)?;
            let before = self
                .workspace
                .before_of(target)?
                .ok_or(GraphError::MissingConnector {
                    block: target,
                    connector_type: ConnectorType::Before,
                })?;
            self.workspace
                .connect(source, target, Connection::new(local, before), None)?;
        }

        self.flush()?;

        let unresolved = self.unresolved_usages();
        if !unresolved.is_empty() {
            tracing::warn!(
                "{} usage(s) still have no declaration after loading: {:?}",
                unresolved.len(),
                unresolved
            );
        }
        tracing::info!(
            "loaded {} block(s) and {} edge(s)",
            document.blocks.len(),
            document.edges.len()
        );
        Ok(ids)
    }

    /// Usages whose declaration has not appeared.
    pub fn unresolved_usages(&self) -> Vec<BlockId> {
        self.variables
            .pending()
            .iter()
            .chain(self.functions.pending())
            .copied()
            .filter(|b| self.workspace.contains(*b))
            .collect()
    }

    /// Deletes a block and everything downstream of it, as when the learner
    /// drops it on the trash.
    pub fn delete_block(&mut self, block: BlockId) -> Result<Vec<BlockId>, GraphError> {
        if !self.workspace.block(block)?.is_in_drawer() {
            if self.workspace.upstream(block)?.is_some() {
                self.workspace.disconnect_self(block)?;
            }
            self.workspace.add_to_drawer(block, None)?;
        }
        self.workspace.remove_subtree(block)
    }

    pub fn drop_block(&mut self, block: BlockId, offset: Point) -> Result<Dropped, GraphError> {
        self.workspace.drop_block(block, offset)
    }

    pub fn compile(&self, target: TargetLanguage) -> Result<CompilationResult, CompileError> {
        Compiler::new(target).compile_root(&self.workspace)
    }

    pub fn compile_with(&self, compiler: &Compiler) -> Result<CompilationResult, CompileError> {
        compiler.compile_root(&self.workspace)
    }
}
