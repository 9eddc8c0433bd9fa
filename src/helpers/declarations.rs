//! Bookkeeping shared by variables and functions.
//!
//! A declaration block (VarInit, Function) owns a name and a signature. Every
//! usage block (Variable, FunctionInvoke) with that name is bound to it and
//! kept in sync, and one companion usage lives in the Drawer so the learner
//! can drag out new references.

use crate::error::GraphError;
use crate::graph::{BlockData, BlockId, BlockType};
use crate::workspace::{Workspace, WorkspaceEvent};
use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::marker::PhantomData;

/// Ties a declaration block type to its usage block type.
pub trait DeclarationKind {
    type Signature: Clone + PartialEq + Debug;

    const DECLARATION: BlockType;
    const USAGE: BlockType;
    /// Used in log lines.
    const LABEL: &'static str;

    /// Name and signature carried by a declaration payload.
    fn declared(data: &BlockData) -> Option<(String, Self::Signature)>;

    fn rename_declaration(data: &mut BlockData, name: &str);

    /// Name and bound declaration of a usage payload.
    fn usage(data: &BlockData) -> Option<(String, Option<BlockId>)>;

    /// Payload for the Drawer companion of a declaration.
    fn companion(name: &str, signature: &Self::Signature, declaration: BlockId) -> BlockData;

    /// Rewrites a usage payload to match its declaration.
    fn sync_usage(data: &mut BlockData, name: &str, signature: &Self::Signature, declaration: BlockId);
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDeclaration<S> {
    pub name: String,
    pub signature: S,
    pub companion: Option<BlockId>,
    pub usages: BTreeSet<BlockId>,
}

/// Tracks declarations of one kind and binds their usages.
#[derive(Debug)]
pub struct DeclarationTracker<K: DeclarationKind> {
    declarations: BTreeMap<BlockId, TrackedDeclaration<K::Signature>>,
    pending: Vec<BlockId>,
    usage_index: AHashMap<BlockId, BlockId>,
    _kind: PhantomData<K>,
}

impl<K: DeclarationKind> Default for DeclarationTracker<K> {
    fn default() -> Self {
        Self {
            declarations: BTreeMap::new(),
            pending: Vec::new(),
            usage_index: AHashMap::new(),
            _kind: PhantomData,
        }
    }
}

impl<K: DeclarationKind> DeclarationTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.declarations.clear();
        self.pending.clear();
        self.usage_index.clear();
    }

    pub fn get(&self, declaration: BlockId) -> Option<&TrackedDeclaration<K::Signature>> {
        self.declarations.get(&declaration)
    }

    pub fn declarations(&self) -> impl Iterator<Item = (BlockId, &TrackedDeclaration<K::Signature>)> {
        self.declarations.iter().map(|(id, d)| (*id, d))
    }

    /// Declared names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.declarations.values().map(|d| d.name.clone()).collect();
        names.sort();
        names
    }

    pub fn find_by_name(&self, name: &str) -> Option<BlockId> {
        self.declarations
            .iter()
            .find(|(_, d)| d.name == name)
            .map(|(id, _)| *id)
    }

    /// The declaration a usage is bound to.
    pub fn declaration_of(&self, usage: BlockId) -> Option<BlockId> {
        self.usage_index.get(&usage).copied().or_else(|| {
            self.declarations
                .iter()
                .find(|(_, d)| d.companion == Some(usage))
                .map(|(id, _)| *id)
        })
    }

    /// Usages still waiting for their declaration.
    pub fn pending(&self) -> &[BlockId] {
        &self.pending
    }

    pub fn handle(&mut self, workspace: &mut Workspace, event: &WorkspaceEvent) -> Result<(), GraphError> {
        match event {
            WorkspaceEvent::WorkspaceAdded { subtree, .. } => self.on_added(workspace, subtree),
            WorkspaceEvent::WorkspaceRemoved { subtree, .. } => self.on_removed(workspace, subtree),
            WorkspaceEvent::DataChanged { block, .. } => self.on_data_changed(workspace, *block),
            WorkspaceEvent::RegisteredClone { original, clone } => self.on_cloned(workspace, *original, *clone),
        }
    }

    fn on_added(&mut self, workspace: &mut Workspace, subtree: &[BlockId]) -> Result<(), GraphError> {
        // Declarations first so usages in the same subtree resolve at once.
        for block in subtree {
            if !workspace.contains(*block)
                || self.declarations.contains_key(block)
                || !workspace.is_on_canvas(*block)?
            {
                continue;
            }
            if workspace.block(*block)?.block_type() == K::DECLARATION {
                self.track(workspace, *block)?;
            }
        }
        for block in subtree {
            if !workspace.contains(*block)
                || self.declaration_of(*block).is_some()
                || !workspace.is_on_canvas(*block)?
            {
                continue;
            }
            if workspace.block(*block)?.block_type() == K::USAGE {
                self.bind_usage(workspace, *block)?;
            }
        }
        Ok(())
    }

    fn track(&mut self, workspace: &mut Workspace, declaration: BlockId) -> Result<(), GraphError> {
        let Some((name, signature)) = K::declared(&workspace.data(declaration)?) else {
            return Ok(());
        };
        let unique = self.unique_name(&name, declaration);
        if unique != name {
            tracing::debug!("{} '{}' is taken; renaming {} to '{}'", K::LABEL, name, declaration, unique);
            workspace.update_data(declaration, |data| K::rename_declaration(data, &unique))?;
        }

        let companion = workspace.create_block(K::companion(&unique, &signature, declaration))?;
        workspace.add_to_drawer(companion, None)?;

        self.declarations.insert(
            declaration,
            TrackedDeclaration {
                name: unique.clone(),
                signature,
                companion: Some(companion),
                usages: BTreeSet::new(),
            },
        );
        tracing::info!("tracking {} '{}' declared by {}", K::LABEL, unique, declaration);
        self.resolve_pending(workspace)
    }

    fn untrack(&mut self, workspace: &mut Workspace, declaration: BlockId) -> Result<(), GraphError> {
        let Some(tracked) = self.declarations.remove(&declaration) else {
            return Ok(());
        };
        if let Some(companion) = tracked.companion {
            if workspace.contains(companion) {
                if workspace.block(companion)?.is_in_drawer() {
                    workspace.remove_subtree(companion)?;
                } else {
                    // Statements chained after it on the canvas stay.
                    workspace.excise(companion)?;
                }
            }
        }
        for usage in &tracked.usages {
            self.usage_index.remove(usage);
            workspace.events.schedule_removal(*usage);
        }
        tracing::info!(
            "{} '{}' removed; {} usage(s) scheduled for removal",
            K::LABEL,
            tracked.name,
            tracked.usages.len()
        );
        Ok(())
    }

    fn on_removed(&mut self, workspace: &mut Workspace, subtree: &[BlockId]) -> Result<(), GraphError> {
        for block in subtree {
            if self.declarations.contains_key(block) {
                self.untrack(workspace, *block)?;
            } else if let Some(declaration) = self.usage_index.remove(block) {
                if let Some(tracked) = self.declarations.get_mut(&declaration) {
                    tracked.usages.remove(block);
                }
            } else {
                self.pending.retain(|p| p != block);
            }
        }
        Ok(())
    }

    fn on_data_changed(&mut self, workspace: &mut Workspace, block: BlockId) -> Result<(), GraphError> {
        if !workspace.contains(block) {
            return Ok(());
        }
        let Some(tracked) = self.declarations.get(&block) else {
            return Ok(());
        };
        let Some((name, signature)) = K::declared(&workspace.data(block)?) else {
            return Ok(());
        };
        if name == tracked.name && signature == tracked.signature {
            return Ok(());
        }

        if name != tracked.name && self.find_by_name(&name).is_some() {
            let previous = tracked.name.clone();
            tracing::debug!("{} name '{}' is taken; reverting {} to '{}'", K::LABEL, name, block, previous);
            workspace.update_data(block, |data| K::rename_declaration(data, &previous))?;
            return Ok(());
        }

        let mut targets: Vec<BlockId> = tracked.usages.iter().copied().collect();
        targets.extend(tracked.companion);
        if let Some(tracked) = self.declarations.get_mut(&block) {
            tracked.name = name.clone();
            tracked.signature = signature.clone();
        }
        for usage in targets {
            if workspace.contains(usage) {
                workspace.update_data(usage, |data| K::sync_usage(data, &name, &signature, block))?;
            }
        }
        self.resolve_pending(workspace)
    }

    fn on_cloned(&mut self, workspace: &mut Workspace, original: BlockId, clone: BlockId) -> Result<(), GraphError> {
        if !workspace.contains(clone) || workspace.block(clone)?.block_type() != K::USAGE {
            return Ok(());
        }
        match self.declaration_of(original) {
            Some(declaration) => self.bind(workspace, clone, declaration),
            None => self.bind_usage(workspace, clone),
        }
    }

    /// Binds a usage by its declaration reference or its name, or queues it.
    fn bind_usage(&mut self, workspace: &mut Workspace, usage: BlockId) -> Result<(), GraphError> {
        let Some((name, reference)) = K::usage(&workspace.data(usage)?) else {
            return Ok(());
        };
        let declaration = reference
            .filter(|d| self.declarations.contains_key(d))
            .or_else(|| self.find_by_name(&name));
        match declaration {
            Some(declaration) => self.bind(workspace, usage, declaration),
            None => {
                if !self.pending.contains(&usage) {
                    tracing::info!("{} '{}' used by {} is not declared yet", K::LABEL, name, usage);
                    self.pending.push(usage);
                }
                Ok(())
            }
        }
    }

    fn bind(&mut self, workspace: &mut Workspace, usage: BlockId, declaration: BlockId) -> Result<(), GraphError> {
        let Some(tracked) = self.declarations.get_mut(&declaration) else {
            return Ok(());
        };
        tracked.usages.insert(usage);
        let name = tracked.name.clone();
        let signature = tracked.signature.clone();
        self.usage_index.insert(usage, declaration);
        self.pending.retain(|p| *p != usage);
        workspace.update_data(usage, |data| K::sync_usage(data, &name, &signature, declaration))?;
        tracing::debug!("bound {} {} to '{}'", K::LABEL, usage, name);
        Ok(())
    }

    fn resolve_pending(&mut self, workspace: &mut Workspace) -> Result<(), GraphError> {
        let waiting = std::mem::take(&mut self.pending);
        for usage in waiting {
            if workspace.contains(usage) {
                self.bind_usage(workspace, usage)?;
            }
        }
        Ok(())
    }

    /// `name`, or the next free numbered variant of it.
    fn unique_name(&self, name: &str, declaration: BlockId) -> String {
        let taken = |candidate: &str| {
            self.declarations
                .iter()
                .any(|(id, d)| *id != declaration && d.name == candidate)
        };
        let mut candidate = name.to_string();
        while taken(&candidate) {
            candidate = bump_suffix(&candidate);
        }
        candidate
    }
}

/// `x` becomes `x1`, `x1` becomes `x2`.
pub fn bump_suffix(name: &str) -> String {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[stem.len()..];
    match digits.parse::<u64>() {
        Ok(n) => match n.checked_add(1) {
            Some(next) => format!("{}{}", stem, next),
            None => format!("{}1", name),
        },
        Err(_) => format!("{}1", name),
    }
}
