use crate::graph::{BlockData, BlockId};
use std::collections::VecDeque;

/// Public extension points for other UI layers.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceEvent {
    /// A block (and the subtree hanging off it) joined the live program.
    WorkspaceAdded { block: BlockId, subtree: Vec<BlockId> },
    /// A block (and its subtree) left the live program for the palette.
    WorkspaceRemoved { block: BlockId, subtree: Vec<BlockId> },
    /// `clone` was created as a copy of `original`.
    RegisteredClone { original: BlockId, clone: BlockId },
    /// The payload of `block` was replaced; `previous` is the old payload.
    DataChanged { block: BlockId, previous: BlockData },
}

impl WorkspaceEvent {
    pub fn block(&self) -> BlockId {
        match self {
            WorkspaceEvent::WorkspaceAdded { block, .. }
            | WorkspaceEvent::WorkspaceRemoved { block, .. }
            | WorkspaceEvent::DataChanged { block, .. } => *block,
            WorkspaceEvent::RegisteredClone { clone, .. } => *clone,
        }
    }
}

/// Work deferred to a later scheduling tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    Event(WorkspaceEvent),
    /// Disconnect and remove a block unless something else already did.
    RemoveBlock(BlockId),
}

/// The deferred-task queue standing in for the host's macrotask scheduler.
///
/// Emitting never runs listeners; the owner drains the queue one tick at a
/// time, so several synchronous graph mutations settle before any derived
/// state reacts.
#[derive(Debug, Default)]
pub struct EventQueue {
    queue: VecDeque<Deferred>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: WorkspaceEvent) {
        self.queue.push_back(Deferred::Event(event));
    }

    pub fn schedule_removal(&mut self, block: BlockId) {
        self.queue.push_back(Deferred::RemoveBlock(block));
    }

    /// Everything queued so far. Work scheduled while handling the returned
    /// batch lands in the next tick.
    pub fn take_tick(&mut self) -> Vec<Deferred> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
