use crate::graph::BlockId;

/// Net container change inferred from a disconnect/connect pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Added,
    Removed,
}

/// Infers `workspaceAdded` / `workspaceRemoved` from the low-level protocol.
///
/// A drag is physically a disconnect followed by a connect; only the net
/// container change should surface. At most one block is pending at a time
/// and the slot is cleared by every connect.
#[derive(Debug, Default)]
pub struct WorkspaceStateHelper {
    pending: Option<BlockId>,
}

impl WorkspaceStateHelper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_disconnecting(&mut self, block: BlockId, from_drawer_side: bool) {
        if !from_drawer_side {
            self.pending = Some(block);
        }
    }

    /// `to_drawer` is set only when `to` is the Drawer itself.
    pub fn on_connecting(&mut self, block: BlockId, to_drawer: bool) -> Option<MembershipChange> {
        let was_pending = self.pending.take() == Some(block);
        if to_drawer && was_pending {
            Some(MembershipChange::Removed)
        } else if !was_pending {
            Some(MembershipChange::Added)
        } else {
            None
        }
    }

    pub fn pending(&self) -> Option<BlockId> {
        self.pending
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
