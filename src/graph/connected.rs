use super::block::BlockId;
use super::connector::ConnectorId;
use ahash::AHashMap;

/// The far end of an edge as seen from one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub block: BlockId,
    pub connector: ConnectorId,
}

/// Per-block adjacency table keyed by the block's own connector.
///
/// Holds at most one occupant per connector.
#[derive(Debug, Clone, Default)]
pub struct ConnectedBlocks {
    edges: AHashMap<ConnectorId, Edge>,
}

impl ConnectedBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, local: ConnectorId) -> Option<Edge> {
        self.edges.get(&local).copied()
    }

    pub fn is_occupied(&self, local: ConnectorId) -> bool {
        self.edges.contains_key(&local)
    }

    /// Records an edge. Returns the edge back if `local` is already taken.
    pub fn insert(&mut self, local: ConnectorId, edge: Edge) -> Result<(), Edge> {
        if let Some(existing) = self.edges.get(&local) {
            return Err(*existing);
        }
        self.edges.insert(local, edge);
        Ok(())
    }

    pub fn remove(&mut self, local: ConnectorId) -> Option<Edge> {
        self.edges.remove(&local)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConnectorId, Edge)> + '_ {
        self.edges.iter().map(|(k, v)| (*k, *v))
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }
}
