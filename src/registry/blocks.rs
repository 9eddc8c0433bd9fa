use super::geometry::{Point, Size};
use crate::error::GraphError;
use crate::graph::{Block, BlockData, BlockId};
use ahash::{AHashMap, AHashSet};

/// Directory of the live blocks of one editor session.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    blocks: AHashMap<BlockId, Block>,
    positions: AHashMap<BlockId, Point>,
    sizes: AHashMap<BlockId, Size>,
    removed: AHashSet<BlockId>,
    next_id: u64,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an id and stores a new block for `data`.
    pub(crate) fn register(&mut self, data: BlockData) -> BlockId {
        self.next_id += 1;
        let id = BlockId(self.next_id);
        self.blocks.insert(id, Block::new(id, data));
        id
    }

    /// Drops the block and remembers its id as a tombstone.
    pub(crate) fn deregister(&mut self, id: BlockId) -> Option<Block> {
        let mut block = self.blocks.remove(&id)?;
        block.removed = true;
        block.connected.clear();
        self.positions.remove(&id);
        self.sizes.remove(&id);
        self.removed.insert(id);
        Some(block)
    }

    pub fn get(&self, id: BlockId) -> Result<&Block, GraphError> {
        self.blocks.get(&id).ok_or(GraphError::UnknownBlock(id))
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Result<&mut Block, GraphError> {
        self.blocks.get_mut(&id).ok_or(GraphError::UnknownBlock(id))
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn is_removed(&self, id: BlockId) -> bool {
        self.removed.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All live block ids in allocation order.
    pub fn ids(&self) -> Vec<BlockId> {
        let mut ids: Vec<_> = self.blocks.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn set_position(&mut self, id: BlockId, position: Point) {
        self.positions.insert(id, position);
    }

    pub fn position(&self, id: BlockId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    pub fn set_size(&mut self, id: BlockId, size: Size) {
        self.sizes.insert(id, size);
    }

    pub fn size(&self, id: BlockId) -> Option<Size> {
        self.sizes.get(&id).copied()
    }

    /// Forgets every block. Used when a program is loaded.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.positions.clear();
        self.sizes.clear();
        self.removed.clear();
        self.next_id = 0;
    }
}
