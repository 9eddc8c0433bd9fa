//! The mutable program graph of one editor session.
//!
//! A `Workspace` owns the block and connector registries, the Root (canvas)
//! and Drawer (palette) containers, the membership helper and the deferred
//! event queue. Everything runs on one thread; there is exactly one mutator.

use crate::error::GraphError;
use crate::graph::factory::{self, container_slot};
use crate::graph::{
    Block, BlockData, BlockId, BlockType, Connector, ConnectorId, ConnectorRole, ConnectorType, ContainerKind,
    Edge,
};
use crate::registry::{BlockRegistry, ConnectorRegistry, Point, Size};
use ahash::{AHashMap, AHashSet};

pub mod events;
mod protocol;
mod snapping;
pub mod state;

pub use events::{Deferred, EventQueue, WorkspaceEvent};
pub use snapping::Dropped;
pub use state::{MembershipChange, WorkspaceStateHelper};

/// Tunables for the editing protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkspaceConfig {
    /// Half-extent of the square searched when snapping a dragged block.
    pub snap_radius: f64,
    /// Offset applied when a displaced block is re-homed onto the canvas.
    pub displacement_offset: Point,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            snap_radius: 25.0,
            displacement_offset: Point::new(20.0, 20.0),
        }
    }
}

pub struct Workspace {
    pub(crate) blocks: BlockRegistry,
    pub(crate) connectors: ConnectorRegistry,
    pub(crate) state: WorkspaceStateHelper,
    pub(crate) events: EventQueue,
    root: BlockId,
    drawer: BlockId,
    config: WorkspaceConfig,
}

impl Workspace {
    pub fn new(config: WorkspaceConfig) -> Self {
        let mut blocks = BlockRegistry::new();
        let root = blocks.register(BlockData::Root {
            container: ContainerKind::Canvas,
        });
        let drawer = blocks.register(BlockData::Root {
            container: ContainerKind::Drawer,
        });
        Self {
            blocks,
            connectors: ConnectorRegistry::new(),
            state: WorkspaceStateHelper::new(),
            events: EventQueue::new(),
            root,
            drawer,
            config,
        }
    }

    /// Drops every block and starts over with fresh containers.
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.connectors.clear();
        self.state.clear();
        self.events.clear();
        self.root = self.blocks.register(BlockData::Root {
            container: ContainerKind::Canvas,
        });
        self.drawer = self.blocks.register(BlockData::Root {
            container: ContainerKind::Drawer,
        });
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn drawer(&self) -> BlockId {
        self.drawer
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn connectors(&self) -> &ConnectorRegistry {
        &self.connectors
    }

    pub fn pending_tasks(&self) -> usize {
        self.events.len()
    }

    // Layout collaborator setters.

    pub fn set_block_position(&mut self, block: BlockId, position: Point) {
        self.blocks.set_position(block, position);
    }

    pub fn set_block_size(&mut self, block: BlockId, size: Size) {
        self.blocks.set_size(block, size);
    }

    pub fn set_connector_position(&mut self, connector: ConnectorId, position: Point) {
        self.connectors.set_position(connector, position);
    }

    /// Constructs a block for `data` together with its connectors.
    pub fn create_block(&mut self, data: BlockData) -> Result<BlockId, GraphError> {
        let layout = factory::connectors_for(&data);
        let block_type = data.block_type();
        if let Err(message) = data.validate() {
            return Err(GraphError::InvalidPayload {
                block_type,
                message,
            });
        }
        let id = self.blocks.register(data);
        for connector in layout {
            self.adopt_connector(id, block_type, connector)?;
        }
        tracing::debug!("created {} block {}", block_type, id);
        Ok(id)
    }

    fn adopt_connector(
        &mut self,
        block: BlockId,
        block_type: BlockType,
        connector: Connector,
    ) -> Result<ConnectorId, GraphError> {
        let cid = self.connectors.register(connector);
        self.connectors.get_mut(cid)?.assign_owner(block, block_type)?;
        self.blocks.get_mut(block)?.connectors.push(cid);
        Ok(cid)
    }

    pub fn block(&self, id: BlockId) -> Result<&Block, GraphError> {
        self.blocks.get(id)
    }

    pub fn data(&self, id: BlockId) -> Result<BlockData, GraphError> {
        Ok(self.blocks.get(id)?.data())
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains(id)
    }

    pub fn connector(&self, id: ConnectorId) -> Result<&Connector, GraphError> {
        self.connectors.get(id)
    }

    /// The block's connectors of one type, in socket order.
    pub fn connectors_of(
        &self,
        block: BlockId,
        connector_type: ConnectorType,
    ) -> Result<Vec<ConnectorId>, GraphError> {
        let mut found = Vec::new();
        for cid in self.blocks.get(block)?.connectors() {
            if self.connectors.get(*cid)?.connector_type == connector_type {
                found.push(*cid);
            }
        }
        Ok(found)
    }

    pub fn connector_with_role(
        &self,
        block: BlockId,
        connector_type: ConnectorType,
        role: ConnectorRole,
    ) -> Result<Option<ConnectorId>, GraphError> {
        for cid in self.blocks.get(block)?.connectors() {
            let connector = self.connectors.get(*cid)?;
            if connector.connector_type == connector_type && connector.role == role {
                return Ok(Some(*cid));
            }
        }
        Ok(None)
    }

    pub fn before_of(&self, block: BlockId) -> Result<Option<ConnectorId>, GraphError> {
        Ok(self
            .connectors_of(block, ConnectorType::Before)?
            .into_iter()
            .next())
    }

    pub fn after_of(&self, block: BlockId) -> Result<Option<ConnectorId>, GraphError> {
        Ok(self
            .connectors_of(block, ConnectorType::After)?
            .into_iter()
            .next())
    }

    /// The edge through which `block` hangs off its upstream neighbour.
    pub fn upstream(&self, block: BlockId) -> Result<Option<Edge>, GraphError> {
        match self.before_of(block)? {
            Some(before) => Ok(self.blocks.get(block)?.connected.get(before)),
            None => Ok(None),
        }
    }

    pub fn occupant(&self, block: BlockId, connector: ConnectorId) -> Result<Option<Edge>, GraphError> {
        Ok(self.blocks.get(block)?.connected.get(connector))
    }

    /// The block attached to `block`'s After connector.
    pub fn next_in_chain(&self, block: BlockId) -> Result<Option<BlockId>, GraphError> {
        match self.after_of(block)? {
            Some(after) => Ok(self.occupant(block, after)?.map(|e| e.block)),
            None => Ok(None),
        }
    }

    /// Last block reached by following `after` from `block`.
    pub fn chain_tail(&self, block: BlockId) -> Result<BlockId, GraphError> {
        let mut current = block;
        let mut seen = AHashSet::new();
        seen.insert(current);
        while let Some(next) = self.next_in_chain(current)? {
            if !seen.insert(next) {
                break;
            }
            current = next;
        }
        Ok(current)
    }

    /// `block` and everything transitively downstream of it, in pre-order.
    pub fn downstream_blocks(&self, block: BlockId) -> Result<Vec<BlockId>, GraphError> {
        let mut order = Vec::new();
        let mut seen = AHashSet::new();
        let mut stack = vec![block];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            order.push(current);
            let node = self.blocks.get(current)?;
            let mut children = Vec::new();
            for cid in node.connectors() {
                if !self.connectors.get(*cid)?.is_downstream() {
                    continue;
                }
                if let Some(edge) = node.connected.get(*cid) {
                    children.push(edge.block);
                }
            }
            stack.extend(children.into_iter().rev());
        }
        Ok(order)
    }

    pub fn is_downstream_of(&self, block: BlockId, ancestor: BlockId) -> Result<bool, GraphError> {
        Ok(self.downstream_blocks(ancestor)?.contains(&block))
    }

    /// Blocks from `block` up to the top of its tree, `block` first.
    pub fn ancestry(&self, block: BlockId) -> Result<Vec<BlockId>, GraphError> {
        let mut chain = vec![block];
        let mut current = block;
        while let Some(edge) = self.upstream(current)? {
            if chain.contains(&edge.block) {
                break;
            }
            chain.push(edge.block);
            current = edge.block;
        }
        Ok(chain)
    }

    /// The Root or Drawer the block ultimately hangs off, if any.
    pub fn container_of(&self, block: BlockId) -> Result<Option<BlockId>, GraphError> {
        let top = *self.ancestry(block)?.last().unwrap_or(&block);
        Ok(self.blocks.get(top)?.container_kind().map(|_| top))
    }

    pub fn is_on_canvas(&self, block: BlockId) -> Result<bool, GraphError> {
        Ok(block != self.root && self.container_of(block)? == Some(self.root))
    }

    pub(crate) fn is_drawer_side(&self, block: BlockId) -> Result<bool, GraphError> {
        Ok(block == self.drawer || self.blocks.get(block)?.is_in_drawer())
    }

    /// Top-level blocks of a container in canvas order.
    pub fn children_of(&self, container: BlockId) -> Result<Vec<BlockId>, GraphError> {
        let node = self.blocks.get(container)?;
        Ok(node
            .connectors()
            .iter()
            .filter_map(|cid| node.connected.get(*cid).map(|e| e.block))
            .collect())
    }

    /// Replaces a block's payload through `edit`, revalidates it and emits
    /// `dataChanged`. Returns the previous payload.
    pub fn update_data<F>(&mut self, block: BlockId, edit: F) -> Result<BlockData, GraphError>
    where
        F: FnOnce(&mut BlockData),
    {
        let mut data = self.blocks.get(block)?.data();
        edit(&mut data);
        let changed = data != *self.blocks.get(block)?.data_ref();
        let previous = self.blocks.get_mut(block)?.replace_data(data)?;
        if changed {
            self.refresh_connectors(block)?;
            self.revalidate_connections(block)?;
            self.events.emit(WorkspaceEvent::DataChanged {
                block,
                previous: previous.clone(),
            });
        }
        Ok(previous)
    }

    /// Re-derives carried value types and argument sockets from the payload.
    pub fn refresh_connectors(&mut self, block: BlockId) -> Result<(), GraphError> {
        let node = self.blocks.get(block)?;
        if node.container_kind().is_some() {
            return Ok(());
        }
        let block_type = node.block_type();
        let desired = factory::connectors_for(node.data_ref());
        let current = node.connectors.clone();

        for (index, wanted) in desired.iter().enumerate() {
            match current.get(index) {
                Some(cid) => {
                    let connector = self.connectors.get_mut(*cid)?;
                    connector.value_type = wanted.value_type.clone();
                    connector.predicates = wanted.predicates.clone();
                }
                None => {
                    self.adopt_connector(block, block_type, wanted.clone())?;
                }
            }
        }

        for cid in current.iter().skip(desired.len()) {
            if let Some(edge) = self.detach_edge(block, *cid)? {
                let at = self.displacement_position(block);
                self.rehome_to_root(edge.block, at)?;
            }
            self.connectors.deregister(*cid);
            self.blocks.get_mut(block)?.connectors.retain(|c| c != cid);
        }
        Ok(())
    }

    /// Moves out whatever no longer satisfies the connectors' predicates.
    /// Returns the blocks that were re-homed to the canvas.
    pub fn revalidate_connections(&mut self, block: BlockId) -> Result<Vec<BlockId>, GraphError> {
        let mut edges: Vec<_> = self.blocks.get(block)?.connected.iter().collect();
        edges.sort_by_key(|(local, _)| *local);

        let mut rehomed = Vec::new();
        for (local, edge) in edges {
            let local_connector = self.connectors.get(local)?;
            let remote_connector = self.connectors.get(edge.connector)?;
            if local_connector.connector_type == ConnectorType::Internal
                || remote_connector.connector_type == ConnectorType::Internal
                || local_connector.is_compatible(remote_connector)
            {
                continue;
            }
            let child = if local_connector.is_downstream() {
                edge.block
            } else {
                block
            };
            self.detach_edge(block, local)?;
            let at = self.displacement_position(block);
            self.rehome_to_root(child, at)?;
            tracing::warn!("block {} no longer fits next to {}; moved to canvas", child, block);
            rehomed.push(child);
        }
        Ok(rehomed)
    }

    /// Deep-copies `block` and its downstream subtree into new, unattached
    /// blocks and emits `registeredClone` for each copy.
    pub fn clone_block(&mut self, block: BlockId) -> Result<BlockId, GraphError> {
        let subtree = self.downstream_blocks(block)?;
        let mut mapping: AHashMap<BlockId, BlockId> = AHashMap::new();
        for original in &subtree {
            let data = self.blocks.get(*original)?.data();
            if data.block_type() == BlockType::Root {
                return Err(GraphError::InvalidPayload {
                    block_type: BlockType::Root,
                    message: "containers cannot be cloned".to_string(),
                });
            }
            let copy = self.create_block(data)?;
            if let Some(position) = self.blocks.position(*original) {
                self.blocks.set_position(copy, position);
            }
            let from = self.blocks.get(*original)?.connectors.clone();
            let to = self.blocks.get(copy)?.connectors.clone();
            for (source, target) in from.iter().zip(to.iter()) {
                if let Some(position) = self.connectors.position(*source) {
                    self.connectors.set_position(*target, position);
                }
            }
            mapping.insert(*original, copy);
        }

        for original in &subtree {
            let node = self.blocks.get(*original)?;
            let own = node.connectors.clone();
            let mut edges: Vec<_> = node.connected.iter().collect();
            edges.sort_by_key(|(local, _)| *local);
            for (local, edge) in edges {
                if !self.connectors.get(local)?.is_downstream() {
                    continue;
                }
                let Some(remote_copy) = mapping.get(&edge.block).copied() else {
                    continue;
                };
                let local_index = own.iter().position(|c| *c == local);
                let remote_index = self
                    .blocks
                    .get(edge.block)?
                    .connectors
                    .iter()
                    .position(|c| *c == edge.connector);
                if let (Some(li), Some(ri)) = (local_index, remote_index) {
                    let Some(copy) = mapping.get(original).copied() else {
                        continue;
                    };
                    let copy_local = self.blocks.get(copy)?.connectors[li];
                    let copy_remote = self.blocks.get(remote_copy)?.connectors[ri];
                    self.physical_connect(copy, copy_local, remote_copy, copy_remote, false)?;
                }
            }
        }

        for original in &subtree {
            if let Some(clone) = mapping.get(original).copied() {
                self.events.emit(WorkspaceEvent::RegisteredClone {
                    original: *original,
                    clone,
                });
            }
        }
        mapping.get(&block).copied().ok_or(GraphError::UnknownBlock(block))
    }

    pub(crate) fn displacement_position(&self, anchor: BlockId) -> Point {
        self.blocks.position(anchor).unwrap_or_default() + self.config.displacement_offset
    }

    /// Opens a fresh slot on a container.
    pub(crate) fn add_container_slot(&mut self, container: BlockId) -> Result<ConnectorId, GraphError> {
        let block_type = self.blocks.get(container)?.block_type();
        self.adopt_connector(container, block_type, container_slot())
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(WorkspaceConfig::default())
    }
}
