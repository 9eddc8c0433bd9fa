//! Attach, detach and displacement.
//!
//! Every public entry point leaves both adjacency tables consistent: a
//! physical connect writes the local side and then mirrors onto the remote
//! side with `is_opposite_action = true`, which never recurses further.

use super::events::WorkspaceEvent;
use super::state::MembershipChange;
use super::Workspace;
use crate::error::GraphError;
use crate::graph::{BlockId, Connection, ConnectorId, ConnectorType, Edge};
use crate::registry::Point;

impl Workspace {
    /// Attaches `block` to `this` through `connection`.
    ///
    /// The membership helper sees the connect first; the resulting event is
    /// queued once the graph mutation succeeded.
    pub fn connect(
        &mut self,
        this: BlockId,
        block: BlockId,
        connection: Connection,
        at: Option<Point>,
    ) -> Result<(), GraphError> {
        let change = self.state.on_connecting(block, this == self.drawer());
        let subtree = self.downstream_blocks(block)?;

        self.silent_connect(this, block, connection, at)?;

        match change {
            Some(MembershipChange::Added) => {
                self.events
                    .emit(WorkspaceEvent::WorkspaceAdded { block, subtree });
            }
            Some(MembershipChange::Removed) => {
                self.events
                    .emit(WorkspaceEvent::WorkspaceRemoved { block, subtree });
            }
            None => {}
        }
        Ok(())
    }

    /// Places `block` into a fresh slot of the Root or Drawer.
    pub fn attach_to_container(
        &mut self,
        container: BlockId,
        block: BlockId,
        at: Option<Point>,
    ) -> Result<(), GraphError> {
        let before = self
            .before_of(block)?
            .ok_or(GraphError::MissingConnector {
                block,
                connector_type: ConnectorType::Before,
            })?;
        let slot = self.add_container_slot(container)?;
        if let Err(e) = self.connect(container, block, Connection::new(slot, before), at) {
            self.prune_slot(container, slot)?;
            return Err(e);
        }
        Ok(())
    }

    pub fn add_to_canvas(&mut self, block: BlockId, at: Option<Point>) -> Result<(), GraphError> {
        self.attach_to_container(self.root(), block, at)
    }

    pub fn add_to_drawer(&mut self, block: BlockId, at: Option<Point>) -> Result<(), GraphError> {
        self.attach_to_container(self.drawer(), block, at)
    }

    /// Performs the connect without consulting the membership helper.
    pub(crate) fn silent_connect(
        &mut self,
        this: BlockId,
        block: BlockId,
        connection: Connection,
        at: Option<Point>,
    ) -> Result<(), GraphError> {
        let owned = self.blocks.get(this)?.connectors.clone();
        let local = match connection.local_side(&owned) {
            Some(local) => local,
            None => {
                // The pair may name the far end of our own chain.
                let tail = self.chain_tail(this)?;
                let tail_owned = self.blocks.get(tail)?.connectors.clone();
                if tail != this && connection.local_side(&tail_owned).is_some() {
                    return self.silent_connect(tail, block, connection, at);
                }
                return Err(GraphError::UnrelatedConnection {
                    block: this,
                    connection,
                });
            }
        };
        let remote = connection
            .other(local)
            .ok_or(GraphError::UnrelatedConnection {
                block: this,
                connection,
            })?;

        let remote_owner = self.connectors.get(remote)?.owner();
        let owned_by_block = match remote_owner {
            Some(owner) => owner == block || self.is_downstream_of(owner, block)?,
            None => false,
        };
        if !owned_by_block {
            return Err(GraphError::UnrelatedConnection { block, connection });
        }
        if this == block
            || self.is_downstream_of(this, block)?
            || self.is_downstream_of(block, this)?
        {
            return Err(GraphError::WouldCreateCycle {
                block,
                target: this,
            });
        }

        if let Some(position) = at {
            self.blocks.set_position(block, position);
        }

        if self.connectors.get(local)?.connector_type == ConnectorType::Before {
            self.connect_upstream(this, block, local, remote)
        } else {
            self.connect_downstream(this, block, local, remote)
        }
    }

    /// `block` goes ahead of `this`.
    fn connect_upstream(
        &mut self,
        this: BlockId,
        block: BlockId,
        local: ConnectorId,
        remote: ConnectorId,
    ) -> Result<(), GraphError> {
        let block_before = self.before_of(block)?;
        if let Some(before) = block_before {
            if self.blocks.get(block)?.connected.is_occupied(before) {
                return Err(GraphError::AlreadyAttached(block));
            }
        }

        let remote_type = self.connectors.get(remote)?.connector_type;
        let attach = match remote_type {
            ConnectorType::Inner => {
                let owner = self.owner_of(remote)?;
                if self.blocks.get(owner)?.connected.is_occupied(remote) {
                    return Err(GraphError::ConnectorOccupied {
                        block: owner,
                        connector: remote,
                    });
                }
                remote
            }
            ConnectorType::After => {
                let tail = self.chain_tail(self.owner_of(remote)?)?;
                self.after_of(tail)?.ok_or(GraphError::MissingConnector {
                    block: tail,
                    connector_type: ConnectorType::After,
                })?
            }
            _ => {
                return Err(GraphError::UnrelatedConnection {
                    block: this,
                    connection: Connection::new(local, remote),
                });
            }
        };
        let attach_owner = self.owner_of(attach)?;

        let Some(up) = self.blocks.get(this)?.connected.get(local) else {
            return self.physical_connect(attach_owner, attach, this, local, false);
        };

        let fits = match block_before {
            Some(before) => self.can_occupy(up.connector, before)?,
            None => false,
        };

        if fits && remote_type == ConnectorType::After {
            // Splice ahead of `this` by recursing upstream; the displaced
            // `this` lands on the tail of the new chain.
            let before = block_before.ok_or(GraphError::MissingConnector {
                block,
                connector_type: ConnectorType::Before,
            })?;
            let at = self.blocks.position(this);
            tracing::debug!("splicing {} ahead of {} under {}", block, this, up.block);
            return self.silent_connect(up.block, block, Connection::new(up.connector, before), at);
        }

        self.detach_edge(this, local)?;
        match block_before {
            Some(before) if fits => {
                self.physical_connect(up.block, up.connector, block, before, false)?;
            }
            _ => {
                let at = self.displacement_position(this);
                self.prune_slot(up.block, up.connector)?;
                self.rehome_to_root(block, at)?;
            }
        }
        self.physical_connect(attach_owner, attach, this, local, false)
    }

    /// `block` hangs off one of `this`'s downstream connectors.
    fn connect_downstream(
        &mut self,
        this: BlockId,
        block: BlockId,
        local: ConnectorId,
        remote: ConnectorId,
    ) -> Result<(), GraphError> {
        let remote_connector = self.connectors.get(remote)?;
        if remote_connector.connector_type != ConnectorType::Before
            || remote_connector.owner() != Some(block)
        {
            return Err(GraphError::UnrelatedConnection {
                block: this,
                connection: Connection::new(local, remote),
            });
        }
        if self.blocks.get(block)?.connected.is_occupied(remote) {
            return Err(GraphError::AlreadyAttached(block));
        }

        let displaced = self.detach_edge(this, local)?;
        self.physical_connect(this, local, block, remote, false)?;
        if let Some(displaced) = displaced {
            self.resettle(displaced, block, this)?;
        }
        Ok(())
    }

    /// Finds a new home for a block pushed out of its slot: the tail of the
    /// chain that replaced it if compatible, otherwise the canvas.
    fn resettle(&mut self, displaced: Edge, new_head: BlockId, anchor: BlockId) -> Result<(), GraphError> {
        let tail = self.chain_tail(new_head)?;
        if let Some(tail_after) = self.after_of(tail)? {
            if self.connectors.get(displaced.connector)?.connector_type == ConnectorType::Before
                && self.can_occupy(tail_after, displaced.connector)?
            {
                tracing::debug!("moving displaced {} behind {}", displaced.block, tail);
                return self.physical_connect(tail, tail_after, displaced.block, displaced.connector, false);
            }
        }
        let at = self.displacement_position(anchor);
        tracing::debug!("re-homing displaced {} to the canvas", displaced.block);
        self.rehome_to_root(displaced.block, at)
    }

    /// Writes one side of an edge and mirrors it onto the other side.
    pub(crate) fn physical_connect(
        &mut self,
        this: BlockId,
        local: ConnectorId,
        other: BlockId,
        remote: ConnectorId,
        is_opposite_action: bool,
    ) -> Result<(), GraphError> {
        let edge = Edge {
            block: other,
            connector: remote,
        };
        self.blocks
            .get_mut(this)?
            .connected
            .insert(local, edge)
            .map_err(|_| GraphError::ConnectorOccupied {
                block: this,
                connector: local,
            })?;

        if is_opposite_action {
            return Ok(());
        }

        if let Err(e) = self.physical_connect(other, remote, this, local, true) {
            self.blocks.get_mut(this)?.connected.remove(local);
            return Err(e);
        }
        tracing::debug!("connected {}:{} -> {}:{}", this, local, other, remote);

        let child = if self.connectors.get(local)?.is_downstream() {
            other
        } else {
            this
        };
        self.refresh_membership(child)
    }

    /// Removes the edge on `local` from both tables. Container slots are left
    /// in place; see `prune_slot`.
    pub(crate) fn detach_edge(&mut self, this: BlockId, local: ConnectorId) -> Result<Option<Edge>, GraphError> {
        let Some(edge) = self.blocks.get_mut(this)?.connected.remove(local) else {
            return Ok(None);
        };
        self.blocks.get_mut(edge.block)?.connected.remove(edge.connector);
        let child = if self.connectors.get(local)?.is_downstream() {
            edge.block
        } else {
            this
        };
        self.refresh_membership(child)?;
        Ok(Some(edge))
    }

    /// Pops the edge through which `this` is attached upstream.
    pub fn disconnect_self(&mut self, this: BlockId) -> Result<Edge, GraphError> {
        let up = self.upstream(this)?.ok_or(GraphError::NotAttached(this))?;
        let from_drawer_side = self.is_drawer_side(up.block)?;
        self.state.on_disconnecting(this, from_drawer_side);
        self.detach(this)
    }

    /// `disconnect_self` without telling the membership helper.
    pub(crate) fn detach(&mut self, this: BlockId) -> Result<Edge, GraphError> {
        let before = self.before_of(this)?.ok_or(GraphError::NotAttached(this))?;
        let up = self
            .detach_edge(this, before)?
            .ok_or(GraphError::NotAttached(this))?;
        self.prune_slot(up.block, up.connector)?;
        Ok(up)
    }

    /// Deregisters a block with no live edges and tombstones it.
    pub fn remove(&mut self, this: BlockId) -> Result<(), GraphError> {
        let block = self.blocks.get(this)?;
        if !block.connected.is_empty() {
            return Err(GraphError::RemoveWithLiveEdges(this));
        }
        for cid in block.connectors.clone() {
            self.connectors.deregister(cid);
        }
        self.blocks.deregister(this);
        tracing::debug!("removed block {}", this);
        Ok(())
    }

    /// Detaches `this` and removes it with everything downstream, leaves first.
    pub fn remove_subtree(&mut self, this: BlockId) -> Result<Vec<BlockId>, GraphError> {
        if self.upstream(this)?.is_some() {
            self.detach(this)?;
        }
        let order = self.downstream_blocks(this)?;
        for id in order.iter().rev() {
            if *id != this && self.upstream(*id)?.is_some() {
                self.detach(*id)?;
            }
            self.remove(*id)?;
        }
        Ok(order)
    }

    /// Removes `this` with its inputs and bodies but keeps the statements
    /// after it: they close the gap where `this` used to be.
    pub fn excise(&mut self, this: BlockId) -> Result<Vec<BlockId>, GraphError> {
        let up = match self.upstream(this)? {
            Some(_) => Some(self.detach(this)?),
            None => None,
        };
        let next = match self.after_of(this)? {
            Some(after) => self.detach_edge(this, after)?,
            None => None,
        };

        if let Some(next) = next {
            match up {
                Some(up) if self.connectors.contains(up.connector) && self.can_occupy(up.connector, next.connector)? => {
                    self.physical_connect(up.block, up.connector, next.block, next.connector, false)?;
                }
                Some(up) if self.blocks.get(up.block)?.container_kind().is_some() => {
                    let slot = self.add_container_slot(up.block)?;
                    self.physical_connect(up.block, slot, next.block, next.connector, false)?;
                }
                _ => {
                    let at = self.displacement_position(this);
                    self.rehome_to_root(next.block, at)?;
                }
            }
        }
        self.remove_subtree(this)
    }

    pub(crate) fn rehome_to_root(&mut self, block: BlockId, at: Point) -> Result<(), GraphError> {
        let root = self.root();
        let before = self
            .before_of(block)?
            .ok_or(GraphError::MissingConnector {
                block,
                connector_type: ConnectorType::Before,
            })?;
        let slot = self.add_container_slot(root)?;
        self.blocks.set_position(block, at);
        self.physical_connect(root, slot, block, before, false)
    }

    /// Drops an emptied container slot.
    pub(crate) fn prune_slot(&mut self, container: BlockId, slot: ConnectorId) -> Result<(), GraphError> {
        if self.connectors.get(slot)?.connector_type != ConnectorType::Internal {
            return Ok(());
        }
        let node = self.blocks.get_mut(container)?;
        if node.connected.is_occupied(slot) {
            return Ok(());
        }
        node.connectors.retain(|c| *c != slot);
        self.connectors.deregister(slot);
        Ok(())
    }

    /// Whether the occupant of `before` may sit on `slot`. Container slots
    /// take any block.
    fn can_occupy(&self, slot: ConnectorId, before: ConnectorId) -> Result<bool, GraphError> {
        let slot = self.connectors.get(slot)?;
        if slot.connector_type == ConnectorType::Internal {
            return Ok(true);
        }
        Ok(slot.is_compatible(self.connectors.get(before)?))
    }

    fn owner_of(&self, connector: ConnectorId) -> Result<BlockId, GraphError> {
        self.connectors
            .get(connector)?
            .owner()
            .ok_or(GraphError::UnknownConnector(connector))
    }

    /// Recomputes the drawer flag for `block` and its subtree.
    fn refresh_membership(&mut self, block: BlockId) -> Result<(), GraphError> {
        let in_drawer = self.container_of(block)? == Some(self.drawer());
        for id in self.downstream_blocks(block)? {
            self.blocks.get_mut(id)?.is_in_drawer = in_drawer && id != self.drawer();
        }
        Ok(())
    }
}
