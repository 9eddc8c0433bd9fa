use super::Workspace;
use crate::error::GraphError;
use crate::graph::{BlockId, Connection, ConnectorId, ConnectorType};
use crate::registry::Point;
use ahash::AHashSet;

/// Where a drag ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dropped {
    /// The block now on the canvas: the dragged one, or its copy when it
    /// came from the Drawer.
    pub block: BlockId,
    pub connection: Option<Connection>,
}

impl Workspace {
    /// Finds where a block dragged by `offset` would snap.
    ///
    /// Anchors are tried by category: the block's own Before first, then the
    /// After at the tail of its chain, then its Inner bodies. The first
    /// category with any candidate in range wins; inside a category the
    /// nearest candidate wins.
    pub fn select_connector_for_block(
        &self,
        block: BlockId,
        offset: Point,
        max_xy: f64,
    ) -> Result<Option<Connection>, GraphError> {
        let excluded: AHashSet<BlockId> = self.downstream_blocks(block)?.into_iter().collect();

        let tail = self.chain_tail(block)?;
        let categories = [
            self.connectors_of(block, ConnectorType::Before)?,
            self.after_of(tail)?.into_iter().collect(),
            self.connectors_of(block, ConnectorType::Inner)?,
        ];

        for anchors in categories {
            let mut best: Option<(Connection, f64)> = None;
            for anchor_id in anchors {
                if let Some((candidate, distance)) = self.nearest_for_anchor(anchor_id, offset, max_xy, &excluded)? {
                    let better = match &best {
                        Some((_, d)) => distance < *d,
                        None => true,
                    };
                    if better {
                        best = Some((Connection::new(anchor_id, candidate), distance));
                    }
                }
            }
            if let Some((connection, _)) = best {
                return Ok(Some(connection));
            }
        }
        Ok(None)
    }

    fn nearest_for_anchor(
        &self,
        anchor_id: ConnectorId,
        offset: Point,
        max_xy: f64,
        excluded: &AHashSet<BlockId>,
    ) -> Result<Option<(ConnectorId, f64)>, GraphError> {
        let anchor = self.connectors.get(anchor_id)?;
        if let Some(owner) = anchor.owner() {
            if self.blocks.get(owner)?.connected.is_occupied(anchor_id) {
                return Ok(None);
            }
        }
        let Some(position) = self.connectors.position(anchor_id) else {
            return Ok(None);
        };

        Ok(self.connectors.nearest(position + offset, max_xy, |candidate| {
            let Some(owner) = candidate.owner() else {
                return false;
            };
            if excluded.contains(&owner) || candidate.connector_type == ConnectorType::Internal {
                return false;
            }
            match self.blocks.get(owner) {
                Ok(node) => !node.is_in_drawer() && anchor.is_compatible(candidate),
                Err(_) => false,
            }
        }))
    }

    /// Completes a drag: snaps the block if a target is in range, otherwise
    /// leaves it on the canvas at its new position.
    ///
    /// Palette blocks stay in the Drawer; a copy of them is dropped instead.
    pub fn drop_block(&mut self, block: BlockId, offset: Point) -> Result<Dropped, GraphError> {
        let block = if self.blocks.get(block)?.is_in_drawer() {
            let copy = self.clone_block(block)?;
            tracing::debug!("dragging copy {} of palette block {}", copy, block);
            copy
        } else {
            if self.upstream(block)?.is_some() {
                self.disconnect_self(block)?;
            }
            block
        };

        let radius = self.config().snap_radius;
        let selected = self.select_connector_for_block(block, offset, radius)?;
        let at = self.blocks.position(block).unwrap_or_default() + offset;

        match selected {
            Some(connection) => {
                let target = self
                    .connectors
                    .get(connection.to)?
                    .owner()
                    .ok_or(GraphError::UnknownConnector(connection.to))?;
                tracing::debug!("snapping {} onto {} via {}", block, target, connection);
                self.connect(target, block, connection, Some(at))?;
            }
            None => {
                let root = self.root();
                self.attach_to_container(root, block, Some(at))?;
            }
        }
        Ok(Dropped {
            block,
            connection: selected,
        })
    }
}
