use super::geometry::Point;
use crate::error::GraphError;
use crate::graph::{Connector, ConnectorId};
use ahash::AHashMap;

/// Directory of the live connectors of one editor session.
///
/// Connector positions are absolute canvas coordinates written by the layout
/// collaborator; a connector without a position never shows up in spatial
/// queries.
#[derive(Debug, Default)]
pub struct ConnectorRegistry {
    connectors: AHashMap<ConnectorId, Connector>,
    positions: AHashMap<ConnectorId, Point>,
    next_id: u64,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, mut connector: Connector) -> ConnectorId {
        self.next_id += 1;
        let id = ConnectorId(self.next_id);
        connector.set_id(id);
        self.connectors.insert(id, connector);
        id
    }

    pub(crate) fn deregister(&mut self, id: ConnectorId) -> Option<Connector> {
        self.positions.remove(&id);
        self.connectors.remove(&id)
    }

    pub fn get(&self, id: ConnectorId) -> Result<&Connector, GraphError> {
        self.connectors
            .get(&id)
            .ok_or(GraphError::UnknownConnector(id))
    }

    pub(crate) fn get_mut(&mut self, id: ConnectorId) -> Result<&mut Connector, GraphError> {
        self.connectors
            .get_mut(&id)
            .ok_or(GraphError::UnknownConnector(id))
    }

    pub fn contains(&self, id: ConnectorId) -> bool {
        self.connectors.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    pub fn set_position(&mut self, id: ConnectorId, position: Point) {
        self.positions.insert(id, position);
    }

    pub fn position(&self, id: ConnectorId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    /// Connectors inside the square of half-extent `max_xy` around `center`,
    /// ordered by id.
    pub fn within(&self, center: Point, max_xy: f64) -> Vec<ConnectorId> {
        let mut ids: Vec<_> = self
            .positions
            .iter()
            .filter(|(_, p)| p.within_square(&center, max_xy))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// The Euclidean-nearest connector in range that passes `accept`.
    /// Ties go to the lower id so the answer is stable.
    pub fn nearest<F>(&self, center: Point, max_xy: f64, accept: F) -> Option<(ConnectorId, f64)>
    where
        F: Fn(&Connector) -> bool,
    {
        self.within(center, max_xy)
            .into_iter()
            .filter_map(|id| {
                let connector = self.connectors.get(&id)?;
                if !accept(connector) {
                    return None;
                }
                let distance = self.positions.get(&id)?.distance(&center);
                Some((id, distance))
            })
            .fold(None, |best: Option<(ConnectorId, f64)>, candidate| match best {
                Some(b) if b.1 <= candidate.1 => Some(b),
                _ => Some(candidate),
            })
    }

    pub fn clear(&mut self) {
        self.connectors.clear();
        self.positions.clear();
        self.next_id = 0;
    }
}
