//! World-space index built on top of [`RegionTree`]
//!
//! Space is cut into a uniform grid of cubic cells. Each occupied cell is
//! backed by a top-level region of the tree; points are routed to leaves at
//! the configured depth inside their cell. The index owns point identities
//! and their data, keeps each point's leaf assignment current as points
//! move, and answers radius queries that may span several cells.

use std::collections::HashMap;
use std::fmt;

use crate::config::{ConfigError, WorldIndexConfig};
use crate::foundation::collections::{PointId, PointMap, RegionKey};
use crate::foundation::math::{is_finite, Vec3};
use crate::spatial::{NodeSource, RegionTree};

/// Errors reported by [`WorldIndex`]
#[derive(thiserror::Error, Debug)]
pub enum WorldIndexError {
    /// The point was removed or never existed
    #[error("Unknown point: {0:?}")]
    UnknownPoint(PointId),

    /// Positions must have finite coordinates
    #[error("Position has non-finite coordinates: {0:?}")]
    NonFinitePosition([f64; 3]),

    /// Position quantizes to a cell the grid cannot address exactly
    #[error("Position {0:?} is outside the addressable grid")]
    PositionOutOfRange([f64; 3]),

    /// Radius must be finite and non-negative
    #[error("Invalid query radius: {0}")]
    InvalidRadius(f64),

    /// The configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Largest cell coordinate magnitude whose center is exact in `f64` (2^52)
pub const MAX_CELL_COORDINATE: f64 = 4_503_599_627_370_496.0;

/// Quantized grid coordinate selecting a top-level region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell(pub [i64; 3]);

impl GridCell {
    /// Cell containing `position` on a grid of edge `cell_size`
    ///
    /// Coordinates beyond [`MAX_CELL_COORDINATE`] saturate; use
    /// [`GridCell::try_containing`] when the input is not known to be in range.
    #[allow(clippy::cast_possible_truncation)]
    pub fn containing(position: &Vec3, cell_size: f64) -> Self {
        Self([
            (position.x / cell_size).floor() as i64,
            (position.y / cell_size).floor() as i64,
            (position.z / cell_size).floor() as i64,
        ])
    }

    /// Cell containing `position`, or `None` if any axis falls outside the
    /// addressable grid
    pub fn try_containing(position: &Vec3, cell_size: f64) -> Option<Self> {
        position
            .iter()
            .all(|p| (p / cell_size).floor().abs() < MAX_CELL_COORDINATE)
            .then(|| Self::containing(position, cell_size))
    }

    /// Center of this cell on a grid of edge `cell_size`
    #[allow(clippy::cast_precision_loss)]
    pub fn center(&self, cell_size: f64) -> Vec3 {
        let [x, y, z] = self.0;
        Vec3::new(
            (x as f64 + 0.5) * cell_size,
            (y as f64 + 0.5) * cell_size,
            (z as f64 + 0.5) * cell_size,
        )
    }

    fn within(&self, lower: &Self, upper: &Self) -> bool {
        (0..3).all(|axis| self.0[axis] >= lower.0[axis] && self.0[axis] <= upper.0[axis])
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.0;
        write!(f, "({x}, {y}, {z})")
    }
}

/// A point found by [`WorldIndex::query_radius`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a, P> {
    /// Identity of the point
    pub id: PointId,
    /// Data attached to the point
    pub payload: &'a P,
    /// Squared distance from the query position
    pub distance_squared: f64,
}

#[derive(Debug, Clone)]
struct PointRecord<P> {
    position: Vec3,
    payload: P,
    cell: GridCell,
    leaf: RegionKey,
}

/// Resolves point ids against the index's records during tree searches
struct Records<'a, P>(&'a PointMap<PointRecord<P>>);

impl<P> NodeSource<PointId> for Records<'_, P> {
    type Payload = PointId;

    fn node_position(&self, node: PointId) -> Vec3 {
        self.0[node].position
    }

    fn node_payload(&self, node: PointId) -> PointId {
        node
    }
}

/// Grid of octrees indexing points by position
#[derive(Debug, Clone)]
pub struct WorldIndex<P> {
    config: WorldIndexConfig,
    tree: RegionTree<PointId>,
    cells: HashMap<GridCell, RegionKey>,
    points: PointMap<PointRecord<P>>,
}

impl<P> WorldIndex<P> {
    /// Create an empty index
    pub fn new(config: WorldIndexConfig) -> Result<Self, WorldIndexError> {
        config.validate()?;
        log::debug!(
            "WorldIndex: cell size {}, leaf depth {}, leaf size {}",
            config.cell_size,
            config.max_depth,
            config.leaf_size()
        );

        Ok(Self {
            tree: RegionTree::new().with_search_epsilon(config.search_epsilon),
            config,
            cells: HashMap::new(),
            points: PointMap::with_key(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &WorldIndexConfig {
        &self.config
    }

    /// Underlying region tree
    pub fn tree(&self) -> &RegionTree<PointId> {
        &self.tree
    }

    /// Grid cell containing `position`
    pub fn cell_of(&self, position: &Vec3) -> GridCell {
        GridCell::containing(position, self.config.cell_size)
    }

    /// Top-level region backing `cell`, if any point lives there
    pub fn top_level_region(&self, cell: GridCell) -> Option<RegionKey> {
        self.cells.get(&cell).copied()
    }

    /// Occupied cells and their top-level regions
    pub fn top_level_regions(&self) -> impl Iterator<Item = (GridCell, RegionKey)> + '_ {
        self.cells.iter().map(|(cell, key)| (*cell, *key))
    }

    /// Number of occupied cells
    pub fn top_level_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index holds no point
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether `id` refers to a live point
    pub fn contains(&self, id: PointId) -> bool {
        self.points.contains_key(id)
    }

    /// Current position of a point
    pub fn position(&self, id: PointId) -> Option<Vec3> {
        self.points.get(id).map(|record| record.position)
    }

    /// Data attached to a point
    pub fn payload(&self, id: PointId) -> Option<&P> {
        self.points.get(id).map(|record| &record.payload)
    }

    /// Mutable access to the data attached to a point
    pub fn payload_mut(&mut self, id: PointId) -> Option<&mut P> {
        self.points.get_mut(id).map(|record| &mut record.payload)
    }

    /// Leaf region currently holding a point
    pub fn leaf_of(&self, id: PointId) -> Option<RegionKey> {
        self.points.get(id).map(|record| record.leaf)
    }

    /// Iterate over every point
    pub fn iter(&self) -> impl Iterator<Item = (PointId, Vec3, &P)> {
        self.points
            .iter()
            .map(|(id, record)| (id, record.position, &record.payload))
    }

    /// Add a point
    pub fn insert(&mut self, position: Vec3, payload: P) -> Result<PointId, WorldIndexError> {
        let cell = self.checked_cell(&position)?;
        let root = self.root_for(cell);
        let leaf = self
            .tree
            .create_sub_region_at_depth(root, &position, self.config.max_depth);

        let id = self.points.insert(PointRecord {
            position,
            payload,
            cell,
            leaf,
        });
        self.tree.add_node(leaf, id);
        Ok(id)
    }

    /// Remove a point, returning its data
    pub fn remove(&mut self, id: PointId) -> Result<P, WorldIndexError> {
        let record = self.points.remove(id).ok_or(WorldIndexError::UnknownPoint(id))?;
        self.tree.remove_node(record.leaf, id);
        self.release_cell_if_empty(record.cell);
        Ok(record.payload)
    }

    /// Relocate a point
    ///
    /// Points that stay within their leaf only have their position updated.
    pub fn move_point(&mut self, id: PointId, position: Vec3) -> Result<(), WorldIndexError> {
        let cell = self.checked_cell(&position)?;
        let (old_cell, old_leaf) = self
            .points
            .get(id)
            .map(|record| (record.cell, record.leaf))
            .ok_or(WorldIndexError::UnknownPoint(id))?;

        let root = self.root_for(cell);
        let leaf = self
            .tree
            .create_sub_region_at_depth(root, &position, self.config.max_depth);
        if leaf != old_leaf {
            self.tree.move_node(old_leaf, leaf, id);
        }

        let record = &mut self.points[id];
        record.position = position;
        record.cell = cell;
        record.leaf = leaf;

        if cell != old_cell {
            self.release_cell_if_empty(old_cell);
        }
        Ok(())
    }

    /// Every point within `radius` of `position`, nearest first
    ///
    /// All occupied cells overlapping the query sphere's bounding cube are
    /// searched, so results are not limited to the cell containing
    /// `position`.
    pub fn query_radius(
        &self,
        position: Vec3,
        radius: f64,
    ) -> Result<Vec<Neighbor<'_, P>>, WorldIndexError> {
        self.checked_cell(&position)?;
        if !radius.is_finite() || radius < 0.0 {
            return Err(WorldIndexError::InvalidRadius(radius));
        }

        let mut ids = Vec::new();
        let mut distances2 = Vec::new();
        let source = Records(&self.points);
        for root in self.roots_near(&position, radius) {
            self.tree.neighbors_within_radius(
                root,
                radius,
                &position,
                &source,
                &mut ids,
                &mut distances2,
                self.config.max_depth,
            );
        }

        let mut neighbors: Vec<_> = ids
            .into_iter()
            .zip(distances2)
            .map(|(id, distance_squared)| Neighbor {
                id,
                payload: &self.points[id].payload,
                distance_squared,
            })
            .collect();
        neighbors.sort_by(|a, b| a.distance_squared.total_cmp(&b.distance_squared));
        Ok(neighbors)
    }

    /// Remove every point and region
    pub fn clear(&mut self) {
        self.tree.clear();
        self.cells.clear();
        self.points.clear();
    }

    /// Top-level regions of occupied cells overlapping the cube of half
    /// extent `radius` around `position`
    fn roots_near(&self, position: &Vec3, radius: f64) -> Vec<RegionKey> {
        let reach = Vec3::repeat(radius);
        let lower = self.cell_of(&(position - reach));
        let upper = self.cell_of(&(position + reach));

        let span = (0..3).fold(1_u128, |acc, axis| {
            let width = upper.0[axis]
                .checked_sub(lower.0[axis])
                .and_then(|w| w.checked_add(1))
                .and_then(|w| u128::try_from(w).ok())
                .unwrap_or(u128::MAX);
            acc.saturating_mul(width)
        });

        if span <= self.cells.len() as u128 {
            let mut roots = Vec::new();
            for x in lower.0[0]..=upper.0[0] {
                for y in lower.0[1]..=upper.0[1] {
                    for z in lower.0[2]..=upper.0[2] {
                        if let Some(root) = self.cells.get(&GridCell([x, y, z])) {
                            roots.push(*root);
                        }
                    }
                }
            }
            roots
        } else {
            self.cells
                .iter()
                .filter(|(cell, _)| cell.within(&lower, &upper))
                .map(|(_, root)| *root)
                .collect()
        }
    }

    /// Cell of `position`, rejecting coordinates the grid cannot hold
    fn checked_cell(&self, position: &Vec3) -> Result<GridCell, WorldIndexError> {
        if !is_finite(position) {
            return Err(WorldIndexError::NonFinitePosition([position.x, position.y, position.z]));
        }
        GridCell::try_containing(position, self.config.cell_size)
            .ok_or(WorldIndexError::PositionOutOfRange([position.x, position.y, position.z]))
    }

    fn root_for(&mut self, cell: GridCell) -> RegionKey {
        if let Some(root) = self.cells.get(&cell) {
            return *root;
        }

        let cell_size = self.config.cell_size;
        let root = self
            .tree
            .create_root(cell.center(cell_size), Vec3::repeat(cell_size));
        self.cells.insert(cell, root);
        log::debug!("WorldIndex: opened top-level region {:?} for cell {}", root, cell);
        root
    }

    fn release_cell_if_empty(&mut self, cell: GridCell) {
        let Some(root) = self.cells.get(&cell).copied() else {
            return;
        };

        if self.tree.region(root).node_count() == 0 {
            self.tree.remove_root(root);
            self.cells.remove(&cell);
            log::debug!("WorldIndex: closed top-level region {:?} for cell {}", root, cell);
        }
    }
}

impl<P> Default for WorldIndex<P> {
    fn default() -> Self {
        Self {
            tree: RegionTree::new(),
            config: WorldIndexConfig::default(),
            cells: HashMap::new(),
            points: PointMap::with_key(),
        }
    }
}
