//! A single node of the region hierarchy

use std::collections::HashSet;
use std::hash::Hash;

use crate::foundation::collections::RegionKey;
use crate::foundation::math::Vec3;
use crate::spatial::Octant;

/// Axis-aligned box subdivision of space at a given depth
///
/// Regions are created and destroyed by a [`RegionTree`](crate::spatial::RegionTree);
/// user code only reads them. `nodes` holds every node stored anywhere in the
/// subtree rooted here, not only nodes routed to this exact region.
#[derive(Debug, Clone)]
pub struct Region<K> {
    pub(crate) lower_bounds: Vec3,
    pub(crate) upper_bounds: Vec3,
    pub(crate) position: Vec3,
    pub(crate) size: Vec3,
    pub(crate) depth: u32,
    pub(crate) parent: Option<RegionKey>,
    pub(crate) parent_index: Option<Octant>,
    pub(crate) sub_regions: [Option<RegionKey>; 8],
    pub(crate) nodes: HashSet<K>,
    pub(crate) node_count: usize,
}

impl<K: Copy + Eq + Hash> Region<K> {
    pub(crate) fn new(
        position: Vec3,
        size: Vec3,
        depth: u32,
        parent: Option<RegionKey>,
        parent_index: Option<Octant>,
    ) -> Self {
        let half = size * 0.5;
        Self {
            lower_bounds: position - half,
            upper_bounds: position + half,
            position,
            size,
            depth,
            parent,
            parent_index,
            sub_regions: [None; 8],
            nodes: HashSet::new(),
            node_count: 0,
        }
    }

    /// Minimum corner
    pub fn lower_bounds(&self) -> Vec3 {
        self.lower_bounds
    }

    /// Maximum corner
    pub fn upper_bounds(&self) -> Vec3 {
        self.upper_bounds
    }

    /// Center of the region
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Full extents per axis
    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// Depth in the hierarchy, 1 for top-level regions
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Owning region, `None` for top-level regions
    pub fn parent(&self) -> Option<RegionKey> {
        self.parent
    }

    /// Octant this region occupies in its parent
    pub fn parent_index(&self) -> Option<Octant> {
        self.parent_index
    }

    /// Whether this region has no parent
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    /// Child occupying `octant`, if materialized
    pub fn sub_region(&self, octant: Octant) -> Option<RegionKey> {
        self.sub_regions[octant.slot()]
    }

    /// Materialized children with their octants
    pub fn sub_regions(&self) -> impl Iterator<Item = (Octant, RegionKey)> + '_ {
        Octant::ALL
            .into_iter()
            .filter_map(|octant| self.sub_regions[octant.slot()].map(|key| (octant, key)))
    }

    /// Whether any child is materialized
    pub fn has_sub_regions(&self) -> bool {
        self.sub_regions.iter().any(Option::is_some)
    }

    /// Nodes stored in this region's subtree
    pub fn nodes(&self) -> impl Iterator<Item = K> + '_ {
        self.nodes.iter().copied()
    }

    /// Whether `node` is stored in this region's subtree
    pub fn contains_node(&self, node: &K) -> bool {
        self.nodes.contains(node)
    }

    /// Number of nodes stored in this region's subtree
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Whether `point` lies inside the closed bounds of this region
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.lower_bounds.x
            && point.x <= self.upper_bounds.x
            && point.y >= self.lower_bounds.y
            && point.y <= self.upper_bounds.y
            && point.z >= self.lower_bounds.z
            && point.z <= self.upper_bounds.z
    }

    /// Record `node` here; returns `false` if it was already present
    pub(crate) fn insert_node(&mut self, node: K) -> bool {
        if self.nodes.insert(node) {
            self.node_count += 1;
            true
        } else {
            false
        }
    }

    /// Forget `node`; returns `false` if it was not present
    pub(crate) fn take_node(&mut self, node: &K) -> bool {
        if self.nodes.remove(node) {
            self.node_count -= 1;
            true
        } else {
            false
        }
    }
}
