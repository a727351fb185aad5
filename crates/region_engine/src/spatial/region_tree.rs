//! Sparse octree of regions with denormalized node membership
//!
//! All regions live in one arena owned by [`RegionTree`]. A region owns its
//! children through its `sub_regions` table and points back to its parent
//! with a plain key. Every node is recorded in the leaf it was routed to and
//! in every ancestor of that leaf, so each region knows its subtree's
//! population without walking it.
//!
//! Regions are materialized the first time a node is routed through them and
//! freed as soon as their population drops back to zero. Top-level regions
//! are the exception: they are created with [`RegionTree::create_root`] and
//! only go away through [`RegionTree::remove_root`].
//!
//! Misuse (removing a node from a leaf that never held it, moving between
//! regions of different depth, and so on) is a programming error and panics
//! at the point of detection.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use crate::foundation::collections::{RegionKey, RegionMap};
use crate::foundation::math::Vec3;
use crate::spatial::search::DEFAULT_SEARCH_EPSILON;
use crate::spatial::{Octant, Region};

/// Arena of regions forming one or more octrees
#[derive(Debug, Clone)]
pub struct RegionTree<K> {
    regions: RegionMap<Region<K>>,
    pub(crate) search_epsilon: f64,
}

/// Result of a full structural check of a [`RegionTree`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeIntegrityReport {
    /// Number of regions visited
    pub regions_checked: usize,
    /// Human readable description of every violated invariant
    pub violations: Vec<String>,
}

impl TreeIntegrityReport {
    /// Whether no invariant was violated
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug> RegionTree<K> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            regions: RegionMap::with_key(),
            search_epsilon: DEFAULT_SEARCH_EPSILON,
        }
    }

    /// Set the slack added to the pruning bound of radius queries
    pub fn with_search_epsilon(mut self, epsilon: f64) -> Self {
        self.search_epsilon = epsilon;
        self
    }

    /// Slack added to the pruning bound of radius queries
    pub fn search_epsilon(&self) -> f64 {
        self.search_epsilon
    }

    /// Build a region centered at `position` with full extents `size`
    ///
    /// With a parent the region is one level deeper than it and is linked
    /// into the parent's table at the given octant, which must be free.
    /// Without a parent it is a depth 1 region. The region is not checked to
    /// lie inside its parent.
    pub fn create_region(
        &mut self,
        position: Vec3,
        size: Vec3,
        parent: Option<(RegionKey, Octant)>,
    ) -> RegionKey {
        let depth = match parent {
            Some((parent_key, octant)) => {
                let parent_region = &self.regions[parent_key];
                assert!(
                    parent_region.sub_region(octant).is_none(),
                    "octant {octant} of region {parent_key:?} is already occupied"
                );
                parent_region.depth + 1
            }
            None => 1,
        };

        let region = Region::new(
            position,
            size,
            depth,
            parent.map(|(key, _)| key),
            parent.map(|(_, octant)| octant),
        );
        let key = self.regions.insert(region);

        if let Some((parent_key, octant)) = parent {
            self.regions[parent_key].sub_regions[octant.slot()] = Some(key);
        }

        key
    }

    /// Build a top-level region
    pub fn create_root(&mut self, position: Vec3, size: Vec3) -> RegionKey {
        self.create_region(position, size, None)
    }

    /// Free an empty top-level region
    pub fn remove_root(&mut self, key: RegionKey) {
        let region = &self.regions[key];
        assert!(region.is_top_level(), "region {key:?} is not a top-level region");
        assert_eq!(
            region.node_count, 0,
            "top-level region {key:?} still holds {} nodes",
            region.node_count
        );
        debug_assert!(!region.has_sub_regions());
        self.regions.remove(key);
    }

    /// Octant of `region` that owns `point`
    pub fn sub_region_index(&self, region: RegionKey, point: &Vec3) -> Octant {
        Octant::classify(&self.regions[region].position, point)
    }

    /// Materialize the child of `parent` at `octant`
    ///
    /// The child's center is the parent's center offset by a quarter of the
    /// parent's size along each axis, and its extents are halved.
    pub fn create_sub_region(&mut self, parent: RegionKey, octant: Octant) -> RegionKey {
        let (position, size) = {
            let region = &self.regions[parent];
            (
                region.position + region.size.component_mul(&octant.offset()),
                region.size * 0.5,
            )
        };

        let key = self.create_region(position, size, Some((parent, octant)));
        log::trace!(
            "RegionTree: created region {:?} in octant {} of {:?} at depth {}",
            key,
            octant,
            parent,
            self.regions[key].depth
        );
        key
    }

    /// Find or create the region at `max_depth` below `region` that owns `point`
    pub fn create_sub_region_at_depth(
        &mut self,
        region: RegionKey,
        point: &Vec3,
        max_depth: u32,
    ) -> RegionKey {
        let start_depth = self.regions[region].depth;
        assert!(
            max_depth >= start_depth,
            "max depth {max_depth} is above region {region:?} at depth {start_depth}"
        );

        let mut current = region;
        while self.regions[current].depth < max_depth {
            let octant = self.sub_region_index(current, point);
            current = match self.regions[current].sub_region(octant) {
                Some(child) => child,
                None => self.create_sub_region(current, octant),
            };
        }
        current
    }

    /// Find the already materialized region at `max_depth` that owns `point`
    pub fn find_leaf(&self, region: RegionKey, point: &Vec3, max_depth: u32) -> Option<RegionKey> {
        let mut current = region;
        while self.regions[current].depth < max_depth {
            let octant = self.sub_region_index(current, point);
            current = self.regions[current].sub_region(octant)?;
        }
        Some(current)
    }

    /// Record `node` in `lowest` and every ancestor of it
    ///
    /// Regions already holding the node are left as they are.
    pub fn add_node(&mut self, lowest: RegionKey, node: K) {
        let mut current = Some(lowest);
        while let Some(key) = current {
            let region = &mut self.regions[key];
            region.insert_node(node);
            current = region.parent;
        }
    }

    /// Remove `node` from `lowest` and every ancestor of it
    ///
    /// Any non top-level region left empty is detached from its parent and
    /// freed.
    ///
    /// # Panics
    ///
    /// Panics if some region on the path does not hold `node`.
    pub fn remove_node(&mut self, lowest: RegionKey, node: K) {
        let mut current = Some(lowest);
        while let Some(key) = current {
            current = self.detach_node(key, node);
        }
    }

    /// Relocate `node` from leaf `from` to leaf `to` at the same depth
    ///
    /// Only regions strictly below the lowest common ancestor of the two
    /// leaves are touched. Leaves under different top-level regions are
    /// handled up to and including both top-level regions.
    ///
    /// # Panics
    ///
    /// Panics if the leaves are the same region, differ in depth, or if
    /// `node` is missing from the `from` chain.
    pub fn move_node(&mut self, from: RegionKey, to: RegionKey, node: K) {
        assert_ne!(from, to, "cannot move node {node:?} into the region it is already in");
        let from_depth = self.regions[from].depth;
        let to_depth = self.regions[to].depth;
        assert_eq!(
            from_depth, to_depth,
            "cannot move node {node:?} between depth {from_depth} and depth {to_depth}"
        );

        let mut from_side = Some(from);
        let mut to_side = Some(to);
        while let (Some(from_key), Some(to_key)) = (from_side, to_side) {
            if from_key == to_key {
                break;
            }

            from_side = self.detach_node(from_key, node);

            let region = &mut self.regions[to_key];
            region.insert_node(node);
            to_side = region.parent;
        }
    }

    /// Remove `node` from a single region, pruning it if it became empty
    ///
    /// Returns the parent of the region.
    fn detach_node(&mut self, key: RegionKey, node: K) -> Option<RegionKey> {
        let region = &mut self.regions[key];
        assert!(
            region.take_node(&node),
            "node {node:?} is not stored in region {key:?} at depth {}",
            region.depth
        );

        let parent = region.parent;
        if region.node_count == 0 {
            if let (Some(parent_key), Some(octant)) = (region.parent, region.parent_index) {
                self.prune(key, parent_key, octant);
            }
        }
        parent
    }

    fn prune(&mut self, key: RegionKey, parent: RegionKey, octant: Octant) {
        debug_assert_eq!(self.regions[parent].sub_region(octant), Some(key));
        debug_assert!(!self.regions[key].has_sub_regions());

        self.regions[parent].sub_regions[octant.slot()] = None;
        self.regions.remove(key);
        log::trace!(
            "RegionTree: pruned empty region {:?} from octant {} of {:?}",
            key,
            octant,
            parent
        );
    }

    /// Region stored under `key`
    ///
    /// # Panics
    ///
    /// Panics if the region has been freed.
    pub fn region(&self, key: RegionKey) -> &Region<K> {
        &self.regions[key]
    }

    /// Region stored under `key`, if it is still alive
    pub fn get(&self, key: RegionKey) -> Option<&Region<K>> {
        self.regions.get(key)
    }

    /// Whether `key` refers to a live region
    pub fn contains(&self, key: RegionKey) -> bool {
        self.regions.contains_key(key)
    }

    /// Number of live regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the tree holds no region at all
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterate over every live region
    pub fn iter(&self) -> impl Iterator<Item = (RegionKey, &Region<K>)> {
        self.regions.iter()
    }

    /// Iterate over every top-level region
    pub fn roots(&self) -> impl Iterator<Item = RegionKey> + '_ {
        self.regions
            .iter()
            .filter(|(_, region)| region.is_top_level())
            .map(|(key, _)| key)
    }

    /// Materialized children of `key`
    pub fn children(&self, key: RegionKey) -> impl Iterator<Item = RegionKey> + '_ {
        self.regions[key].sub_regions().map(|(_, child)| child)
    }

    /// `key` followed by each of its ancestors up to the top-level region
    pub fn ancestors(&self, key: RegionKey) -> impl Iterator<Item = RegionKey> + '_ {
        std::iter::successors(Some(key), move |current| self.regions[*current].parent)
    }

    /// Deepest region that is an ancestor of (or equal to) both `a` and `b`
    pub fn lowest_common_ancestor(&self, a: RegionKey, b: RegionKey) -> Option<RegionKey> {
        let mut a = Some(a);
        let mut b = Some(b);

        loop {
            let (a_key, b_key) = (a?, b?);
            if a_key == b_key {
                return Some(a_key);
            }

            let a_depth = self.regions[a_key].depth;
            let b_depth = self.regions[b_key].depth;
            if a_depth >= b_depth {
                a = self.regions[a_key].parent;
            }
            if b_depth >= a_depth {
                b = self.regions[b_key].parent;
            }
        }
    }

    /// Drop every region
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Walk every region and report each violated structural invariant
    pub fn validate(&self) -> TreeIntegrityReport {
        let mut report = TreeIntegrityReport::default();

        for (key, region) in &self.regions {
            report.regions_checked += 1;

            if region.node_count != region.nodes.len() {
                report.violations.push(format!(
                    "region {key:?}: node_count {} but {} nodes stored",
                    region.node_count,
                    region.nodes.len()
                ));
            }

            match (region.parent, region.parent_index) {
                (None, None) => {}
                (Some(parent_key), Some(octant)) => {
                    if region.node_count == 0 {
                        report.violations.push(format!("region {key:?}: empty but not pruned"));
                    }
                    match self.regions.get(parent_key) {
                        Some(parent) if parent.sub_region(octant) == Some(key) => {}
                        Some(_) => report.violations.push(format!(
                            "region {key:?}: parent {parent_key:?} does not link back at octant {octant}"
                        )),
                        None => report.violations.push(format!(
                            "region {key:?}: parent {parent_key:?} no longer exists"
                        )),
                    }
                }
                _ => report.violations.push(format!(
                    "region {key:?}: parent and parent index disagree"
                )),
            }

            let mut seen = HashSet::new();
            for (octant, child_key) in region.sub_regions() {
                let Some(child) = self.regions.get(child_key) else {
                    report.violations.push(format!(
                        "region {key:?}: octant {octant} points to freed region {child_key:?}"
                    ));
                    continue;
                };

                if child.parent != Some(key) || child.parent_index != Some(octant) {
                    report.violations.push(format!(
                        "region {key:?}: child {child_key:?} in octant {octant} has a mismatched back-link"
                    ));
                }
                if child.depth != region.depth + 1 {
                    report.violations.push(format!(
                        "region {key:?}: child {child_key:?} at depth {} under depth {}",
                        child.depth, region.depth
                    ));
                }
                for node in &child.nodes {
                    if !region.nodes.contains(node) {
                        report.violations.push(format!(
                            "region {key:?}: node {node:?} in child {child_key:?} missing from parent"
                        ));
                    }
                    if !seen.insert(*node) {
                        report.violations.push(format!(
                            "region {key:?}: node {node:?} stored in more than one child"
                        ));
                    }
                }
            }
        }

        report
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug> Default for RegionTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tree_with_root(size: f64) -> (RegionTree<u32>, RegionKey) {
        let mut tree = RegionTree::new();
        let root = tree.create_root(Vec3::zeros(), Vec3::repeat(size));
        (tree, root)
    }

    fn octant(index: u8) -> Octant {
        Octant::new(index).unwrap()
    }

    #[test]
    fn test_create_root() {
        let (tree, root) = tree_with_root(8.0);
        let region = tree.region(root);

        assert_eq!(region.depth(), 1);
        assert!(region.parent().is_none());
        assert!(region.parent_index().is_none());
        assert_relative_eq!(region.lower_bounds(), Vec3::repeat(-4.0));
        assert_relative_eq!(region.upper_bounds(), Vec3::repeat(4.0));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_create_sub_region_geometry() {
        let (mut tree, root) = tree_with_root(8.0);

        // Octant 1 is +X, +Y, -Z
        let child = tree.create_sub_region(root, octant(1));
        let region = tree.region(child);
        assert_relative_eq!(region.position(), Vec3::new(2.0, 2.0, -2.0));
        assert_relative_eq!(region.size(), Vec3::repeat(4.0));
        assert_eq!(region.depth(), 2);
        assert_eq!(region.parent(), Some(root));
        assert_eq!(region.parent_index(), Some(octant(1)));
        assert_eq!(tree.region(root).sub_region(octant(1)), Some(child));

        // Octant 8 is -X, -Y, +Z
        let child = tree.create_sub_region(root, octant(8));
        assert_relative_eq!(tree.region(child).position(), Vec3::new(-2.0, -2.0, 2.0));
    }

    #[test]
    fn test_every_child_contains_points_classified_into_it() {
        let (mut tree, root) = tree_with_root(2.0);
        for octant in Octant::ALL {
            let child = tree.create_sub_region(root, octant);
            let center = tree.region(child).position();
            assert_eq!(tree.sub_region_index(root, &center), octant);
            assert!(tree.region(root).contains_point(&center));
        }
    }

    #[test]
    #[should_panic(expected = "already occupied")]
    fn test_create_region_in_occupied_octant_panics() {
        let (mut tree, root) = tree_with_root(8.0);
        tree.create_sub_region(root, octant(3));
        tree.create_sub_region(root, octant(3));
    }

    #[test]
    fn test_sub_region_index_at_center() {
        let (tree, root) = tree_with_root(8.0);
        assert_eq!(tree.sub_region_index(root, &Vec3::zeros()).index(), 8);
    }

    #[test]
    fn test_create_sub_region_at_depth_is_lazy_and_reused() {
        let (mut tree, root) = tree_with_root(8.0);
        let point = Vec3::new(1.0, 1.0, 1.0);

        let leaf = tree.create_sub_region_at_depth(root, &point, 3);
        assert_eq!(tree.region(leaf).depth(), 3);
        assert!(tree.region(leaf).contains_point(&point));
        assert_eq!(tree.len(), 3);

        let again = tree.create_sub_region_at_depth(root, &point, 3);
        assert_eq!(again, leaf);
        assert_eq!(tree.len(), 3);

        assert_eq!(tree.create_sub_region_at_depth(root, &point, 1), root);
        assert_eq!(tree.find_leaf(root, &point, 3), Some(leaf));
        assert_eq!(tree.find_leaf(root, &Vec3::repeat(-1.0), 3), None);
    }

    #[test]
    fn test_add_node_updates_every_ancestor() {
        let (mut tree, root) = tree_with_root(8.0);
        let leaf = tree.create_sub_region_at_depth(root, &Vec3::new(1.0, 1.0, 1.0), 4);

        tree.add_node(leaf, 1);
        tree.add_node(leaf, 1);

        for key in tree.ancestors(leaf) {
            assert_eq!(tree.region(key).node_count(), 1);
            assert!(tree.region(key).contains_node(&1));
        }
        assert_eq!(tree.ancestors(leaf).count(), 4);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_remove_only_node_prunes_whole_branch() {
        let (mut tree, root) = tree_with_root(8.0);
        let leaf = tree.create_sub_region_at_depth(root, &Vec3::new(3.0, -3.0, 1.0), 5);
        tree.add_node(leaf, 42);
        assert_eq!(tree.len(), 5);

        tree.remove_node(leaf, 42);

        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(leaf));
        assert!(!tree.region(root).has_sub_regions());
        assert_eq!(tree.region(root).node_count(), 0);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_remove_keeps_shared_branch() {
        let (mut tree, root) = tree_with_root(8.0);
        let a = tree.create_sub_region_at_depth(root, &Vec3::new(3.0, 3.0, 3.0), 3);
        let b = tree.create_sub_region_at_depth(root, &Vec3::new(1.0, 1.0, 1.0), 3);
        assert_eq!(tree.region(a).parent(), tree.region(b).parent());
        tree.add_node(a, 1);
        tree.add_node(b, 2);

        tree.remove_node(a, 1);

        let shared = tree.region(b).parent().unwrap();
        assert!(!tree.contains(a));
        assert!(tree.contains(shared));
        assert_eq!(tree.region(shared).node_count(), 1);
        assert_eq!(tree.region(root).node_count(), 1);
        assert!(tree.validate().is_ok());
    }

    #[test]
    #[should_panic(expected = "is not stored in region")]
    fn test_remove_missing_node_panics() {
        let (mut tree, root) = tree_with_root(8.0);
        let leaf = tree.create_sub_region_at_depth(root, &Vec3::new(1.0, 1.0, 1.0), 3);
        tree.add_node(leaf, 1);
        tree.remove_node(leaf, 2);
    }

    #[test]
    fn test_move_node_touches_only_regions_below_common_ancestor() {
        let (mut tree, root) = tree_with_root(8.0);
        let from = tree.create_sub_region_at_depth(root, &Vec3::new(3.0, 3.0, 3.0), 3);
        let to = tree.create_sub_region_at_depth(root, &Vec3::new(1.0, 1.0, 1.0), 3);
        let stay = tree.create_sub_region_at_depth(root, &Vec3::new(-3.0, -3.0, -3.0), 3);
        tree.add_node(from, 1);
        tree.add_node(to, 2);
        tree.add_node(stay, 3);

        let common = tree.lowest_common_ancestor(from, to).unwrap();
        assert_eq!(tree.region(common).depth(), 2);
        let common_count = tree.region(common).node_count();
        let root_count = tree.region(root).node_count();

        tree.move_node(from, to, 1);

        assert!(!tree.contains(from));
        assert!(tree.region(to).contains_node(&1));
        assert_eq!(tree.region(to).node_count(), 2);
        assert_eq!(tree.region(common).node_count(), common_count);
        assert_eq!(tree.region(root).node_count(), root_count);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_move_node_across_octants_of_root() {
        let (mut tree, root) = tree_with_root(8.0);
        let from = tree.create_sub_region_at_depth(root, &Vec3::new(3.0, 3.0, 3.0), 3);
        let to = tree.create_sub_region_at_depth(root, &Vec3::new(-3.0, -3.0, -3.0), 3);
        tree.add_node(from, 9);

        tree.move_node(from, to, 9);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.region(root).node_count(), 1);
        assert_eq!(tree.lowest_common_ancestor(to, to), Some(to));
        assert!(tree.ancestors(to).all(|key| tree.region(key).contains_node(&9)));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_move_node_between_roots() {
        let mut tree: RegionTree<u32> = RegionTree::new();
        let west = tree.create_root(Vec3::new(-4.0, 0.0, 0.0), Vec3::repeat(8.0));
        let east = tree.create_root(Vec3::new(4.0, 0.0, 0.0), Vec3::repeat(8.0));
        let from = tree.create_sub_region_at_depth(west, &Vec3::new(-1.0, 0.5, 0.5), 3);
        let to = tree.create_sub_region_at_depth(east, &Vec3::new(1.0, 0.5, 0.5), 3);
        tree.add_node(from, 5);

        assert_eq!(tree.lowest_common_ancestor(from, to), None);
        tree.move_node(from, to, 5);

        assert_eq!(tree.region(west).node_count(), 0);
        assert!(!tree.region(west).has_sub_regions());
        assert_eq!(tree.region(east).node_count(), 1);
        assert_eq!(tree.roots().count(), 2);
        assert!(tree.validate().is_ok());

        tree.remove_root(west);
        assert_eq!(tree.roots().count(), 1);
    }

    #[test]
    #[should_panic(expected = "already in")]
    fn test_move_node_to_same_region_panics() {
        let (mut tree, root) = tree_with_root(8.0);
        let leaf = tree.create_sub_region_at_depth(root, &Vec3::new(1.0, 1.0, 1.0), 3);
        tree.add_node(leaf, 1);
        tree.move_node(leaf, leaf, 1);
    }

    #[test]
    #[should_panic(expected = "between depth")]
    fn test_move_node_between_depths_panics() {
        let (mut tree, root) = tree_with_root(8.0);
        let shallow = tree.create_sub_region_at_depth(root, &Vec3::new(1.0, 1.0, 1.0), 2);
        let deep = tree.create_sub_region_at_depth(root, &Vec3::new(-1.0, -1.0, -1.0), 3);
        tree.add_node(shallow, 1);
        tree.move_node(shallow, deep, 1);
    }

    #[test]
    #[should_panic(expected = "still holds")]
    fn test_remove_occupied_root_panics() {
        let (mut tree, root) = tree_with_root(8.0);
        let leaf = tree.create_sub_region_at_depth(root, &Vec3::new(1.0, 1.0, 1.0), 2);
        tree.add_node(leaf, 1);
        tree.remove_root(root);
    }

    #[test]
    fn test_validate_detects_count_drift() {
        let (mut tree, root) = tree_with_root(8.0);
        let leaf = tree.create_sub_region_at_depth(root, &Vec3::new(1.0, 1.0, 1.0), 2);
        tree.add_node(leaf, 1);
        tree.regions[leaf].node_count = 3;

        let report = tree.validate();
        assert!(!report.is_ok());
        assert_eq!(report.regions_checked, 2);
    }
}
