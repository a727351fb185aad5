//! Bounded-radius neighbor search over a [`RegionTree`]
//!
//! The tree only stores node identities. Positions and payloads are resolved
//! through a [`NodeSource`] when a query reaches its leaf depth, so callers
//! keep ownership of their point data.

use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::foundation::collections::RegionKey;
use crate::foundation::math::{distance_squared, Vec3, HALF_UNIT_DIAGONAL};
use crate::spatial::RegionTree;

/// Default slack added to the squared pruning bound
pub const DEFAULT_SEARCH_EPSILON: f64 = 1e-6;

/// Squared distance from a region's center beyond which the region cannot
/// hold any point within `radius` of the query point
///
/// `diameter` is the region's edge length. The bound is the query radius
/// grown by half the region's space diagonal, squared, plus `epsilon` so
/// that points sitting exactly on the bound survive rounding.
pub fn search_radius_squared(radius: f64, diameter: f64, epsilon: f64) -> f64 {
    let reach = radius + HALF_UNIT_DIAGONAL * diameter;
    reach * reach + epsilon
}

/// A point-like value that can be indexed by a [`RegionTree`]
pub trait SpatialNode {
    /// Object handed back by radius queries
    type Payload;

    /// Current position
    fn position(&self) -> Vec3;

    /// Object associated with this node
    fn payload(&self) -> Self::Payload;
}

/// Resolves node identities stored in a tree to positions and payloads
pub trait NodeSource<K> {
    /// Object handed back by radius queries
    type Payload;

    /// Current position of `node`
    fn node_position(&self, node: K) -> Vec3;

    /// Object associated with `node`
    fn node_payload(&self, node: K) -> Self::Payload;
}

impl<K, N, S> NodeSource<K> for HashMap<K, N, S>
where
    K: Eq + Hash,
    N: SpatialNode,
    S: BuildHasher,
{
    type Payload = N::Payload;

    fn node_position(&self, node: K) -> Vec3 {
        self[&node].position()
    }

    fn node_payload(&self, node: K) -> Self::Payload {
        self[&node].payload()
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug> RegionTree<K> {
    /// Collect every node under `region` within `radius` of `point`
    ///
    /// Children whose center is too far for any of their contents to be in
    /// range are skipped wholesale. Regions at `max_depth` have their nodes
    /// tested exactly; matching payloads and squared distances are appended
    /// pairwise to `out_objects` and `out_distances2`. Results come out in
    /// no particular order.
    pub fn neighbors_within_radius<S: NodeSource<K>>(
        &self,
        region: RegionKey,
        radius: f64,
        point: &Vec3,
        source: &S,
        out_objects: &mut Vec<S::Payload>,
        out_distances2: &mut Vec<f64>,
        max_depth: u32,
    ) {
        let radius_squared = radius * radius;

        for child_key in self.children(region) {
            let child = self.region(child_key);

            let center_distance2 = distance_squared(point, &child.position());
            let bound = search_radius_squared(radius, child.size().max(), self.search_epsilon);
            if center_distance2 > bound {
                continue;
            }

            if child.depth() >= max_depth {
                for node in child.nodes() {
                    let distance2 = distance_squared(point, &source.node_position(node));
                    if distance2 <= radius_squared {
                        out_objects.push(source.node_payload(node));
                        out_distances2.push(distance2);
                    }
                }
            } else {
                self.neighbors_within_radius(
                    child_key,
                    radius,
                    point,
                    source,
                    out_objects,
                    out_distances2,
                    max_depth,
                );
            }
        }
    }
}
