//! Spatial partitioning data structures
//!
//! A sparse, depth-bounded octree of regions answering radius queries over
//! a dynamic set of points, plus a grid-based world index that owns the
//! top-level regions and the points themselves.

mod octant;
mod region;
mod region_tree;
mod search;
mod world_index;

pub use octant::Octant;
pub use region::Region;
pub use region_tree::{RegionTree, TreeIntegrityReport};
pub use search::{search_radius_squared, NodeSource, SpatialNode, DEFAULT_SEARCH_EPSILON};
pub use world_index::{GridCell, Neighbor, WorldIndex, WorldIndexError, MAX_CELL_COORDINATE};
