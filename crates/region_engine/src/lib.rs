//! # Region Engine
//!
//! A sparse, depth-bounded octree for proximity queries over a dynamic set
//! of 3D points.
//!
//! ## Features
//!
//! - **Sparse Regions**: Subregions are materialized only while they hold points
//! - **Aggregate Membership**: Every region knows the points in its subtree
//! - **Cheap Moves**: Relocations touch only regions below the common ancestor
//! - **Radius Queries**: Conservative pruning with exact leaf checks
//! - **World Index**: Grid of top-level regions owning point identities
//! - **Debug Drawing**: Wireframe output of region subtrees and queries
//!
//! ## Quick Start
//!
//! ```rust
//! use region_engine::prelude::*;
//!
//! fn main() -> Result<(), WorldIndexError> {
//!     let mut index = WorldIndex::new(WorldIndexConfig::new(32.0).with_max_depth(4))?;
//!
//!     let ship = index.insert(Vec3::new(1.0, 1.0, 1.0), "ship")?;
//!     index.insert(Vec3::new(-20.0, 3.0, 0.0), "asteroid")?;
//!
//!     let hits = index.query_radius(Vec3::new(0.0, 0.0, 0.0), 5.0)?;
//!     assert_eq!(hits.len(), 1);
//!     assert_eq!(hits[0].id, ship);
//!
//!     index.move_point(ship, Vec3::new(-18.0, 3.0, 0.0))?;
//!     assert!(index.query_radius(Vec3::new(0.0, 0.0, 0.0), 5.0)?.is_empty());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod spatial;
pub mod debug;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, WorldIndexConfig},
        foundation::{
            collections::{PointId, RegionKey},
            math::Vec3,
        },
        spatial::{
            GridCell, Neighbor, NodeSource, Octant, Region, RegionTree, SpatialNode,
            WorldIndex, WorldIndexError,
        },
    };
}
