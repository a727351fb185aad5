//! Debug module for visualization and debugging tools
//!
//! Region boxes, node points and query spheres are collected as shapes for
//! an external renderer. None of this is needed for correct indexing.

pub mod draw;
pub mod region_debug;

pub use draw::{DebugShape, DebugDrawSystem, DebugShapeId};
pub use region_debug::{RegionDebugColors, RegionVisualizer};
