//! Region-specific debug visualization
//!
//! Turns regions of a [`RegionTree`] into wireframe boxes, nodes into points
//! and radius queries into spheres, feeding them to a [`DebugDrawSystem`].

use std::fmt;
use std::hash::Hash;

use crate::debug::draw::{DebugDrawSystem, DebugShape};
use crate::foundation::collections::RegionKey;
use crate::foundation::math::{Vec3, Vec4};
use crate::spatial::{NodeSource, RegionTree};

/// Color scheme for region visualization
#[derive(Clone, Debug)]
pub struct RegionDebugColors {
    /// Box colors by depth, cycled for trees deeper than the palette
    pub depth_palette: Vec<Vec4>,

    /// Color for node points
    pub node: Vec4,

    /// Color for radius query spheres
    pub query: Vec4,
}

impl RegionDebugColors {
    /// Box color for a region at `depth`
    pub fn for_depth(&self, depth: u32) -> Vec4 {
        if self.depth_palette.is_empty() {
            return Vec4::new(1.0, 1.0, 1.0, 1.0);
        }
        let slot = depth.saturating_sub(1) as usize % self.depth_palette.len();
        self.depth_palette[slot]
    }
}

impl Default for RegionDebugColors {
    fn default() -> Self {
        Self {
            depth_palette: vec![
                Vec4::new(1.0, 1.0, 1.0, 0.6),  // White
                Vec4::new(0.3, 0.6, 1.0, 0.5),  // Blue
                Vec4::new(0.2, 0.9, 0.4, 0.5),  // Green
                Vec4::new(1.0, 0.8, 0.2, 0.5),  // Amber
                Vec4::new(1.0, 0.4, 0.3, 0.5),  // Red
            ],
            node: Vec4::new(1.0, 0.0, 1.0, 1.0),     // Magenta
            query: Vec4::new(0.5, 0.8, 1.0, 0.15),   // Light blue, transparent
        }
    }
}

/// Debug visualizer for region trees
///
/// Shapes are temporary; a `duration` of `0.0` keeps them for one update.
pub struct RegionVisualizer {
    debug_draw: DebugDrawSystem,
    colors: RegionDebugColors,

    /// Point size used for nodes
    pub node_size: f32,
}

impl RegionVisualizer {
    /// Create a new region visualizer
    pub fn new() -> Self {
        Self {
            debug_draw: DebugDrawSystem::new(),
            colors: RegionDebugColors::default(),
            node_size: 4.0,
        }
    }

    /// Set custom color scheme
    pub fn with_colors(mut self, colors: RegionDebugColors) -> Self {
        self.colors = colors;
        self
    }

    /// Draw the bounding box of a single region
    pub fn draw_region<K>(&mut self, tree: &RegionTree<K>, key: RegionKey, duration: f32)
    where
        K: Copy + Eq + Hash + fmt::Debug,
    {
        let region = tree.region(key);
        let color = self.colors.for_depth(region.depth());
        self.debug_draw
            .draw_box(region.position(), region.size() * 0.5, color, duration);
    }

    /// Draw the bounding boxes of a region and every region below it
    pub fn draw_subtree<K>(&mut self, tree: &RegionTree<K>, key: RegionKey, duration: f32)
    where
        K: Copy + Eq + Hash + fmt::Debug,
    {
        let mut pending = vec![key];
        while let Some(current) = pending.pop() {
            self.draw_region(tree, current, duration);
            pending.extend(tree.children(current));
        }
    }

    /// Draw a point for every node stored under a region
    pub fn draw_nodes<K, S>(
        &mut self,
        tree: &RegionTree<K>,
        key: RegionKey,
        source: &S,
        duration: f32,
    ) where
        K: Copy + Eq + Hash + fmt::Debug,
        S: NodeSource<K>,
    {
        for node in tree.region(key).nodes() {
            self.debug_draw.draw_point(
                source.node_position(node),
                self.colors.node,
                self.node_size,
                duration,
            );
        }
    }

    /// Keep a sphere showing a radius query until [`clear_query`](Self::clear_query)
    pub fn draw_query(&mut self, name: &str, center: Vec3, radius: f64) {
        self.debug_draw.draw_persistent(
            format!("query_{name}"),
            DebugShape::Sphere {
                center,
                radius,
                color: self.colors.query,
                duration: f32::INFINITY,
                wireframe: true,
            },
        );
    }

    /// Draw a query sphere that expires after `duration`
    pub fn flash_query(&mut self, center: Vec3, radius: f64, duration: f32) {
        self.debug_draw
            .draw_sphere(center, radius, self.colors.query, duration);
    }

    /// Remove a query sphere
    pub fn clear_query(&mut self, name: &str) {
        self.debug_draw.clear_persistent(&format!("query_{name}"));
    }

    /// Clear all visualization
    pub fn clear(&mut self) {
        self.debug_draw.clear();
    }

    /// Update debug system (expire temporary shapes)
    pub fn update(&mut self, delta_time: f32) {
        self.debug_draw.update(delta_time);
    }

    /// Get all debug shapes for rendering
    pub fn get_shapes(&self) -> Vec<&DebugShape> {
        self.debug_draw.get_shapes()
    }

    /// Get reference to underlying debug draw system
    pub fn debug_draw(&self) -> &DebugDrawSystem {
        &self.debug_draw
    }

    /// Get mutable reference to underlying debug draw system
    pub fn debug_draw_mut(&mut self) -> &mut DebugDrawSystem {
        &mut self.debug_draw
    }
}

impl Default for RegionVisualizer {
    fn default() -> Self {
        Self::new()
    }
}
