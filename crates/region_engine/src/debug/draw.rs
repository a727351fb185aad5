//! Debug drawing primitives and system
//!
//! Collects simple wireframe shapes (spheres, boxes, points) for an
//! external renderer to display. Nothing here draws by itself.

use crate::foundation::math::{Vec3, Vec4};
use std::collections::HashMap;

/// Unique identifier for persistent debug shapes
pub type DebugShapeId = String;

/// Debug shape primitives that can be rendered for visualization
#[derive(Clone, Debug, PartialEq)]
pub enum DebugShape {
    /// Sphere at center with radius
    Sphere {
        /// Sphere center
        center: Vec3,
        /// Sphere radius
        radius: f64,
        /// RGBA color
        color: Vec4,
        /// Remaining lifetime in seconds
        duration: f32,
        /// Draw outline only
        wireframe: bool,
    },

    /// Axis-aligned box at center with half-extents
    Box {
        /// Box center
        center: Vec3,
        /// Half size along each axis
        extents: Vec3,
        /// RGBA color
        color: Vec4,
        /// Remaining lifetime in seconds
        duration: f32,
        /// Draw outline only
        wireframe: bool,
    },

    /// Point at position
    Point {
        /// Point location
        position: Vec3,
        /// RGBA color
        color: Vec4,
        /// Point size in pixels
        size: f32,
        /// Remaining lifetime in seconds
        duration: f32,
    },
}

impl DebugShape {
    /// Get remaining duration
    pub fn duration(&self) -> f32 {
        match self {
            DebugShape::Sphere { duration, .. }
            | DebugShape::Box { duration, .. }
            | DebugShape::Point { duration, .. } => *duration,
        }
    }

    /// Set duration (returns modified shape)
    pub fn with_duration(mut self, new_duration: f32) -> Self {
        *self.duration_mut() = new_duration;
        self
    }

    /// Decrease duration by delta_time, returns true if expired
    pub fn tick(&mut self, delta_time: f32) -> bool {
        let duration = self.duration_mut();
        *duration -= delta_time;
        *duration <= 0.0
    }

    fn duration_mut(&mut self) -> &mut f32 {
        match self {
            DebugShape::Sphere { duration, .. }
            | DebugShape::Box { duration, .. }
            | DebugShape::Point { duration, .. } => duration,
        }
    }
}

/// Debug drawing system collecting shapes for rendering
///
/// Temporary shapes expire after their duration; persistent shapes remain
/// until explicitly removed.
pub struct DebugDrawSystem {
    /// Temporary shapes that expire after their duration
    temporary_shapes: Vec<DebugShape>,

    /// Persistent shapes that remain until manually removed
    persistent_shapes: HashMap<DebugShapeId, DebugShape>,

    /// Master enable/disable flag
    pub enabled: bool,
}

impl DebugDrawSystem {
    /// Create a new debug draw system
    pub fn new() -> Self {
        Self {
            temporary_shapes: Vec::new(),
            persistent_shapes: HashMap::new(),
            enabled: true,
        }
    }

    /// Draw a sphere (temporary)
    pub fn draw_sphere(&mut self, center: Vec3, radius: f64, color: Vec4, duration: f32) {
        if !self.enabled {
            return;
        }

        self.temporary_shapes.push(DebugShape::Sphere {
            center,
            radius,
            color,
            duration,
            wireframe: true,
        });
    }

    /// Draw a box (temporary)
    pub fn draw_box(&mut self, center: Vec3, extents: Vec3, color: Vec4, duration: f32) {
        if !self.enabled {
            return;
        }

        self.temporary_shapes.push(DebugShape::Box {
            center,
            extents,
            color,
            duration,
            wireframe: true,
        });
    }

    /// Draw a point (temporary)
    pub fn draw_point(&mut self, position: Vec3, color: Vec4, size: f32, duration: f32) {
        if !self.enabled {
            return;
        }

        self.temporary_shapes.push(DebugShape::Point {
            position,
            color,
            size,
            duration,
        });
    }

    /// Draw a persistent shape that remains until explicitly removed
    pub fn draw_persistent(&mut self, id: impl Into<String>, shape: DebugShape) {
        if !self.enabled {
            return;
        }

        self.persistent_shapes.insert(id.into(), shape);
    }

    /// Remove a persistent shape
    pub fn clear_persistent(&mut self, id: &str) {
        self.persistent_shapes.remove(id);
    }

    /// Update shape lifetimes and remove expired temporary shapes
    pub fn update(&mut self, delta_time: f32) {
        if !self.enabled {
            return;
        }

        self.temporary_shapes.retain_mut(|shape| !shape.tick(delta_time));
    }

    /// Get all shapes for rendering (both temporary and persistent)
    pub fn get_shapes(&self) -> Vec<&DebugShape> {
        if !self.enabled {
            return Vec::new();
        }

        self.temporary_shapes
            .iter()
            .chain(self.persistent_shapes.values())
            .collect()
    }

    /// Get the number of active shapes
    pub fn shape_count(&self) -> usize {
        self.temporary_shapes.len() + self.persistent_shapes.len()
    }

    /// Clear all shapes (temporary and persistent)
    pub fn clear(&mut self) {
        self.temporary_shapes.clear();
        self.persistent_shapes.clear();
    }
}

impl Default for DebugDrawSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_shape_expiration() {
        let mut system = DebugDrawSystem::new();

        system.draw_box(
            Vec3::zeros(),
            Vec3::repeat(1.0),
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            1.0,
        );

        assert_eq!(system.shape_count(), 1);

        system.update(0.5);
        assert_eq!(system.shape_count(), 1);

        // 1.1 seconds in total
        system.update(0.6);
        assert_eq!(system.shape_count(), 0);
    }

    #[test]
    fn test_persistent_shapes() {
        let mut system = DebugDrawSystem::new();

        system.draw_persistent(
            "query",
            DebugShape::Sphere {
                center: Vec3::zeros(),
                radius: 1.0,
                color: Vec4::new(1.0, 0.0, 0.0, 1.0),
                duration: f32::INFINITY,
                wireframe: true,
            },
        );

        for _ in 0..100 {
            system.update(1.0);
        }
        assert_eq!(system.shape_count(), 1);

        system.clear_persistent("query");
        assert_eq!(system.shape_count(), 0);
    }

    #[test]
    fn test_disabled_system_ignores_shapes() {
        let mut system = DebugDrawSystem::new();
        system.enabled = false;
        system.draw_point(Vec3::zeros(), Vec4::new(1.0, 1.0, 1.0, 1.0), 2.0, 1.0);
        assert_eq!(system.shape_count(), 0);
        assert!(system.get_shapes().is_empty());
    }

    #[test]
    fn test_with_duration() {
        let shape = DebugShape::Point {
            position: Vec3::zeros(),
            color: Vec4::new(0.0, 1.0, 0.0, 1.0),
            size: 2.0,
            duration: 0.0,
        }
        .with_duration(3.0);
        assert!((shape.duration() - 3.0).abs() < f32::EPSILON);
    }
}
