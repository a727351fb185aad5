//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and geometry helpers
//! - Arena handles for regions and points
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
