//! Geometry and style snapshots taken at render boundaries.
//!
//! The host measures its visual tree and hands the readings to the engine;
//! nothing in this crate touches layout directly. A [`Snapshot`] pairs a
//! bounding box with a captured style map, and [`ContextAwareBounds`] keeps
//! an element's box together with the box of the scope that owns it, so
//! deltas can be expressed relative to the scope rather than the viewport.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Axis-aligned bounding box in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Difference between two boxes, `other - self`.
    pub fn delta_to(&self, other: &Bounds) -> BoundsDelta {
        BoundsDelta {
            x: other.left - self.left,
            y: other.top - self.top,
            width: other.width - self.width,
            height: other.height - self.height,
        }
    }
}

/// Positional and dimensional difference between two bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundsDelta {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundsDelta {
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.width == 0.0 && self.height == 0.0
    }
}

/// An element's bounding box paired with the box of its owning scope.
///
/// Sprites store these so motions can be computed in scope-relative space,
/// which cancels out repositioning of the scope itself (scrolling, parent
/// moves).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContextAwareBounds {
    /// The element's own box.
    pub element: Bounds,
    /// The owning scope's box, captured at the same render boundary.
    pub context: Bounds,
}

impl ContextAwareBounds {
    pub fn new(element: Bounds, context: Bounds) -> Self {
        Self { element, context }
    }

    /// The element box translated into the scope's coordinate space.
    pub fn relative_to_context(&self) -> Bounds {
        Bounds {
            left: self.element.left - self.context.left,
            top: self.element.top - self.context.top,
            width: self.element.width,
            height: self.element.height,
        }
    }
}

/// Captured style map, CSS property name to serialized value.
pub type ComputedStyle = HashMap<String, String>;

/// Geometry plus style captured for one node at one render boundary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub bounds: Bounds,
    pub styles: ComputedStyle,
}

impl Snapshot {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            styles: ComputedStyle::new(),
        }
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }
}

/// Estimate per-millisecond velocity from two measurements `dt_ms` apart.
///
/// Used to seed a spring with the momentum of an interrupted animation.
pub fn bounds_velocity(previous: &Bounds, current: &Bounds, dt_ms: f64) -> BoundsDelta {
    if dt_ms == 0.0 {
        return BoundsDelta::default();
    }
    BoundsDelta {
        x: (current.left - previous.left) / dt_ms,
        y: (current.top - previous.top) / dt_ms,
        width: (current.width - previous.width) / dt_ms,
        height: (current.height - previous.height) / dt_ms,
    }
}
