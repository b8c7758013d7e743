//! Classified per-element transitions.
//!
//! A [`Sprite`] is the output of one reconciliation pass for one element:
//! which way it changed (inserted, removed, kept) plus its geometry and
//! style at both render boundaries. A kept sprite that conceptually moved
//! between two scopes carries the far side as its `counterpart`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::{Bounds, BoundsDelta, ComputedStyle, ContextAwareBounds};

/// How an element changed between two renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpriteType {
    Inserted,
    Removed,
    Kept,
}

/// Stable identity of an element across renders, independent of the
/// underlying host node. Equality is by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpriteIdentifier {
    pub id: Option<String>,
    pub role: Option<String>,
}

impl SpriteIdentifier {
    pub fn new(id: Option<String>, role: Option<String>) -> Self {
        Self { id, role }
    }
}

impl fmt::Display for SpriteIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id:{};role:{}",
            self.id.as_deref().unwrap_or("null"),
            self.role.as_deref().unwrap_or("null")
        )
    }
}

/// A tracked element as the host hands it to the engine: the host node it
/// currently lives on plus its declared identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementRef {
    /// Host node id.
    pub node: String,
    pub id: Option<String>,
    pub role: Option<String>,
}

impl ElementRef {
    pub fn new(node: impl Into<String>, id: Option<&str>, role: Option<&str>) -> Self {
        Self {
            node: node.into(),
            id: id.map(str::to_string),
            role: role.map(str::to_string),
        }
    }

    pub fn identifier(&self) -> SpriteIdentifier {
        SpriteIdentifier::new(self.id.clone(), self.role.clone())
    }

    /// The identity-string key used for interruption-record lookups.
    pub fn identity_key(&self) -> String {
        self.identifier().to_string()
    }
}

/// Mid-flight geometry and style captured when a running animation was
/// preempted by a new pass, keyed by identity string on the host side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InterruptionSnapshot {
    pub bounds: Bounds,
    pub styles: ComputedStyle,
    /// Momentum at the moment of interruption, value units per ms.
    pub velocity: BoundsDelta,
}

/// One classified transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    /// Host node this sprite animates.
    pub node: String,
    pub identifier: SpriteIdentifier,
    pub kind: SpriteType,
    pub initial_bounds: Option<ContextAwareBounds>,
    pub final_bounds: Option<ContextAwareBounds>,
    pub initial_computed_style: Option<ComputedStyle>,
    pub final_computed_style: Option<ComputedStyle>,
    /// The paired opposite-role sprite when one logical element moved
    /// between two scopes, or when an interruption synthesized the far
    /// side.
    pub counterpart: Option<Box<Sprite>>,
}

impl Sprite {
    pub fn new(node: impl Into<String>, identifier: SpriteIdentifier, kind: SpriteType) -> Self {
        Self {
            node: node.into(),
            identifier,
            kind,
            initial_bounds: None,
            final_bounds: None,
            initial_computed_style: None,
            final_computed_style: None,
            counterpart: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.identifier.id.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.identifier.role.as_deref()
    }

    /// Scope-relative movement between the two render boundaries.
    /// `None` unless both boundaries were captured.
    pub fn bounds_delta(&self) -> Option<BoundsDelta> {
        let initial = self.initial_bounds?.relative_to_context();
        let end = self.final_bounds?.relative_to_context();
        Some(initial.delta_to(&end))
    }

    /// Style value at the before-render boundary.
    pub fn initial_style(&self, property: &str) -> Option<&str> {
        self.initial_computed_style
            .as_ref()
            .and_then(|styles| styles.get(property))
            .map(String::as_str)
    }

    /// Style value at the after-render boundary.
    pub fn final_style(&self, property: &str) -> Option<&str> {
        self.final_computed_style
            .as_ref()
            .and_then(|styles| styles.get(property))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;

    #[test]
    fn test_identifier_equality_and_key() {
        let a = SpriteIdentifier::new(Some("card".into()), Some("source".into()));
        let b = SpriteIdentifier::new(Some("card".into()), Some("source".into()));
        let c = SpriteIdentifier::new(Some("card".into()), None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "id:card;role:source");
        assert_eq!(c.to_string(), "id:card;role:null");
    }

    #[test]
    fn test_bounds_delta_is_scope_relative() {
        let mut sprite = Sprite::new(
            "node-1",
            SpriteIdentifier::new(Some("a".into()), None),
            SpriteType::Kept,
        );
        // Element moved 30 to the right, but the scope moved 30 as well
        sprite.initial_bounds = Some(ContextAwareBounds::new(
            Bounds::new(10.0, 0.0, 10.0, 10.0),
            Bounds::new(0.0, 0.0, 100.0, 100.0),
        ));
        sprite.final_bounds = Some(ContextAwareBounds::new(
            Bounds::new(40.0, 0.0, 10.0, 10.0),
            Bounds::new(30.0, 0.0, 100.0, 100.0),
        ));
        let delta = sprite.bounds_delta().unwrap();
        assert!(delta.is_zero());
    }

    #[test]
    fn test_bounds_delta_requires_both_boundaries() {
        let sprite = Sprite::new(
            "node-1",
            SpriteIdentifier::default(),
            SpriteType::Inserted,
        );
        assert!(sprite.bounds_delta().is_none());
    }

    #[test]
    fn test_element_ref_identity_key() {
        let element = ElementRef::new("node-7", Some("card"), None);
        assert_eq!(element.identity_key(), "id:card;role:null");
    }
}
