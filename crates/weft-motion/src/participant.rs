//! Per-element lifecycle state machine.
//!
//! An [`AnimationParticipant`] follows one identity across renders through
//! two independent slots: `current` (the attached node) and `detached`
//! (a node removed this pass, kept around until its exit animation is
//! done). Each slot is a two-state machine, BEFORE_RENDER to AFTER_RENDER,
//! holding the snapshots captured at the render boundaries plus a handle
//! to any in-flight animation.
//!
//! Participants are owned by an external per-element registry; the engine
//! only defines their behavior. The accessors [`AnimationParticipant::
//! as_animator`] and [`AnimationParticipant::as_sprite`] never panic on
//! missing data: `None` means there is nothing to animate this pass.

use std::fmt;

use crate::geometry::{Bounds, ContextAwareBounds, Snapshot};
use crate::sprite::{ElementRef, Sprite, SpriteType};
use crate::tree::SpriteTree;

/// Play state reported by an animation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Running,
    Finished,
    Cancelled,
}

/// Handle onto an animation started by the host's player.
///
/// The play handoff is the only asynchronous edge of the engine; a later
/// pass queries the handle to decide whether to let the animation finish,
/// interrupt it, or ignore it.
pub trait AnimationHandle: fmt::Debug {
    fn play_state(&self) -> PlayState;
    fn cancel(&mut self);
}

/// Capture stage of one slot.
#[derive(Debug)]
pub enum SlotState {
    /// Only the before-render snapshot (if any) has been taken.
    BeforeRender { before: Option<Snapshot> },
    /// Both render boundaries have been captured.
    AfterRender {
        before: Option<Snapshot>,
        after: Snapshot,
    },
}

/// One slot of a participant's UI state.
#[derive(Debug)]
pub struct UiSlot {
    /// Host node this slot refers to.
    pub node: String,
    pub state: SlotState,
    pub animation: Option<Box<dyn AnimationHandle>>,
}

impl UiSlot {
    fn new(node: String) -> Self {
        Self {
            node,
            state: SlotState::BeforeRender { before: None },
            animation: None,
        }
    }

    pub fn before_snapshot(&self) -> Option<&Snapshot> {
        match &self.state {
            SlotState::BeforeRender { before } => before.as_ref(),
            SlotState::AfterRender { before, .. } => before.as_ref(),
        }
    }

    pub fn after_snapshot(&self) -> Option<&Snapshot> {
        match &self.state {
            SlotState::BeforeRender { .. } => None,
            SlotState::AfterRender { after, .. } => Some(after),
        }
    }

    /// True when no animation is attached or the attached one stopped.
    fn animation_is_done(&self) -> bool {
        match &self.animation {
            None => true,
            Some(handle) => handle.play_state() != PlayState::Running,
        }
    }
}

/// Which slot an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Current,
    Detached,
}

/// Stable identity of a participant: the identity-string key (when the
/// tracked thing is an element) and the host node it currently occupies.
#[derive(Debug, Clone, Default)]
pub struct ParticipantIdentifier {
    pub key: Option<String>,
    pub node: Option<String>,
}

/// The per-pass matches routed to one participant: what was inserted or
/// removed under its identity this render.
#[derive(Debug, Clone, Default)]
pub struct MatchGroup {
    pub inserted_element: Option<ElementRef>,
    pub removed_element: Option<ElementRef>,
    pub inserted_scope: Option<String>,
    pub removed_scope: Option<String>,
}

/// A stable scope's before/after pair for one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    pub scope: String,
    pub from: Snapshot,
    pub to: Snapshot,
}

/// Lifecycle state machine for one tracked identity.
#[derive(Debug)]
pub struct AnimationParticipant {
    pub identifier: ParticipantIdentifier,
    scope: Option<String>,
    latest_element: Option<ElementRef>,
    pub current: Option<UiSlot>,
    pub detached: Option<UiSlot>,
}

impl AnimationParticipant {
    /// # Panics
    /// Panics when neither an element nor a scope is supplied.
    pub fn new(node: impl Into<String>, element: Option<ElementRef>, scope: Option<String>) -> Self {
        assert!(
            element.is_some() || scope.is_some(),
            "an animation participant needs an element or a scope"
        );
        let node = node.into();
        Self {
            identifier: ParticipantIdentifier {
                key: element.as_ref().map(ElementRef::identity_key),
                node: Some(node.clone()),
            },
            scope,
            latest_element: element,
            current: Some(UiSlot::new(node)),
            detached: None,
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn element(&self) -> Option<&ElementRef> {
        self.latest_element.as_ref()
    }

    fn is_element(&self) -> bool {
        self.latest_element.is_some()
    }

    fn is_removed(&self) -> bool {
        self.detached.is_some() && self.current.is_none()
    }

    /// A participant whose exit animation finished, or that tracks
    /// neither an element nor a scope anymore, can be dropped from the
    /// registry.
    pub fn can_be_cleaned_up(&self) -> bool {
        (self.is_removed()
            && self
                .detached
                .as_ref()
                .is_some_and(UiSlot::animation_is_done))
            || (!self.is_element() && self.scope.is_none())
    }

    /// Reset the current slot's snapshots after an interruption consumed
    /// them.
    pub fn clear_snapshots(&mut self) {
        if let Some(slot) = &mut self.current {
            slot.state = SlotState::BeforeRender { before: None };
        }
    }

    /// Capture the before-render boundary into both slots. `measure`
    /// returns the host's reading for a node, or `None` when the node
    /// cannot be measured; an unmeasurable detached node keeps its
    /// previous capture.
    pub fn snapshot_before_render(&mut self, mut measure: impl FnMut(&str) -> Option<Snapshot>) {
        if let Some(slot) = &mut self.current {
            slot.state = SlotState::BeforeRender {
                before: measure(&slot.node),
            };
        }
        if let Some(slot) = &mut self.detached {
            let retained = slot.before_snapshot().cloned();
            slot.state = SlotState::BeforeRender {
                before: measure(&slot.node).or(retained),
            };
        }
    }

    /// Cancel in-flight animations on both slots. Runs after all
    /// before-render measurements so cancellation cannot disturb them.
    pub fn cancel_animations(&mut self) {
        if let Some(slot) = &mut self.current
            && let Some(animation) = &mut slot.animation
        {
            animation.cancel();
        }
        if let Some(slot) = &mut self.detached
            && let Some(animation) = &mut slot.animation
        {
            animation.cancel();
        }
    }

    /// Capture the after-render boundary into the attached slot.
    ///
    /// # Panics
    /// Panics when the current slot was already captured this pass or
    /// when the attached node cannot be measured; both are pass-ordering
    /// violations by the caller.
    pub fn snapshot_after_render(&mut self, mut measure: impl FnMut(&str) -> Option<Snapshot>) {
        if let Some(slot) = &mut self.current {
            let before = match &slot.state {
                SlotState::BeforeRender { before } => before.clone(),
                SlotState::AfterRender { .. } => {
                    panic!("after-render capture on an already captured slot")
                }
            };
            let after = measure(&slot.node)
                .expect("attached node must be measurable at the after-render boundary");
            slot.state = SlotState::AfterRender { before, after };
        }
    }

    /// Record the handle of an animation the host started on a slot.
    pub fn set_animation(&mut self, slot: SlotKind, handle: Box<dyn AnimationHandle>) {
        let target = match slot {
            SlotKind::Current => self.current.as_mut(),
            SlotKind::Detached => self.detached.as_mut(),
        };
        if let Some(target) = target {
            target.animation = Some(handle);
        }
    }

    /// Drop the detached slot once its animation is done. Returns whether
    /// it was dropped.
    pub fn prune_detached(&mut self) -> bool {
        if self
            .detached
            .as_ref()
            .is_some_and(UiSlot::animation_is_done)
        {
            self.detached = None;
            true
        } else {
            false
        }
    }

    /// Apply this pass's insertions and removals to the slot machine.
    ///
    /// Declaring the element removed promotes `current` into `detached`,
    /// discarding any in-flight animation on the new detached slot (it
    /// must restart from the preserved before-render snapshot).
    ///
    /// # Panics
    /// Panics on contract violations: an insertion matching a live
    /// element without a removal, a removal of an already removed
    /// element, or a promotion without a before-render snapshot.
    pub fn handle_matches(&mut self, matches: MatchGroup) {
        let MatchGroup {
            inserted_element,
            removed_element,
            inserted_scope,
            removed_scope,
        } = matches;

        // A scope that is also an element and sits in a counterpart
        // situation replaces its scope reference with the inserted one.
        if removed_scope.is_some() && inserted_scope.is_some() {
            self.scope = inserted_scope;
        } else if let Some(scope) = inserted_scope {
            assert!(
                inserted_element.is_some(),
                "matched an inserted scope without an inserted element"
            );
            self.scope = Some(scope);
        } else if removed_scope.is_some() {
            self.scope = None;
            if removed_element.is_none() {
                assert!(
                    self.latest_element.is_none(),
                    "removed a scope without removing an element, despite the scope having been an element"
                );
                self.identifier.node = None;
                return;
            }
        }

        if let Some(removed) = &removed_element {
            assert!(
                self.current
                    .as_ref()
                    .is_some_and(|slot| slot.node == removed.node),
                "removed element does not match the current slot"
            );
        }

        if self.current.is_some() {
            match (&inserted_element, &removed_element) {
                (Some(inserted), Some(_)) => {
                    let current = self.current.take().expect("current slot present");
                    self.detached = Some(Self::current_to_detached(current));
                    self.current = Some(UiSlot::new(inserted.node.clone()));
                    self.latest_element = Some(inserted.clone());
                }
                (None, Some(removed)) => {
                    let current = self.current.take().expect("current slot present");
                    self.detached = Some(Self::current_to_detached(current));
                    self.latest_element = Some(removed.clone());
                }
                (Some(_), None) => {
                    panic!("invalid insertion that matches an existing element without a removal")
                }
                (None, None) => {}
            }
        } else if self.detached.is_some() {
            assert!(
                removed_element.is_none(),
                "invalid removal of an already removed element"
            );
            if let Some(inserted) = &inserted_element {
                self.current = Some(UiSlot::new(inserted.node.clone()));
                self.latest_element = Some(inserted.clone());
            }
        } else {
            panic!("invalid participant with no current or detached state while matching");
        }

        if let Some(inserted) = &inserted_element {
            self.identifier.node = Some(inserted.node.clone());
        } else if removed_element.is_some() {
            self.identifier.node = None;
        }
    }

    fn current_to_detached(slot: UiSlot) -> UiSlot {
        let before = match slot.state {
            SlotState::BeforeRender {
                before: Some(before),
            } => before,
            _ => panic!("attempted to detach a slot without a before-render snapshot"),
        };
        UiSlot {
            node: slot.node,
            state: SlotState::BeforeRender {
                before: Some(before),
            },
            // An interrupted animation must restart against the new
            // counterpart; the old handle is dropped.
            animation: None,
        }
    }

    /// The generic before/after pair for a scope participant. `None`
    /// unless the scope exists, is stable, and both boundaries were
    /// captured. Unstable scopes are flagged to become stable next pass.
    pub fn as_animator(&mut self, tree: &mut SpriteTree) -> Option<Animator> {
        let scope_id = self.scope.clone()?;
        if !tree.is_stable(&scope_id) {
            tree.mark_initial_render_completed(&scope_id);
            return None;
        }
        let slot = self.current.as_ref()?;
        match &slot.state {
            SlotState::AfterRender {
                before: Some(before),
                after,
            } => Some(Animator {
                scope: scope_id,
                from: before.clone(),
                to: after.clone(),
            }),
            _ => None,
        }
    }

    /// Classify this pass's captures into a sprite. `None` when neither
    /// pairing resolves.
    pub fn as_sprite(&self) -> Option<Sprite> {
        let element = self.latest_element.as_ref()?;
        let identifier = element.identifier();

        match (&self.current, &self.detached) {
            (Some(current), Some(detached)) => {
                let after = current.after_snapshot()?;
                let detached_before = detached.before_snapshot()?;
                let initial = current.before_snapshot().unwrap_or(detached_before);

                let mut sprite = Sprite::new(current.node.clone(), identifier.clone(), SpriteType::Kept);
                apply_initial(&mut sprite, initial);
                apply_final(&mut sprite, after);

                // The counterpart starts from its own detached position.
                let mut counterpart =
                    Sprite::new(detached.node.clone(), identifier, SpriteType::Removed);
                apply_initial(&mut counterpart, detached_before);
                apply_final(&mut counterpart, after);
                sprite.counterpart = Some(Box::new(counterpart));
                Some(sprite)
            }
            (Some(current), None) => match (current.before_snapshot(), current.after_snapshot()) {
                (Some(before), Some(after)) => {
                    let mut sprite =
                        Sprite::new(current.node.clone(), identifier, SpriteType::Kept);
                    apply_initial(&mut sprite, before);
                    apply_final(&mut sprite, after);
                    Some(sprite)
                }
                (None, Some(after)) => {
                    let mut sprite =
                        Sprite::new(current.node.clone(), identifier, SpriteType::Inserted);
                    apply_final(&mut sprite, after);
                    Some(sprite)
                }
                _ => None,
            },
            (None, Some(detached)) => {
                let before = detached.before_snapshot()?;
                let mut sprite =
                    Sprite::new(detached.node.clone(), identifier, SpriteType::Removed);
                apply_initial(&mut sprite, before);
                Some(sprite)
            }
            (None, None) => None,
        }
    }
}

/// Scope-relative attribution happens later in the changeset builder;
/// at this level bounds are recorded against a zero context.
fn apply_initial(sprite: &mut Sprite, snapshot: &Snapshot) {
    sprite.initial_bounds = Some(ContextAwareBounds::new(snapshot.bounds, Bounds::default()));
    sprite.initial_computed_style = Some(snapshot.styles.clone());
}

fn apply_final(sprite: &mut Sprite, snapshot: &Snapshot) {
    sprite.final_bounds = Some(ContextAwareBounds::new(snapshot.bounds, Bounds::default()));
    sprite.final_computed_style = Some(snapshot.styles.clone());
}
