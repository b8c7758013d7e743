//! FLIP-style transition engine for UI trees.
//!
//! This crate computes smooth visual transitions for elements whose
//! position, size or style changed between two renders of a host UI
//! tree. The host runs reconciliation passes; per pass the engine:
//!
//! 1. tracks scopes and elements in a [`tree::SpriteTree`], rebuilt
//!    incrementally as the host registers and removes nodes
//! 2. captures geometry/style snapshots at both render boundaries,
//!    through the per-element [`participant::AnimationParticipant`]
//!    state machines and the tree's own measurement slots
//! 3. classifies changes into inserted/removed/kept [`sprite::Sprite`]s
//!    per stable scope via the [`changeset::ChangesetBuilder`],
//!    far-matching identities that moved between scopes
//! 4. turns sprite deltas into per-property frame sequences with the
//!    [`behavior`] strategies and [`interpolate::generate_frames`]
//! 5. merges all keyframe providers into one globally offset
//!    [`timeline::Timeline`] handed to the host's player
//!
//! # Pass model
//!
//! Everything is single-threaded and pass-oriented: snapshot-before,
//! host mutation, snapshot-after, classify, merge, hand off. Callers
//! serialize passes; the only asynchronous edge is the play handoff,
//! observed through [`participant::AnimationHandle`]. After
//! classification consumes the removals, the driving loop must call
//! [`tree::SpriteTree::clear_freshly_removed`] exactly once.

pub mod behavior;
pub mod changeset;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod interpolate;
pub mod orchestration;
pub mod participant;
pub mod sprite;
pub mod timeline;
pub mod tree;
pub mod value;

pub use behavior::{
    Behavior, BehaviorKind, FPS, Frame, FrameOptions, Frames, SpringBehavior, SpringOptions,
    StaticBehavior, TweenBehavior, WaitBehavior, time_to_frame,
};
pub use changeset::{Changeset, ChangesetBuilder, SpriteQuery};
pub use easing::EasingFunction;
pub use error::MotionError;
pub use geometry::{Bounds, BoundsDelta, ComputedStyle, ContextAwareBounds, Snapshot, bounds_velocity};
pub use interpolate::{MotionInput, MotionTiming, generate_frames};
pub use orchestration::{
    AnimationTimeline, MotionDefinition, OrchestrationMatrix, TimelineMember,
};
pub use participant::{
    AnimationHandle, AnimationParticipant, Animator, MatchGroup, ParticipantIdentifier, PlayState,
    SlotKind, SlotState, UiSlot,
};
pub use sprite::{ElementRef, InterruptionSnapshot, Sprite, SpriteIdentifier, SpriteType};
pub use timeline::{
    KeyframeProvider, ProviderKeyframe, ProviderTiming, Timeline, TimelineKeyframe, merge,
};
pub use tree::{DescendantOptions, NodeKey, SpriteTree, TreeNode};
pub use value::{ComplexComponent, ComplexTemplate, Rgba, SimpleFrame, Value};
