//! Facade crate for the weft animation engine.
//!
//! Re-exports everything from `weft-motion`, which holds the FLIP-style
//! transition engine: the tracking tree, the per-element lifecycle state
//! machine, changeset classification, the timeline merge engine, and the
//! interpolation behaviors.

pub use weft_motion::*;
