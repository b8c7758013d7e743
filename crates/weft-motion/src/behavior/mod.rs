//! Frame-producing interpolation behaviors.
//!
//! A [`Behavior`] turns a from/to pair plus timing into a finite sequence
//! of [`Frame`]s sampled at the engine frame rate. Each call to
//! [`Behavior::get_frames`] returns a fresh, non-restartable iterator.
//!
//! Variants:
//! - [`TweenBehavior`]: eased sampling over a fixed duration
//! - [`SpringBehavior`]: damped harmonic oscillator, frame count depends
//!   on convergence
//! - [`StaticBehavior`]: holds a constant value for a duration
//! - [`WaitBehavior`]: value-less frames that only shift timing

mod hold;
mod spring;
mod tween;

pub use hold::{StaticBehavior, WaitBehavior};
pub use spring::{SpringBehavior, SpringOptions};
pub use tween::TweenBehavior;

use std::fmt;

/// Engine sampling rate in frames per millisecond (60 fps).
pub const FPS: f64 = 60.0 / 1000.0;

/// Number of whole frames covering `duration_ms` at the engine rate.
pub fn time_to_frame(duration_ms: f64) -> usize {
    (duration_ms * FPS).round().max(0.0) as usize
}

/// A single sampled frame.
///
/// `value` is absent for timing-only frames (wait behaviors).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub value: Option<f64>,
    pub velocity: f64,
}

impl Frame {
    pub fn new(value: f64, velocity: f64) -> Self {
        Self {
            value: Some(value),
            velocity,
        }
    }

    pub fn empty() -> Self {
        Self {
            value: None,
            velocity: 0.0,
        }
    }
}

/// Inputs to frame generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOptions {
    pub from: f64,
    pub to: f64,
    /// Required by duration-driven behaviors; ignored by springs.
    pub duration_ms: Option<f64>,
    /// Hold frames emitted before movement starts.
    pub delay_ms: f64,
    /// Initial velocity, in value units per millisecond.
    pub velocity: f64,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            from: 0.0,
            to: 1.0,
            duration_ms: None,
            delay_ms: 0.0,
            velocity: 0.0,
        }
    }
}

/// Discriminates behaviors where generation rules differ by family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorKind {
    Tween,
    Spring,
    Static,
    Wait,
}

/// Boxed finite frame sequence.
pub type Frames = Box<dyn Iterator<Item = Frame>>;

/// A frame-producing interpolation strategy.
pub trait Behavior: fmt::Debug {
    fn kind(&self) -> BehaviorKind;

    /// Whether the final frame keeps applying after the sequence ends.
    /// Non-filling behaviors drop out of the merged timeline once done.
    fn fill(&self) -> bool {
        true
    }

    /// Produce a fresh frame sequence. The iterator is finite and must
    /// not be reused across invocations.
    fn get_frames(&self, options: &FrameOptions) -> Frames;
}

/// Leading hold frames covering a delay.
pub(crate) fn delay_frames(options: &FrameOptions) -> impl Iterator<Item = Frame> + use<> {
    let count = time_to_frame(options.delay_ms);
    let from = options.from;
    (0..count).map(move |_| Frame::new(from, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_to_frame() {
        assert_eq!(time_to_frame(0.0), 0);
        assert_eq!(time_to_frame(100.0), 6);
        assert_eq!(time_to_frame(1000.0), 60);
        assert_eq!(time_to_frame(-5.0), 0);
    }

    #[test]
    fn test_frame_constructors() {
        let frame = Frame::new(0.5, 0.01);
        assert_eq!(frame.value, Some(0.5));
        let empty = Frame::empty();
        assert_eq!(empty.value, None);
        assert_eq!(empty.velocity, 0.0);
    }
}
