//! Behaviors that occupy time without interpolating.

use super::{Behavior, BehaviorKind, Frame, FrameOptions, Frames, time_to_frame};

/// Holds a constant value for the configured duration.
///
/// Does not fill: once its frames run out the held property drops back
/// out of the merged timeline instead of sticking around.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StaticBehavior;

impl Behavior for StaticBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Static
    }

    fn fill(&self) -> bool {
        false
    }

    fn get_frames(&self, options: &FrameOptions) -> Frames {
        let count = frame_count(options);
        let value = options.from;
        Box::new((0..count).map(move |_| Frame::new(value, 0.0)))
    }
}

/// Emits value-less frames, shifting the timing of whatever follows in a
/// sequence without touching any property.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WaitBehavior;

impl Behavior for WaitBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Wait
    }

    fn fill(&self) -> bool {
        false
    }

    fn get_frames(&self, options: &FrameOptions) -> Frames {
        let count = frame_count(options);
        Box::new((0..count).map(|_| Frame::empty()))
    }
}

/// Frame count matching what a tween produces for the same timing, so
/// behaviors running side by side in one motion stay in lockstep.
fn frame_count(options: &FrameOptions) -> usize {
    time_to_frame(options.delay_ms) + time_to_frame(options.duration_ms.unwrap_or(0.0)) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_holds_value() {
        let frames: Vec<Frame> = StaticBehavior
            .get_frames(&FrameOptions {
                from: 42.0,
                duration_ms: Some(100.0),
                ..Default::default()
            })
            .collect();
        assert_eq!(frames.len(), 7);
        assert!(frames.iter().all(|f| f.value == Some(42.0) && f.velocity == 0.0));
    }

    #[test]
    fn test_wait_frames_are_value_less() {
        let frames: Vec<Frame> = WaitBehavior
            .get_frames(&FrameOptions {
                duration_ms: Some(100.0),
                ..Default::default()
            })
            .collect();
        assert_eq!(frames.len(), 7);
        assert!(frames.iter().all(|f| f.value.is_none()));
    }

    #[test]
    fn test_lockstep_with_tween() {
        use crate::behavior::TweenBehavior;

        let options = FrameOptions {
            from: 0.0,
            to: 1.0,
            duration_ms: Some(250.0),
            delay_ms: 50.0,
            ..Default::default()
        };
        let tween_count = TweenBehavior::linear().get_frames(&options).count();
        let static_count = StaticBehavior.get_frames(&options).count();
        let wait_count = WaitBehavior.get_frames(&options).count();
        assert_eq!(tween_count, static_count);
        assert_eq!(tween_count, wait_count);
    }

    #[test]
    fn test_neither_fills() {
        assert!(!StaticBehavior.fill());
        assert!(!WaitBehavior.fill());
    }
}
