//! Duration-driven eased interpolation.

use super::{Behavior, BehaviorKind, FPS, Frame, FrameOptions, Frames, delay_frames, time_to_frame};
use crate::easing::EasingFunction;

/// Eases a from/to pair over a fixed duration, sampled at the engine
/// frame rate. Velocity is estimated by finite differences so a spring
/// can pick up where an interrupted tween left off.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TweenBehavior {
    pub easing: EasingFunction,
}

impl TweenBehavior {
    pub fn new(easing: EasingFunction) -> Self {
        Self { easing }
    }

    pub fn linear() -> Self {
        Self {
            easing: EasingFunction::Linear,
        }
    }
}

impl Behavior for TweenBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Tween
    }

    fn get_frames(&self, options: &FrameOptions) -> Frames {
        let duration = options.duration_ms.unwrap_or(0.0);
        let steps = time_to_frame(duration);

        let mut values = Vec::with_capacity(steps + 1);
        if steps == 0 {
            values.push(options.to);
        } else {
            for i in 0..=steps {
                let t = i as f64 / steps as f64;
                let eased = self.easing.evaluate(t);
                values.push(options.from + (options.to - options.from) * eased);
            }
        }

        let dt = 1.0 / FPS;
        let last = values.len() - 1;
        let frames: Vec<Frame> = values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let velocity = if last == 0 {
                    0.0
                } else if i == 0 {
                    (values[1] - values[0]) / dt
                } else if i == last {
                    (values[last] - values[last - 1]) / dt
                } else {
                    (values[i + 1] - values[i - 1]) / (2.0 * dt)
                };
                Frame::new(value, velocity)
            })
            .collect();

        Box::new(delay_frames(options).chain(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_tween_endpoints() {
        let behavior = TweenBehavior::linear();
        let frames: Vec<Frame> = behavior
            .get_frames(&FrameOptions {
                from: 0.0,
                to: 100.0,
                duration_ms: Some(100.0),
                ..Default::default()
            })
            .collect();

        assert_eq!(frames.len(), 7);
        assert_eq!(frames.first().unwrap().value, Some(0.0));
        assert_eq!(frames.last().unwrap().value, Some(100.0));

        // Linear means evenly spaced samples
        let mid = frames[3].value.unwrap();
        assert!((mid - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_tween_velocity_sign() {
        let behavior = TweenBehavior::linear();
        let frames: Vec<Frame> = behavior
            .get_frames(&FrameOptions {
                from: 100.0,
                to: 0.0,
                duration_ms: Some(100.0),
                ..Default::default()
            })
            .collect();
        assert!(frames.iter().all(|f| f.velocity < 0.0));
    }

    #[test]
    fn test_tween_delay_holds_start() {
        let behavior = TweenBehavior::linear();
        let frames: Vec<Frame> = behavior
            .get_frames(&FrameOptions {
                from: 5.0,
                to: 10.0,
                duration_ms: Some(100.0),
                delay_ms: 50.0,
                ..Default::default()
            })
            .collect();

        // 3 delay frames then 7 tween frames
        assert_eq!(frames.len(), 10);
        assert_eq!(frames[0].value, Some(5.0));
        assert_eq!(frames[0].velocity, 0.0);
        assert_eq!(frames[2].value, Some(5.0));
        assert_eq!(frames.last().unwrap().value, Some(10.0));
    }

    #[test]
    fn test_zero_duration_single_frame() {
        let behavior = TweenBehavior::linear();
        let frames: Vec<Frame> = behavior
            .get_frames(&FrameOptions {
                from: 0.0,
                to: 1.0,
                duration_ms: Some(0.0),
                ..Default::default()
            })
            .collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].value, Some(1.0));
    }

    #[test]
    fn test_eased_tween_monotonic() {
        let behavior = TweenBehavior::new(EasingFunction::EaseInOut);
        let frames: Vec<Frame> = behavior
            .get_frames(&FrameOptions {
                from: 0.0,
                to: 1.0,
                duration_ms: Some(200.0),
                ..Default::default()
            })
            .collect();
        for pair in frames.windows(2) {
            assert!(pair[1].value.unwrap() >= pair[0].value.unwrap());
        }
    }
}
