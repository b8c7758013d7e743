//! Turning sprite values into per-property frame sequences.
//!
//! [`generate_frames`] is the bridge between a classified sprite and the
//! timeline: given a property, a from/to pair (explicit or read from the
//! sprite's captured styles) and a timing, it produces the
//! [`SimpleFrame`] list a [`crate::timeline::KeyframeProvider`] is built
//! from.
//!
//! Composite values (transform lists, shadows) decompose into parallel
//! per-component interpolations that run in lockstep over one duration
//! and re-serialize per frame. Components whose endpoints are identical
//! are substituted with a static hold so they do not churn. Springs are
//! rejected for composites: their convergence-driven frame count cannot
//! be kept in lockstep across independently integrated components.
//!
//! Values that fit no known kind are reported with a warning and dropped
//! from the frame set; the rest of the animation proceeds.

use tracing::warn;

use crate::behavior::{Behavior, BehaviorKind, FrameOptions, StaticBehavior, time_to_frame};
use crate::error::MotionError;
use crate::sprite::Sprite;
use crate::value::{
    ComplexComponent, ComplexTemplate, Rgba, SimpleFrame, Value, dasherize, normalize_property,
};

/// The value range a motion covers.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionInput {
    /// Interpolate between two endpoints. Endpoints left `None` default
    /// to the sprite's captured before/after style values.
    Range {
        from: Option<Value>,
        to: Option<Value>,
    },
    /// Hold one fixed value; only valid with a static behavior.
    Fixed(Value),
}

impl MotionInput {
    /// Both endpoints resolved from the sprite's snapshots.
    pub fn auto() -> Self {
        Self::Range {
            from: None,
            to: None,
        }
    }

    pub fn range(from: Value, to: Value) -> Self {
        Self::Range {
            from: Some(from),
            to: Some(to),
        }
    }
}

/// Timing and strategy for one motion.
#[derive(Debug)]
pub struct MotionTiming {
    pub behavior: Box<dyn Behavior>,
    pub duration_ms: Option<f64>,
    pub delay_ms: f64,
    /// Initial velocity carried over from an interrupted animation.
    pub velocity: f64,
}

impl MotionTiming {
    pub fn new(behavior: Box<dyn Behavior>) -> Self {
        Self {
            behavior,
            duration_ms: None,
            delay_ms: 0.0,
            velocity: 0.0,
        }
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Generate the frame sequence for one property of one sprite.
///
/// Returns an empty list for degenerate-but-valid inputs (identical
/// endpoints, values missing from the snapshots, unclassifiable values);
/// errors are reserved for behavior/value contract mismatches.
pub fn generate_frames(
    sprite: &Sprite,
    property: &str,
    input: MotionInput,
    timing: &MotionTiming,
) -> Result<Vec<SimpleFrame>, MotionError> {
    let property = normalize_property(property);

    if timing.behavior.kind() == BehaviorKind::Wait {
        let duration = timing.duration_ms.ok_or(MotionError::WaitRequiresDuration)?;
        let options = FrameOptions {
            duration_ms: Some(duration),
            delay_ms: timing.delay_ms,
            ..FrameOptions::default()
        };
        return Ok(timing
            .behavior
            .get_frames(&options)
            .map(|_| SimpleFrame::empty(property))
            .collect());
    }

    let (from, to) = match input {
        MotionInput::Fixed(value) => {
            if timing.behavior.kind() != BehaviorKind::Static {
                return Err(MotionError::FixedValueRequiresStatic);
            }
            let duration = timing.duration_ms.ok_or(MotionError::StaticRequiresDuration)?;
            let count = time_to_frame(timing.delay_ms) + time_to_frame(duration) + 1;
            return Ok((0..count)
                .map(|_| SimpleFrame::new(property, value.clone()))
                .collect());
        }
        MotionInput::Range { from, to } => {
            let style_key = dasherize(property);
            let from = from.or_else(|| sprite.initial_style(&style_key).map(Value::parse));
            let to = to.or_else(|| sprite.final_style(&style_key).map(Value::parse));
            match (from, to) {
                (Some(from), Some(to)) => (from, to),
                _ => {
                    warn!(
                        %property,
                        "missing from/to value, dropping property from this frame set"
                    );
                    return Ok(Vec::new());
                }
            }
        }
    };

    if from == to {
        return Ok(Vec::new());
    }

    if from.is_numeric() && to.is_numeric() {
        return Ok(interpolate_numeric(property, &from, &to, timing));
    }

    if from.is_color() || to.is_color() {
        let (Some(from_color), Some(to_color)) = (from.as_color(), to.as_color()) else {
            return Err(MotionError::MismatchedColorValues {
                from: from.to_string(),
                to: to.to_string(),
            });
        };
        return Ok(interpolate_color(property, from_color, to_color, timing));
    }

    let from_text = from.to_string();
    let to_text = to.to_string();
    if let (Some(from_template), Some(to_template)) = (
        ComplexTemplate::parse(&from_text),
        ComplexTemplate::parse(&to_text),
    ) {
        return interpolate_complex(property, &from_template, &to_template, timing);
    }

    warn!(
        %property,
        from = %from_text,
        to = %to_text,
        "could not match value to a known type, dropping property"
    );
    Ok(Vec::new())
}

/// Unit-aware numeric interpolation. The unit comes from the `to` value,
/// falling back to `from`.
fn interpolate_numeric(
    property: &str,
    from: &Value,
    to: &Value,
    timing: &MotionTiming,
) -> Vec<SimpleFrame> {
    let unit = to.unit().or(from.unit()).map(str::to_string);
    let options = FrameOptions {
        from: from.as_number().expect("numeric from"),
        to: to.as_number().expect("numeric to"),
        duration_ms: timing.duration_ms,
        delay_ms: timing.delay_ms,
        velocity: timing.velocity,
    };
    timing
        .behavior
        .get_frames(&options)
        .map(|frame| SimpleFrame {
            property: property.to_string(),
            value: frame.value.map(|v| match &unit {
                Some(unit) => Value::Unit {
                    value: v,
                    unit: unit.clone(),
                },
                None => Value::Number { value: v },
            }),
            velocity: frame.velocity,
        })
        .collect()
}

/// Color interpolation: the behavior drives a progress curve from 0 to 1
/// and each frame mixes the endpoints at that progress.
fn interpolate_color(
    property: &str,
    from: Rgba,
    to: Rgba,
    timing: &MotionTiming,
) -> Vec<SimpleFrame> {
    let options = FrameOptions {
        from: 0.0,
        to: 1.0,
        duration_ms: timing.duration_ms,
        delay_ms: timing.delay_ms,
        velocity: timing.velocity,
    };
    timing
        .behavior
        .get_frames(&options)
        .map(|frame| SimpleFrame {
            property: property.to_string(),
            value: Some(Value::Color {
                rgba: from.mix(&to, frame.value.unwrap_or(1.0)),
            }),
            velocity: frame.velocity,
        })
        .collect()
}

fn interpolate_complex(
    property: &str,
    from: &ComplexTemplate,
    to: &ComplexTemplate,
    timing: &MotionTiming,
) -> Result<Vec<SimpleFrame>, MotionError> {
    if timing.behavior.kind() == BehaviorKind::Spring {
        return Err(MotionError::SpringOnComposite);
    }
    if !from.matches_structure(to) {
        warn!(
            %property,
            "composite endpoints do not share a structure, dropping property"
        );
        return Ok(Vec::new());
    }

    let progress_options = FrameOptions {
        from: 0.0,
        to: 1.0,
        duration_ms: timing.duration_ms,
        delay_ms: timing.delay_ms,
        velocity: timing.velocity,
    };

    let mut columns: Vec<Vec<ComplexComponent>> = Vec::with_capacity(from.components().len());
    for (from_part, to_part) in from.components().iter().zip(to.components()) {
        let column: Vec<ComplexComponent> = match (from_part, to_part) {
            (ComplexComponent::Number(a), ComplexComponent::Number(b)) if a == b => {
                // Identical endpoints hold statically instead of churning
                // through the configured behavior.
                StaticBehavior
                    .get_frames(&FrameOptions {
                        from: *a,
                        ..progress_options
                    })
                    .map(|frame| ComplexComponent::Number(frame.value.expect("static value")))
                    .collect()
            }
            (ComplexComponent::Number(a), ComplexComponent::Number(b)) => timing
                .behavior
                .get_frames(&FrameOptions {
                    from: *a,
                    to: *b,
                    ..progress_options
                })
                .map(|frame| ComplexComponent::Number(frame.value.expect("numeric value")))
                .collect(),
            (ComplexComponent::Color(a), ComplexComponent::Color(b)) => timing
                .behavior
                .get_frames(&progress_options)
                .map(|frame| ComplexComponent::Color(a.mix(b, frame.value.unwrap_or(1.0))))
                .collect(),
            _ => unreachable!("structure match guarantees paired kinds"),
        };
        columns.push(column);
    }

    let length = columns.first().map(Vec::len).unwrap_or(0);
    debug_assert!(columns.iter().all(|column| column.len() == length));

    let mut frames = Vec::with_capacity(length);
    for row in 0..length {
        let values: Vec<ComplexComponent> =
            columns.iter().map(|column| column[row]).collect();
        frames.push(SimpleFrame::new(
            property,
            Value::Text {
                value: from.serialize(&values),
            },
        ));
    }
    Ok(frames)
}
