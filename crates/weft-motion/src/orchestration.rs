//! Composition of motions into sequential and parallel timelines.
//!
//! An [`AnimationTimeline`] nests motion definitions under sequence and
//! parallel groups. Compilation goes through an [`OrchestrationMatrix`]:
//! every sprite gets a row, every engine frame a column, and each motion
//! contributes a row fragment starting at some column. Sequences
//! concatenate columns, parallel groups overlay at column zero. Reading
//! the matrix out column by column yields per-sprite keyframe sequences
//! with hold-last-value filling, except for non-filling fragments (waits
//! and static holds) whose properties drop back out once they end.

use std::collections::HashMap;

use crate::behavior::{BehaviorKind, FPS};
use crate::error::MotionError;
use crate::interpolate::{MotionInput, MotionTiming, generate_frames};
use crate::sprite::Sprite;
use crate::timeline::{KeyframeProvider, ProviderKeyframe, ProviderTiming};
use crate::value::{SimpleFrame, Value};

/// One motion applied to a set of sprites.
#[derive(Debug)]
pub struct MotionDefinition {
    /// Identity keys of the sprites this motion animates.
    pub sprites: Vec<String>,
    /// Property to input mapping; empty for pure waits.
    pub properties: Vec<(String, MotionInput)>,
    pub timing: MotionTiming,
}

/// A nested timeline of motions.
#[derive(Debug)]
pub enum AnimationTimeline {
    /// Members run one after another.
    Sequence(Vec<TimelineMember>),
    /// Members run simultaneously.
    Parallel(Vec<TimelineMember>),
}

/// One member of a timeline.
#[derive(Debug)]
pub enum TimelineMember {
    Timeline(AnimationTimeline),
    Motion(MotionDefinition),
}

#[derive(Debug, Clone)]
struct RowFragment {
    fill: bool,
    frames: Vec<SimpleFrame>,
    start_column: usize,
}

/// Per-sprite rows of frame fragments positioned on a shared column axis.
#[derive(Debug, Default)]
pub struct OrchestrationMatrix {
    rows: HashMap<String, Vec<RowFragment>>,
    total_columns: usize,
}

impl OrchestrationMatrix {
    pub fn total_columns(&self) -> usize {
        self.total_columns
    }

    /// Compile a timeline against the sprites it animates, keyed by
    /// identity string.
    pub fn from_timeline(
        timeline: &AnimationTimeline,
        sprites: &HashMap<String, Sprite>,
    ) -> Result<Self, MotionError> {
        match timeline {
            AnimationTimeline::Sequence(members) => {
                let mut matrix = Self::default();
                for member in members {
                    let columns = matrix.total_columns;
                    matrix.add(columns, Self::from_member(member, sprites)?);
                }
                Ok(matrix)
            }
            AnimationTimeline::Parallel(members) => {
                let mut matrix = Self::default();
                for member in members {
                    matrix.add(0, Self::from_member(member, sprites)?);
                }
                Ok(matrix)
            }
        }
    }

    fn from_member(
        member: &TimelineMember,
        sprites: &HashMap<String, Sprite>,
    ) -> Result<Self, MotionError> {
        match member {
            TimelineMember::Timeline(timeline) => Self::from_timeline(timeline, sprites),
            TimelineMember::Motion(motion) => Self::from_motion(motion, sprites),
        }
    }

    fn from_motion(
        motion: &MotionDefinition,
        sprites: &HashMap<String, Sprite>,
    ) -> Result<Self, MotionError> {
        let mut rows: HashMap<String, Vec<RowFragment>> = HashMap::new();
        let mut max_length = 0;
        let fill = motion.timing.behavior.fill();

        for sprite_key in &motion.sprites {
            let Some(sprite) = sprites.get(sprite_key) else {
                tracing::debug!(sprite = %sprite_key, "motion references an unknown sprite");
                continue;
            };
            let mut fragments = Vec::new();

            if motion.timing.behavior.kind() == BehaviorKind::Wait {
                let frames =
                    generate_frames(sprite, "wait", MotionInput::auto(), &motion.timing)?;
                if !frames.is_empty() {
                    max_length = max_length.max(frames.len());
                    fragments.push(RowFragment {
                        fill,
                        frames,
                        start_column: 0,
                    });
                }
            } else {
                for (property, input) in &motion.properties {
                    let frames =
                        generate_frames(sprite, property, input.clone(), &motion.timing)?;
                    if !frames.is_empty() {
                        max_length = max_length.max(frames.len());
                        fragments.push(RowFragment {
                            fill,
                            frames,
                            start_column: 0,
                        });
                    }
                }
            }
            rows.insert(sprite_key.clone(), fragments);
        }

        Ok(Self {
            rows,
            total_columns: max_length,
        })
    }

    /// Overlay another matrix starting at `column`.
    pub fn add(&mut self, column: usize, other: OrchestrationMatrix) {
        for (sprite, fragments) in other.rows {
            let shifted = fragments.into_iter().map(|fragment| RowFragment {
                start_column: fragment.start_column + column,
                ..fragment
            });
            self.rows.entry(sprite).or_default().extend(shifted);
        }
        self.total_columns = self.total_columns.max(other.total_columns + column);
    }

    /// Read the matrix out into per-sprite keyframe property maps, one
    /// map per column.
    pub fn keyframes(self) -> HashMap<String, Vec<HashMap<String, Value>>> {
        let total_columns = self.total_columns;
        let mut result = HashMap::new();

        for (sprite, fragments) in self.rows {
            let mut fragments_by_column: HashMap<usize, Vec<RowFragment>> = HashMap::new();

            // Filling fragments seed the baseline keyframe with their
            // first value, so a motion that starts later still has its
            // property pinned from column zero.
            let mut base_keyframe: HashMap<String, Value> = HashMap::new();
            for fragment in fragments {
                if fragment.fill
                    && let Some(first) = fragment.frames.first()
                    && let Some(value) = &first.value
                {
                    base_keyframe.insert(first.property.clone(), value.clone());
                }
                fragments_by_column
                    .entry(fragment.start_column)
                    .or_default()
                    .push(fragment);
            }

            let mut active: Vec<(RowFragment, usize)> = Vec::new();
            let mut keyframes = Vec::with_capacity(total_columns);
            let mut previous = base_keyframe;
            let mut drop_after_this_column: Vec<String> = Vec::new();

            for column in 0..total_columns {
                if let Some(starting) = fragments_by_column.remove(&column) {
                    active.extend(starting.into_iter().map(|f| (f, 0)));
                }

                for property in drop_after_this_column.drain(..) {
                    previous.remove(&property);
                }

                let mut keyframe = previous.clone();
                for (fragment, cursor) in &mut active {
                    if let Some(frame) = fragment.frames.get(*cursor) {
                        *cursor += 1;
                        if let Some(value) = &frame.value {
                            keyframe.insert(frame.property.clone(), value.clone());
                        }
                        // Final frame of a non-filling fragment: its
                        // property must not be carried forward.
                        if *cursor == fragment.frames.len() && !fragment.fill {
                            drop_after_this_column.push(frame.property.clone());
                        }
                    }
                }
                active.retain(|(fragment, cursor)| *cursor < fragment.frames.len());

                previous = keyframe.clone();
                keyframes.push(keyframe);
            }

            result.insert(sprite, keyframes);
        }
        result
    }

    /// Compile straight to per-sprite keyframe providers.
    pub fn into_providers(self) -> HashMap<String, KeyframeProvider> {
        let total_columns = self.total_columns;
        let duration_ms = total_columns.saturating_sub(1) as f64 / FPS;
        self.keyframes()
            .into_iter()
            .map(|(sprite, keyframes)| {
                let provider = KeyframeProvider::new(
                    keyframes.into_iter().map(ProviderKeyframe::new).collect(),
                    ProviderTiming {
                        duration_ms,
                        delay_ms: 0.0,
                    },
                );
                (sprite, provider)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{StaticBehavior, TweenBehavior, WaitBehavior};
    use crate::sprite::{SpriteIdentifier, SpriteType};

    fn sprite_map() -> HashMap<String, Sprite> {
        let sprite = Sprite::new(
            "node-1",
            SpriteIdentifier::new(Some("card".into()), None),
            SpriteType::Kept,
        );
        HashMap::from([("id:card;role:null".to_string(), sprite)])
    }

    fn opacity_motion(from: f64, to: f64, duration_ms: f64) -> MotionDefinition {
        MotionDefinition {
            sprites: vec!["id:card;role:null".to_string()],
            properties: vec![(
                "opacity".to_string(),
                MotionInput::range(Value::from(from), Value::from(to)),
            )],
            timing: MotionTiming::new(Box::new(TweenBehavior::linear()))
                .with_duration(duration_ms),
        }
    }

    fn wait_motion(duration_ms: f64) -> MotionDefinition {
        MotionDefinition {
            sprites: vec!["id:card;role:null".to_string()],
            properties: vec![],
            timing: MotionTiming::new(Box::new(WaitBehavior)).with_duration(duration_ms),
        }
    }

    #[test]
    fn test_single_motion() {
        let timeline =
            AnimationTimeline::Sequence(vec![TimelineMember::Motion(opacity_motion(
                0.0, 1.0, 100.0,
            ))]);
        let matrix = OrchestrationMatrix::from_timeline(&timeline, &sprite_map()).unwrap();
        assert_eq!(matrix.total_columns(), 7);

        let keyframes = matrix.keyframes();
        let card = &keyframes["id:card;role:null"];
        assert_eq!(card.len(), 7);
        assert_eq!(card[0].get("opacity"), Some(&Value::from(0.0)));
        assert_eq!(card[6].get("opacity"), Some(&Value::from(1.0)));
    }

    #[test]
    fn test_sequence_offsets_later_motions() {
        let timeline = AnimationTimeline::Sequence(vec![
            TimelineMember::Motion(wait_motion(100.0)),
            TimelineMember::Motion(opacity_motion(0.0, 1.0, 100.0)),
        ]);
        let matrix = OrchestrationMatrix::from_timeline(&timeline, &sprite_map()).unwrap();
        // 7 wait columns, then 7 motion columns
        assert_eq!(matrix.total_columns(), 14);

        let keyframes = matrix.keyframes();
        let card = &keyframes["id:card;role:null"];
        // During the wait, opacity is already pinned to the upcoming
        // motion's first value by the baseline
        assert_eq!(card[0].get("opacity"), Some(&Value::from(0.0)));
        assert_eq!(card[7].get("opacity"), Some(&Value::from(0.0)));
        assert_eq!(card[13].get("opacity"), Some(&Value::from(1.0)));
    }

    #[test]
    fn test_parallel_overlays_at_zero() {
        let width_motion = MotionDefinition {
            sprites: vec!["id:card;role:null".to_string()],
            properties: vec![(
                "width".to_string(),
                MotionInput::range(Value::parse("10px"), Value::parse("20px")),
            )],
            timing: MotionTiming::new(Box::new(TweenBehavior::linear())).with_duration(200.0),
        };
        let timeline = AnimationTimeline::Parallel(vec![
            TimelineMember::Motion(opacity_motion(0.0, 1.0, 100.0)),
            TimelineMember::Motion(width_motion),
        ]);
        let matrix = OrchestrationMatrix::from_timeline(&timeline, &sprite_map()).unwrap();
        assert_eq!(matrix.total_columns(), 13);

        let keyframes = matrix.keyframes();
        let card = &keyframes["id:card;role:null"];
        assert_eq!(card[0].get("opacity"), Some(&Value::from(0.0)));
        assert!(card[0].get("width").is_some());
        // Opacity finished at column 6 and holds afterwards
        assert_eq!(card[12].get("opacity"), Some(&Value::from(1.0)));
        assert_eq!(card[12].get("width"), Some(&Value::parse("20px")));
    }

    #[test]
    fn test_non_fill_fragment_drops_out() {
        let hold = MotionDefinition {
            sprites: vec!["id:card;role:null".to_string()],
            properties: vec![(
                "visibility".to_string(),
                MotionInput::Fixed(Value::parse("hidden")),
            )],
            timing: MotionTiming::new(Box::new(StaticBehavior)).with_duration(50.0),
        };
        let timeline = AnimationTimeline::Parallel(vec![
            TimelineMember::Motion(hold),
            TimelineMember::Motion(opacity_motion(0.0, 1.0, 200.0)),
        ]);
        let matrix = OrchestrationMatrix::from_timeline(&timeline, &sprite_map()).unwrap();

        let keyframes = matrix.keyframes();
        let card = &keyframes["id:card;role:null"];
        // Hold runs for 4 columns (50ms), then its property disappears
        assert_eq!(card[0].get("visibility"), Some(&Value::parse("hidden")));
        assert_eq!(card[3].get("visibility"), Some(&Value::parse("hidden")));
        assert!(card[4].get("visibility").is_none());
        assert!(card.last().unwrap().get("visibility").is_none());
    }

    #[test]
    fn test_into_providers() {
        let timeline =
            AnimationTimeline::Sequence(vec![TimelineMember::Motion(opacity_motion(
                0.0, 1.0, 100.0,
            ))]);
        let matrix = OrchestrationMatrix::from_timeline(&timeline, &sprite_map()).unwrap();
        let providers = matrix.into_providers();
        let provider = &providers["id:card;role:null"];
        assert_eq!(provider.keyframes.len(), 7);
        assert!((provider.timing.duration_ms - 100.0).abs() < 0.1);
    }
}
