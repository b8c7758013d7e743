//! Merging of independently timed keyframe providers into one global
//! timeline.
//!
//! Each provider declares its own duration, delay and (optionally) interior
//! keyframe offsets. Merging rescales every provider's local offsets into
//! one shared timeline whose duration is the longest `delay + duration`
//! across providers, coalesces keyframes landing on the same global
//! offset, and returns a strictly offset-ordered list starting at 0 and
//! ending at 1.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::behavior::FPS;
use crate::value::{SimpleFrame, Value};

/// Partial property map at one provider-local position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderKeyframe {
    /// Provider-local offset in [0, 1]. Interior keyframes may omit it;
    /// the first and last are always pinned to 0 and 1.
    pub offset: Option<f64>,
    pub properties: HashMap<String, Value>,
}

impl ProviderKeyframe {
    pub fn new(properties: HashMap<String, Value>) -> Self {
        Self {
            offset: None,
            properties,
        }
    }

    pub fn at(offset: f64, properties: HashMap<String, Value>) -> Self {
        Self {
            offset: Some(offset),
            properties,
        }
    }

    pub fn property(property: impl Into<String>, value: Value) -> Self {
        Self::new(HashMap::from([(property.into(), value)]))
    }
}

/// Timing of one provider relative to the shared timeline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderTiming {
    pub duration_ms: f64,
    pub delay_ms: f64,
}

/// One independently declared per-property timed sequence, prior to
/// global merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeProvider {
    pub keyframes: Vec<ProviderKeyframe>,
    pub timing: ProviderTiming,
}

impl KeyframeProvider {
    pub fn new(keyframes: Vec<ProviderKeyframe>, timing: ProviderTiming) -> Self {
        Self { keyframes, timing }
    }

    /// Build a provider from interpolator output. The duration derives
    /// from the frame count at the engine frame rate.
    pub fn from_frames(frames: &[SimpleFrame], delay_ms: f64) -> Self {
        let keyframes = frames
            .iter()
            .map(|frame| {
                let mut properties = HashMap::new();
                if let Some(value) = &frame.value {
                    properties.insert(frame.property.clone(), value.clone());
                }
                ProviderKeyframe::new(properties)
            })
            .collect::<Vec<_>>();
        let duration_ms = (keyframes.len().saturating_sub(1)) as f64 / FPS;
        Self {
            keyframes,
            timing: ProviderTiming {
                duration_ms,
                delay_ms,
            },
        }
    }
}

/// One keyframe of the merged timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineKeyframe {
    /// Global offset in [0, 1].
    pub offset: f64,
    pub properties: HashMap<String, Value>,
}

/// The merged, globally offset keyframe list plus overall duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub keyframes: Vec<TimelineKeyframe>,
    pub duration_ms: f64,
}

/// Merge providers into one timeline.
///
/// Offsets are rounded to two decimals to absorb floating error; entries
/// landing on the same rounded offset coalesce into one keyframe whose
/// property map is the union, later providers winning on collision.
/// Properties absent at an offset stay absent; hold-last-value playback
/// is assumed downstream.
pub fn merge(providers: &[KeyframeProvider]) -> Timeline {
    let populated: Vec<&KeyframeProvider> = providers
        .iter()
        .filter(|provider| !provider.keyframes.is_empty())
        .collect();
    if populated.is_empty() {
        return Timeline::default();
    }

    let global_duration = populated
        .iter()
        .map(|p| p.timing.delay_ms + p.timing.duration_ms)
        .fold(0.0_f64, f64::max);

    // Offsets keyed by hundredths for exact coalescing.
    let mut merged: BTreeMap<i64, HashMap<String, Value>> = BTreeMap::new();

    for provider in &populated {
        let local = label_local_offsets(&provider.keyframes);
        let events: Vec<(i64, &HashMap<String, Value>)> = provider
            .keyframes
            .iter()
            .zip(local.iter())
            .map(|(keyframe, local_offset)| {
                let global = if global_duration > 0.0 {
                    (provider.timing.delay_ms + local_offset * provider.timing.duration_ms)
                        / global_duration
                } else {
                    1.0
                };
                (round_key(global), &keyframe.properties)
            })
            .collect();

        // A provider that does not span the whole timeline duplicates its
        // boundary keyframes outward: the first holds through the delay,
        // the last holds to the end.
        if let Some((first_key, first_props)) = events.first()
            && *first_key > 0
        {
            merge_into(&mut merged, 0, first_props);
        }
        for (key, properties) in &events {
            merge_into(&mut merged, *key, properties);
        }
        if let Some((last_key, last_props)) = events.last()
            && *last_key < 100
        {
            merge_into(&mut merged, 100, last_props);
        }
    }

    Timeline {
        keyframes: merged
            .into_iter()
            .map(|(key, properties)| TimelineKeyframe {
                offset: key as f64 / 100.0,
                properties,
            })
            .collect(),
        duration_ms: global_duration,
    }
}

fn merge_into(merged: &mut BTreeMap<i64, HashMap<String, Value>>, key: i64, properties: &HashMap<String, Value>) {
    let entry = merged.entry(key).or_default();
    for (property, value) in properties {
        entry.insert(property.clone(), value.clone());
    }
}

fn round_key(offset: f64) -> i64 {
    (offset * 100.0).round() as i64
}

/// Resolve provider-local offsets: first pinned to 0, last to 1, explicit
/// interior offsets preserved, missing ones evenly spaced up to the next
/// known anchor.
fn label_local_offsets(keyframes: &[ProviderKeyframe]) -> Vec<f64> {
    let count = keyframes.len();
    if count == 1 {
        // A lone keyframe marks the provider's end state.
        return vec![1.0];
    }
    let mut offsets: Vec<Option<f64>> = keyframes.iter().map(|k| k.offset).collect();
    offsets[0] = Some(0.0);
    offsets[count - 1] = Some(1.0);

    let mut resolved = vec![0.0; count];
    resolved[0] = 0.0;
    for i in 1..count {
        resolved[i] = match offsets[i] {
            Some(offset) => offset,
            None => {
                let next_known = (i + 1..count)
                    .find(|j| offsets[*j].is_some())
                    .expect("last offset is always known");
                let next_offset = offsets[next_known].expect("found a known offset");
                let previous = resolved[i - 1];
                let span = next_known - (i - 1);
                previous + (next_offset - previous) / span as f64
            }
        };
    }
    resolved
}
