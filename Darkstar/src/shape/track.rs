//! Keyframe tracks and keyframe bracketing

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    /// Seconds from the start of the sequence
    pub time: f32,
    pub value: T,
}

/// The two keys surrounding a sample time and the blend factor between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub from: usize,
    pub to: usize,
    pub factor: f32,
}

impl Bracket {
    fn single(index: usize) -> Self {
        Self {
            from: index,
            to: index,
            factor: 0.0,
        }
    }
}

/// A non-empty list of keys with non-decreasing times.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTrack<T> {
    keys: Vec<Keyframe<T>>,
}

impl<T> KeyframeTrack<T> {
    pub fn new(keys: Vec<Keyframe<T>>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::corrupt("keyframe track has no keys"));
        }
        if keys.iter().any(|key| !key.time.is_finite()) {
            return Err(Error::corrupt("keyframe track has a non-finite time"));
        }
        if keys.windows(2).any(|pair| pair[1].time < pair[0].time) {
            return Err(Error::corrupt("keyframe times decrease within a track"));
        }
        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn first(&self) -> &Keyframe<T> {
        &self.keys[0]
    }

    pub fn last(&self) -> &Keyframe<T> {
        &self.keys[self.keys.len() - 1]
    }

    /// Latest key whose time is not after `time`.
    pub fn key_at_or_before(&self, time: f32) -> Option<&Keyframe<T>> {
        let count = self.keys.partition_point(|key| key.time <= time);
        count.checked_sub(1).map(|i| &self.keys[i])
    }

    /// Keys at or before `time`, in order.
    pub fn keys_until(&self, time: f32) -> &[Keyframe<T>] {
        &self.keys[..self.keys.partition_point(|key| key.time <= time)]
    }

    /// Find the keys straddling `time`.
    ///
    /// Looping tracks wrap between the last and the first key across the
    /// `duration` boundary; other tracks hold their end keys.
    pub fn bracket(&self, time: f32, duration: f32, looping: bool) -> Bracket {
        let last = self.keys.len() - 1;
        if last == 0 {
            return Bracket::single(0);
        }

        let first_time = self.keys[0].time;
        if time <= first_time && !looping {
            return Bracket::single(0);
        }

        let after = self.keys.partition_point(|key| key.time <= time);
        let (from, to, from_time, to_time) = if after == 0 {
            // Before the first key of a looping track
            (last, 0, self.keys[last].time - duration, first_time)
        } else if after > last {
            if !looping {
                return Bracket::single(last);
            }
            (last, 0, self.keys[last].time, first_time + duration)
        } else {
            (after - 1, after, self.keys[after - 1].time, self.keys[after].time)
        };

        let span = to_time - from_time;
        let factor = if span > f32::EPSILON {
            ((time - from_time) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Bracket { from, to, factor }
    }

    /// Transform every key's value, keeping times.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> KeyframeTrack<U> {
        KeyframeTrack {
            keys: self
                .keys
                .iter()
                .map(|key| Keyframe {
                    time: key.time,
                    value: f(&key.value),
                })
                .collect(),
        }
    }
}
