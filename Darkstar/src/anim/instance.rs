//! Mutable playback state over a shared shape

use std::sync::Arc;

use super::pose::{ObjectState, Pose, PoseEvaluator};
use crate::error::{Error, Result};
use crate::render::{DrawItem, build_draw_list};
use crate::shape::{Sequence, Shape, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    fn sign(self) -> f32 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Stopped,
    Playing {
        sequence: usize,
        /// Seconds into the sequence, always inside `0..=duration`
        time: f32,
        direction: Direction,
        /// A non-looping sequence reached its end and holds the last frame
        finished: bool,
    },
}

/// One viewer's cursor into a shared [`Shape`].
///
/// The shape is immutable and may back any number of instances; the
/// playback state here has a single owner and no internal locking.
#[derive(Debug, Clone)]
pub struct ShapeInstance {
    shape: Arc<Shape>,
    state: PlaybackState,
    time_scale: f32,
    direction: Direction,
    detail: usize,
}

impl ShapeInstance {
    pub fn new(shape: Arc<Shape>) -> Self {
        Self {
            shape,
            state: PlaybackState::Stopped,
            time_scale: 1.0,
            direction: Direction::Forward,
            detail: 0,
        }
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { finished: true, .. })
    }

    /// Current sequence and time, if playing.
    pub fn position(&self) -> Option<(usize, f32)> {
        match self.state {
            PlaybackState::Playing { sequence, time, .. } => Some((sequence, time)),
            PlaybackState::Stopped => None,
        }
    }

    /// Start `name` from its beginning.
    ///
    /// # Errors
    /// Returns [`Error::SequenceNotFound`](crate::Error::SequenceNotFound)
    /// and leaves the current state untouched when no sequence matches.
    pub fn play(&mut self, name: &str) -> Result<()> {
        let index = self.shape.sequence_index(name)?;
        self.play_index(index)
    }

    pub fn play_index(&mut self, sequence: usize) -> Result<()> {
        let seq = self.sequence(sequence)?;
        // Reverse playback starts from the far end
        let time = match self.direction {
            Direction::Forward => 0.0,
            Direction::Reverse => seq.duration.max(0.0),
        };
        tracing::debug!("Playing '{}' ({:.3}s, looping: {})", seq.name, seq.duration, seq.looping);
        self.state = PlaybackState::Playing {
            sequence,
            time,
            direction: self.direction,
            finished: false,
        };
        Ok(())
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Multiplier applied to every [`advance`](Self::advance); negative
    /// values are treated as their magnitude.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.abs() } else { 1.0 };
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Change direction. A finished clip resumes in the new direction.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        if let PlaybackState::Playing {
            direction: current,
            finished,
            ..
        } = &mut self.state
        {
            if *current != direction {
                *current = direction;
                *finished = false;
            }
        }
    }

    /// Jump to `time` seconds into the current sequence.
    pub fn seek(&mut self, time: f32) {
        let Some((index, _)) = self.position() else {
            return;
        };
        let Some(seq) = self.shape.sequence(index) else {
            return;
        };
        let target = seq.normalize_time(time);
        if let PlaybackState::Playing { time, finished, .. } = &mut self.state {
            *time = target;
            *finished = false;
        }
    }

    /// Move playback by `delta` seconds of wall time.
    ///
    /// Looping sequences wrap modulo their duration; others clamp at the end
    /// they run into and report finished. Returns the triggers crossed, in
    /// the order playback crossed them.
    pub fn advance(&mut self, delta: f32) -> Vec<Trigger> {
        let PlaybackState::Playing {
            sequence,
            time,
            direction,
            finished,
        } = self.state
        else {
            return Vec::new();
        };
        if finished || !delta.is_finite() {
            return Vec::new();
        }
        let Some(seq) = self.shape.sequence(sequence) else {
            self.state = PlaybackState::Stopped;
            return Vec::new();
        };

        let step = delta.abs() * self.time_scale * direction.sign();
        let (next, done, fired) = step_sequence(seq, time, step);
        self.state = PlaybackState::Playing {
            sequence,
            time: next,
            direction,
            finished: done,
        };
        fired
    }

    /// Sample the current pose; the default pose while stopped.
    pub fn pose(&self) -> Result<Pose> {
        match self.state {
            PlaybackState::Playing { sequence, time, .. } => {
                PoseEvaluator::evaluate(&self.shape, sequence, time)
            }
            PlaybackState::Stopped => PoseEvaluator::default_pose(&self.shape),
        }
    }

    pub fn object_states(&self, pose: &Pose) -> Vec<ObjectState> {
        match self.position() {
            Some((sequence, time)) => PoseEvaluator::object_states(&self.shape, Some(sequence), time, pose),
            None => PoseEvaluator::object_states(&self.shape, None, 0.0, pose),
        }
    }

    pub fn detail(&self) -> usize {
        self.detail
    }

    /// Pick and remember the detail level for an on-screen size in pixels.
    pub fn select_detail(&mut self, screen_size: f32) -> Result<usize> {
        self.detail = self.shape.select_detail_level(screen_size)?;
        Ok(self.detail)
    }

    /// Force a detail level, clamped to the shape's levels.
    pub fn set_detail(&mut self, detail: usize) {
        self.detail = detail.min(self.shape.detail_levels().len().saturating_sub(1));
    }

    /// Everything to draw for the current state at the current detail level.
    pub fn draw_list(&self) -> Result<Vec<DrawItem>> {
        let pose = self.pose()?;
        let states = self.object_states(&pose);
        Ok(build_draw_list(&self.shape, self.detail, &pose, &states))
    }

    fn sequence(&self, index: usize) -> Result<&Sequence> {
        self.shape
            .sequence(index)
            .ok_or_else(|| Error::SequenceNotFound {
                name: format!("#{index}"),
            })
    }
}

/// Advance `time` by `step` within `seq`: the new time, whether a
/// non-looping clip finished, and the triggers crossed.
/// Whole laps replayed for triggers in a single step; a larger step
/// still lands on the right time but fires no further repeats.
const MAX_LAPS_PER_STEP: usize = 64;

fn step_sequence(seq: &Sequence, time: f32, step: f32) -> (f32, bool, Vec<Trigger>) {
    let duration = seq.duration;
    if duration <= 0.0 {
        return (0.0, !seq.looping, Vec::new());
    }

    let mut fired = Vec::new();
    let target = time + step;
    if step >= 0.0 {
        if target < duration || (!seq.looping && target <= duration) {
            fired.extend(seq.triggers_between(time, target).copied());
            return (target, !seq.looping && target >= duration, fired);
        }
        fired.extend(seq.triggers_between(time, duration).copied());
        if !seq.looping {
            return (duration, true, fired);
        }
        let laps = whole_laps(target - duration, duration);
        for _ in 0..laps {
            let lap = seq.triggers.iter().filter(|t| t.time >= 0.0 && t.time <= duration);
            fired.extend(lap.copied());
        }
        let wrapped = target.rem_euclid(duration);
        fired.extend(seq.triggers.iter().filter(|t| t.time >= 0.0 && t.time <= wrapped).copied());
        (wrapped, false, fired)
    } else {
        let crossed_down = |from: f32, to: f32| {
            let mut hits: Vec<Trigger> = seq
                .triggers
                .iter()
                .filter(|t| t.time >= to && t.time < from)
                .copied()
                .collect();
            hits.sort_by(|a, b| b.time.total_cmp(&a.time));
            hits
        };
        if target > 0.0 || (!seq.looping && target >= 0.0) {
            fired.extend(crossed_down(time, target));
            return (target, !seq.looping && target <= 0.0, fired);
        }
        fired.extend(crossed_down(time, 0.0));
        if !seq.looping {
            return (0.0, true, fired);
        }
        let laps = whole_laps(-target, duration);
        for _ in 0..laps {
            fired.extend(crossed_down(duration + f32::EPSILON, 0.0));
        }
        let wrapped = target.rem_euclid(duration);
        fired.extend(crossed_down(duration + f32::EPSILON, wrapped));
        (wrapped, false, fired)
    }
}

/// Complete laps contained in `overshoot`, capped at [`MAX_LAPS_PER_STEP`].
fn whole_laps(overshoot: f32, duration: f32) -> usize {
    let laps = (overshoot / duration).floor();
    if laps <= 0.0 {
        0
    } else if laps >= MAX_LAPS_PER_STEP as f32 {
        MAX_LAPS_PER_STEP
    } else {
        laps as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{two_node_parts, two_node_shape};

    fn instance(looping: bool) -> ShapeInstance {
        ShapeInstance::new(Arc::new(two_node_shape(looping)))
    }

    fn with_triggers(looping: bool) -> ShapeInstance {
        let mut parts = two_node_parts(looping);
        parts.sequences[0].triggers = vec![
            Trigger { time: 0.25, value: 1 },
            Trigger { time: 0.75, value: 2 },
        ];
        ShapeInstance::new(Arc::new(Shape::from_parts(parts).unwrap()))
    }

    fn values(triggers: &[Trigger]) -> Vec<i32> {
        triggers.iter().map(|t| t.value).collect()
    }

    #[test]
    fn test_play_starts_at_zero() {
        let mut inst = instance(true);
        assert_eq!(inst.state(), PlaybackState::Stopped);
        inst.play("WALK").unwrap();
        assert_eq!(inst.position(), Some((0, 0.0)));
    }

    #[test]
    fn test_play_unknown_keeps_state() {
        let mut inst = instance(true);
        inst.play("walk").unwrap();
        inst.advance(0.3);
        assert!(matches!(inst.play("swim"), Err(Error::SequenceNotFound { .. })));
        assert!(inst.position().is_some());
    }

    #[test]
    fn test_looping_wraps() {
        let mut inst = instance(true);
        inst.play("walk").unwrap();
        inst.advance(1.25);
        let (_, time) = inst.position().unwrap();
        assert!((time - 0.25).abs() < 1e-5);
        assert!(!inst.is_finished());
    }

    #[test]
    fn test_non_looping_clamps_and_finishes() {
        let mut inst = instance(false);
        inst.play("walk").unwrap();
        inst.advance(3.0);
        assert_eq!(inst.position(), Some((0, 1.0)));
        assert!(inst.is_finished());
        // Further advances hold the last frame
        inst.advance(1.0);
        assert_eq!(inst.position(), Some((0, 1.0)));
    }

    #[test]
    fn test_time_scale_and_reverse() {
        let mut inst = instance(false);
        inst.set_time_scale(2.0);
        inst.play("walk").unwrap();
        inst.advance(0.25);
        assert_eq!(inst.position(), Some((0, 0.5)));

        inst.set_direction(Direction::Reverse);
        inst.advance(0.1);
        let (_, time) = inst.position().unwrap();
        assert!((time - 0.3).abs() < 1e-5);
        inst.advance(5.0);
        assert_eq!(inst.position(), Some((0, 0.0)));
        assert!(inst.is_finished());
    }

    #[test]
    fn test_triggers_fire_once_across_wrap() {
        let mut inst = with_triggers(true);
        inst.play("walk").unwrap();
        assert_eq!(values(&inst.advance(0.5)), vec![1]);
        assert_eq!(values(&inst.advance(0.6)), vec![2]);
        // 0.1 -> 0.3
        assert_eq!(values(&inst.advance(0.2)), vec![1]);
    }

    #[test]
    fn test_triggers_fire_per_lap_in_one_step() {
        let mut inst = with_triggers(true);
        inst.play("walk").unwrap();
        // 0.0 -> 2.5 crosses two full laps before landing
        assert_eq!(values(&inst.advance(2.5)), vec![1, 2, 1, 2, 1]);
        let (_, time) = inst.position().unwrap();
        assert!((time - 0.5).abs() < 1e-5);

        inst.set_direction(Direction::Reverse);
        // 0.5 -> -1.6 wraps to 0.4 after one full lap
        assert_eq!(values(&inst.advance(2.1)), vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_huge_step_caps_repeated_triggers() {
        let mut inst = with_triggers(true);
        inst.play("walk").unwrap();
        let fired = inst.advance(10_000.25);
        // First lap, capped repeats, then the landing partial lap
        assert_eq!(fired.len(), 2 + 2 * MAX_LAPS_PER_STEP + 1);
        assert!(!inst.is_finished());
    }

    #[test]
    fn test_reverse_triggers_in_crossing_order() {
        let mut inst = with_triggers(false);
        inst.set_direction(Direction::Reverse);
        inst.play("walk").unwrap();
        assert_eq!(inst.position(), Some((0, 1.0)));
        assert_eq!(values(&inst.advance(0.9)), vec![2, 1]);
    }

    #[test]
    fn test_seek_and_stop() {
        let mut inst = instance(false);
        inst.play("walk").unwrap();
        inst.seek(0.5);
        let pose = inst.pose().unwrap();
        assert!((pose.local[0].translation.x - 5.0).abs() < 1e-5);
        inst.stop();
        assert_eq!(inst.state(), PlaybackState::Stopped);
        assert_eq!(inst.pose().unwrap().local[0], inst.shape().nodes()[0].default_transform);
    }

    #[test]
    fn test_detail_selection_and_draw_list() {
        let mut inst = instance(false);
        assert_eq!(inst.select_detail(100.0).unwrap(), 0);
        assert_eq!(inst.select_detail(20.0).unwrap(), 1);
        assert_eq!(inst.select_detail(1.0).unwrap(), 1);
        inst.set_detail(7);
        assert_eq!(inst.detail(), 1);
        assert_eq!(inst.draw_list().unwrap().len(), 1);
    }
}
