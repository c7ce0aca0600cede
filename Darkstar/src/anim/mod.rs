//! Animation: stateless pose sampling and per-viewer playback

mod instance;
mod pose;

pub use instance::{Direction, PlaybackState, ShapeInstance};
pub use pose::{ObjectState, Pose, PoseEvaluator};
