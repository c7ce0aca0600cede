//! CLI command for simulating playback

use std::sync::Arc;

use darkstar::anim::{PlaybackState, ShapeInstance};

use super::{Context, load_shape};

pub fn execute(context: &Context, model: &str, sequence: &str, seconds: f32, fps: u32) -> anyhow::Result<()> {
    if fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }
    let shape = Arc::new(load_shape(context, model)?);
    let duration = shape.find_sequence(sequence)?.duration;
    let mut instance = ShapeInstance::new(shape);
    instance.play(sequence)?;

    let step = 1.0 / fps as f32;
    let ticks = (seconds.max(0.0) * fps as f32).ceil() as u32;
    let mut previous = 0.0;
    println!("{model}: {sequence} ({duration:.3}s) for {ticks} ticks at {fps} fps");

    for tick in 1..=ticks {
        for trigger in instance.advance(step) {
            println!("  tick {tick:>5}: trigger {} at {:.3}s", trigger.value, trigger.time);
        }
        let PlaybackState::Playing { time, finished, .. } = instance.state() else {
            break;
        };
        if time < previous {
            println!("  tick {tick:>5}: wrapped");
        }
        if finished {
            println!("  tick {tick:>5}: finished at {time:.3}s");
            break;
        }
        previous = time;
    }
    Ok(())
}
