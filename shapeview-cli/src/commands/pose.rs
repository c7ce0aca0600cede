//! CLI command for sampling a pose

use darkstar::anim::PoseEvaluator;

use super::{Context, load_shape};

pub fn execute(context: &Context, model: &str, sequence: Option<&str>, time: f32) -> anyhow::Result<()> {
    let shape = load_shape(context, model)?;
    let pose = match sequence {
        Some(name) => PoseEvaluator::evaluate_named(&shape, name, time)?,
        None => PoseEvaluator::default_pose(&shape)?,
    };

    match sequence {
        Some(name) => println!("{model}: {name} at {time:.3}s"),
        None => println!("{model}: rest pose"),
    }
    for (index, node) in shape.nodes().iter().enumerate() {
        let Some(position) = pose.world_translation(index) else {
            continue;
        };
        println!(
            "  {index:>3} {:<24} ({:>9.4}, {:>9.4}, {:>9.4}){}",
            node.name,
            position.x,
            position.y,
            position.z,
            if pose.is_visible(index) { "" } else { "  hidden" }
        );
    }
    Ok(())
}
