//! CLI command for shape summaries

use darkstar::shape::Shape;
use serde::Serialize;

use super::{Context, load_shape};

#[derive(Serialize)]
struct NodeSummary<'a> {
    name: &'a str,
    parent: Option<usize>,
}

#[derive(Serialize)]
struct ObjectSummary<'a> {
    name: &'a str,
    node: Option<usize>,
    mesh: Option<usize>,
}

#[derive(Serialize)]
struct SequenceSummary<'a> {
    name: &'a str,
    duration: f32,
    looping: bool,
    triggers: usize,
}

#[derive(Serialize)]
struct ShapeSummary<'a> {
    version: u32,
    radius: f32,
    center: [f32; 3],
    nodes: Vec<NodeSummary<'a>>,
    objects: Vec<ObjectSummary<'a>>,
    detail_sizes: Vec<f32>,
    sequences: Vec<SequenceSummary<'a>>,
    materials: usize,
}

impl<'a> ShapeSummary<'a> {
    fn new(shape: &'a Shape) -> Self {
        Self {
            version: shape.version(),
            radius: shape.radius(),
            center: shape.center().to_array(),
            nodes: shape
                .nodes()
                .iter()
                .map(|n| NodeSummary { name: &n.name, parent: n.parent })
                .collect(),
            objects: shape
                .objects()
                .iter()
                .map(|o| ObjectSummary { name: &o.name, node: o.node, mesh: o.mesh })
                .collect(),
            detail_sizes: shape.detail_levels().iter().map(|d| d.size).collect(),
            sequences: shape
                .sequences()
                .iter()
                .map(|s| SequenceSummary {
                    name: &s.name,
                    duration: s.duration,
                    looping: s.looping,
                    triggers: s.triggers.len(),
                })
                .collect(),
            materials: shape.materials().len(),
        }
    }
}

fn or_dash(value: Option<usize>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn execute(context: &Context, model: &str, json: bool) -> anyhow::Result<()> {
    let shape = load_shape(context, model)?;
    let summary = ShapeSummary::new(&shape);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Shape: {model} (v{})", summary.version);
    println!("Radius: {:.3}  Center: {:?}", summary.radius, summary.center);
    println!();
    println!("Nodes: {}", summary.nodes.len());
    for (index, node) in summary.nodes.iter().enumerate() {
        println!("  {index:>3} {:<24} parent {}", node.name, or_dash(node.parent));
    }

    println!("Objects: {}", summary.objects.len());
    for object in &summary.objects {
        println!(
            "  {:<24} node {:<4} mesh {}",
            object.name,
            or_dash(object.node),
            or_dash(object.mesh)
        );
    }

    println!("Detail levels: {}", summary.detail_sizes.len());
    for size in &summary.detail_sizes {
        println!("  size {size:>8.2}");
    }

    println!("Sequences: {}", summary.sequences.len());
    for sequence in &summary.sequences {
        println!(
            "  {:<24} {:>6.2}s{}  {} trigger(s)",
            sequence.name,
            sequence.duration,
            if sequence.looping { " looping" } else { "" },
            sequence.triggers
        );
    }

    println!("Materials: {}", summary.materials);
    Ok(())
}
