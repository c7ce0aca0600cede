//! CLI command for exporting a shape's textures

use std::fs;
use std::path::Path;

use shapeview::textures::save_png;

use super::Context;
use crate::progress::{DISK, LOOKING_GLASS, PICTURE, print_done, print_step};

pub fn execute(context: &Context, model: &str, output: &Path) -> anyhow::Result<()> {
    let started = std::time::Instant::now();

    print_step(1, 3, &LOOKING_GLASS, &format!("Loading {model}..."));
    let mut session = context.session(model)?;
    let Some(handle) = session.current() else {
        anyhow::bail!("{model} did not load");
    };

    print_step(2, 3, &PICTURE, "Resolving materials...");
    let textures = session.textures(handle)?;

    print_step(3, 3, &DISK, &format!("Writing to {}...", output.display()));
    fs::create_dir_all(output)?;
    let mut written = 0;
    for texture in &textures {
        match &texture.pixels {
            Ok(Some(pixels)) => {
                let stem = Path::new(&texture.name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|s| !s.is_empty())
                    .map_or_else(|| format!("material_{}", texture.material), str::to_string);
                save_png(pixels, &output.join(format!("{stem}.png")))?;
                written += 1;
            }
            Ok(None) => {}
            Err(err) => println!("  material {} ({}): {err}", texture.material, texture.name),
        }
    }

    println!("Wrote {written} of {} material(s)", textures.len());
    print_done(started.elapsed());
    Ok(())
}
