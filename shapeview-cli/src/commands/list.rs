//! CLI command for listing the mounted namespace

use super::Context;

pub fn execute(context: &Context, ext: Option<&str>) -> anyhow::Result<()> {
    let locator = context.locator()?;
    let entries = locator.enumerate(ext);
    let volumes = locator.volumes();

    for entry in &entries {
        let mount = volumes
            .get(entry.mount)
            .map_or_else(String::new, |v| v.label().display().to_string());
        println!("{:<32} {mount}", entry.name);
    }
    println!("\n{} entries across {} mount(s)", entries.len(), volumes.len());
    Ok(())
}
