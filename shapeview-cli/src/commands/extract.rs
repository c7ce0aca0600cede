//! CLI command for volume extraction

use std::fs;
use std::path::Path;

use darkstar::archive::ArchiveReader;

pub fn execute(volume: &Path, name: &str, output: &Path) -> anyhow::Result<()> {
    let directory = ArchiveReader::open_path(volume)?;
    let bytes = directory.read_named(name)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, bytes)?;
    println!("✓ Wrote {name} ({} bytes) to {}", bytes.len(), output.display());
    Ok(())
}
