//! CLI command for bulk shape decoding

use std::time::Instant;

use shapeview::library::decode_all_with;

use super::Context;
use crate::progress::{CUBE, LOOKING_GLASS, print_done, print_step, simple_bar};

pub fn execute(context: &Context, ext: &str, quiet: bool) -> anyhow::Result<()> {
    let started = Instant::now();

    print_step(1, 2, &LOOKING_GLASS, "Indexing search roots...");
    let locator = context.locator()?;
    let names: Vec<String> = locator
        .enumerate(Some(ext))
        .into_iter()
        .map(|entry| entry.name)
        .collect();

    print_step(2, 2, &CUBE, &format!("Decoding {} shape(s)...", names.len()));
    let pb = simple_bar(names.len() as u64, "Decoding", quiet);
    let outcomes = decode_all_with(&locator, &names, |_| pb.inc(1));
    pb.finish_and_clear();

    let mut failed = 0;
    for outcome in &outcomes {
        if let Err(err) = &outcome.result {
            failed += 1;
            println!("  {}: {err}", outcome.name);
        }
    }
    println!("{} decoded, {failed} failed", outcomes.len() - failed);
    print_done(started.elapsed());
    Ok(())
}
