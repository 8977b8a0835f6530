#![cfg(not(tarpaulin_include))]

use log::info;
use mecsimcalc::codec::{classify, decode_with_metadata, guess_extension};
use std::env;
use std::fs;
use std::time::Instant;

/// Decode a data-URI payload stored in a file
///
/// Reads the payload from `<payload-file>` (surrounding whitespace is ignored),
/// prints its file-type label, extension and size, and writes the decoded bytes
/// to `[output-file]` when one is given.
///
/// Set `RUST_LOG=debug` to see decoding details.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <payload-file> [output-file]", args[0]);
        return Ok(());
    }

    let start = Instant::now();
    let payload = fs::read_to_string(&args[1])?;
    let (file, metadata) = decode_with_metadata(payload.trim())?;

    let label = classify(&metadata);
    let extension = guess_extension(&metadata);
    let bytes = file.into_inner();

    let label = if label.is_empty() { "unknown" } else { label.as_str() };
    println!("type: {}", label);
    println!("extension: {}", extension.as_deref().unwrap_or("unknown"));
    println!("size: {} bytes", bytes.len());

    if let Some(output) = args.get(2) {
        fs::write(output, &bytes)?;
        info!("wrote {} bytes to {}", bytes.len(), output);
    }

    info!("done in {:.3}s", start.elapsed().as_secs_f64());
    Ok(())
}
