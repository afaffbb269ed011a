//! Extract only specific entries from a ZIP archive.
//!
//! This example demonstrates selective extraction:
//! - Extracting everything
//! - Extracting by extension with a closure selector
//! - Extracting a fixed set of names
//! - Extracting one entry by path
//!
//! # Usage
//!
//! ```bash
//! cargo run --example extract_selective -- archive.zip ./output
//! ```

use parzip::{Entry, ExtractOptions, Result, SelectByName, ZipUnarchiver};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <archive.zip> <output_dir>", args[0]);
        std::process::exit(1);
    }

    let archive = &args[1];
    let output = Path::new(&args[2]);
    let options = ExtractOptions::default();

    // Everything.
    println!("Extracting all entries...");
    let result = ZipUnarchiver::new(archive)
        .dest_dir(output.join("all"))
        .extract((), &options)?;
    println!("  {} entries extracted", result.entries_written);

    // Text files only, via a closure selector.
    println!("Extracting .txt entries...");
    let result = ZipUnarchiver::new(archive)
        .dest_dir(output.join("txt_only"))
        .extract(
            |e: &Entry| e.is_file() && e.name.as_str().ends_with(".txt"),
            &options,
        )?;
    println!("  {} entries extracted", result.entries_written);

    // A fixed set of names.
    println!("Extracting named entries...");
    let result = ZipUnarchiver::new(archive)
        .dest_dir(output.join("named"))
        .extract(SelectByName::new(["readme.txt", "data/pattern.bin"]), &options)?;
    println!("  {} entries extracted", result.entries_written);

    // One entry by path.
    println!("Extracting a single entry...");
    match ZipUnarchiver::new(archive)
        .dest_dir(output.join("single"))
        .extract_path("readme.txt", &options)
    {
        Ok(result) => println!("  {} entry extracted", result.entries_written),
        Err(err) => println!("  not extracted: {err}"),
    }

    println!();
    println!("Done.");
    Ok(())
}
