//! Create a ZIP archive from a directory tree.
//!
//! This example demonstrates basic archive creation:
//! - Archiving a directory with the parallel engine
//! - Picking a thread count
//! - Reading the result statistics
//!
//! # Usage
//!
//! ```bash
//! cargo run --example create_archive -- output.zip ./some/directory
//! ```

use parzip::{ArchiveOptions, DirectorySource, MemorySource, Result, ZipArchiver};
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <output.zip> [source_dir]", args[0]);
        eprintln!();
        eprintln!("Archives the source directory into output.zip.");
        eprintln!("If no directory is given, a small demo archive is created.");
        std::process::exit(1);
    }

    let output = &args[1];
    let archiver = ZipArchiver::new(output);
    let options = ArchiveOptions::default();

    println!("Creating archive: {output}");
    let result = match args.get(2) {
        Some(source_dir) => {
            println!("Archiving directory: {source_dir}");
            archiver.archive(DirectorySource::new(source_dir), &options)?
        }
        None => {
            println!("No source directory given, archiving demo content...");
            let source = MemorySource::new()
                .file("readme.txt", "Welcome to parzip!\n")?
                .directory("data")?
                .file("data/zeros.bin", vec![0u8; 4096])?
                .file(
                    "data/pattern.bin",
                    (0..10_000u32).map(|i| (i % 256) as u8).collect::<Vec<_>>(),
                )?;
            archiver.archive(source, &options)?
        }
    };

    println!();
    println!("Archive created.");
    println!("  Entries written: {}", result.entries_written);
    println!("  Entries skipped: {}", result.entries_skipped);
    println!("  Bytes processed: {}", result.bytes_processed);
    println!("  Worker threads:  {}", result.threads_used);

    Ok(())
}
