//! Minimal command-line entry point: with no arguments, writes a sample
//! archive to `testzip.zip`; with one argument, opens that path and lists
//! its entries.

use std::fs::File;
use std::process::ExitCode;

use zipkit::{Archive, OpenMode, OpenSource};

fn main() -> ExitCode {
    stderrlog::new().verbosity(2).init().expect("logger already initialized");

    let args: Vec<String> = std::env::args().collect();
    let result = match args.len() {
        1 => write_sample_archive(),
        2 => list_archive(&args[1]),
        _ => {
            eprintln!("usage: {} [archive.zip]", args.first().map(String::as_str).unwrap_or("zipkit"));
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn write_sample_archive() -> zipkit::Result<()> {
    let mut archive = Archive::new();
    archive.add_data("foobar/test.txt", b"TestData")?;

    let mut file = File::create("testzip.zip")?;
    let bytes = archive.write_archive(&mut zipkit::sink::CountingWriter::new(&mut file))?;
    log::info!("wrote testzip.zip ({bytes} bytes, {} entries)", archive.number_of_entries());
    Ok(())
}

fn list_archive(path: &str) -> zipkit::Result<()> {
    let archive = Archive::open(OpenSource::Path(path.into()), OpenMode::ReadOnly)?;
    log::info!("{} ({} entries)", path, archive.number_of_entries());
    for entry in archive.entries() {
        println!("{}", entry.name_lossy());
    }
    Ok(())
}
