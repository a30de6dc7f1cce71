use std::fs::File;
use std::process::Command;

use tempfile::tempdir;
use zipkit::sink::CountingWriter;
use zipkit::Archive;

/// Writes a ZIP using the library and then calls `unzip -t` to verify
/// compatibility with a real-world tool's reader. Skipped if `unzip` isn't
/// on the system.
#[test]
fn unzip_compatibility() {
    let check = Command::new("unzip").arg("-v").output();
    if check.is_err() {
        eprintln!("skipping test: `unzip` not found");
        return;
    }

    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("compat.zip");

    let mut archive = Archive::new();
    archive.add_data("hello.txt", b"hello from test").unwrap();
    let mut big = Vec::new();
    for _ in 0..1024 {
        big.extend_from_slice(&[0u8; 1024]);
    }
    archive.add_data("big.bin", &big).unwrap();

    let file = File::create(&zip_path).unwrap();
    archive.write_archive(&mut CountingWriter::new(file)).unwrap();

    let output = Command::new("unzip").arg("-t").arg(&zip_path).output().expect("failed to run unzip");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "unzip reported failure: {} {}", stdout, stderr);
}

/// Round-trips a multi-entry archive through an actual file on disk, using
/// `Archive::open_path` rather than `open_memory` to exercise `FileSource`.
#[test]
fn file_backed_round_trip() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("roundtrip.zip");

    let mut archive = Archive::new();
    archive.add_data("dir/a.txt", b"alpha").unwrap();
    archive.add_data("dir/b.txt", b"beta").unwrap();
    archive.set_comment("archive comment");

    let file = File::create(&zip_path).unwrap();
    archive.write_archive(&mut CountingWriter::new(file)).unwrap();

    let reopened = Archive::open_path(&zip_path, zipkit::OpenMode::ReadOnly).unwrap();
    assert_eq!(reopened.comment(), b"archive comment");
    assert!(reopened.has_entry("dir/a.txt"));
    assert!(reopened.has_entry("dir/b.txt"));
    assert!(reopened.has_entry("dir/"));

    let mut out = Vec::new();
    reopened.get_entry("dir/a.txt").unwrap().read_content(&mut out).unwrap();
    assert_eq!(out, b"alpha");
}
