mod common;

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;
use zipmount::time::FileAttributes;
use zipmount::{ArchiveBytes, CreateDisposition, FsError, MountOptions, OpenHandle, ZipFs};

fn mapped(entries: &[(&str, &[u8])], options: &MountOptions) -> (NamedTempFile, ZipFs) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&common::build(entries)).unwrap();
    file.flush().unwrap();

    let bytes = ArchiveBytes::map_file(file.path()).unwrap();
    let fs = ZipFs::open(bytes, options).unwrap();
    (file, fs)
}

#[test]
fn bridge_walks_a_mapped_archive() {
    let (_file, fs) = mapped(
        &[
            ("README.md", b"# zipmount\n"),
            ("src/lib.rs", b"pub mod fs;\n"),
            ("src/fs/mod.rs", b"// fs\n"),
        ],
        &MountOptions::default(),
    );

    let root = fs.create_file("\\", CreateDisposition::Open).unwrap();
    let mut rows = Vec::new();
    fs.find_files(&root, |row| rows.push(row)).unwrap();

    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["README.md", "src"]);
    assert_eq!(rows[0].stat.attributes, FileAttributes::NORMAL);
    assert_eq!(rows[0].stat.size, 11);
    assert_eq!(
        rows[0].stat.last_write_filetime,
        zipmount::time::to_filetime(common::MTIME)
    );
    assert!(rows[1].stat.is_directory());

    let lib = fs.create_file("\\src\\lib.rs", CreateDisposition::Open).unwrap();
    assert!(matches!(lib, OpenHandle::File { .. }));
    let mut buf = [0u8; 64];
    let n = fs.read_file(&lib, 0, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"pub mod fs;\n");

    let info = fs.file_information(&lib).unwrap();
    assert_eq!(info.size, 12);
    assert!(!info.is_directory());
}

#[test]
fn writes_are_refused() {
    let (_file, fs) = mapped(&[("a.txt", b"a")], &MountOptions::default());

    assert!(matches!(
        fs.create_file("new.txt", CreateDisposition::CreateNew),
        Err(FsError::AccessDenied)
    ));
    assert!(matches!(
        fs.create_file("a.txt", CreateDisposition::TruncateExisting),
        Err(FsError::AccessDenied)
    ));
    assert!(matches!(
        fs.create_file("a.txt", CreateDisposition::CreateNew),
        Err(FsError::FileExists)
    ));
}

#[test]
fn cache_capacity_is_respected() {
    let entries: Vec<(String, Vec<u8>)> = (0..10)
        .map(|i| (format!("f{i}.txt"), format!("body {i}").into_bytes()))
        .collect();
    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(n, b)| (n.as_str(), b.as_slice()))
        .collect();
    let (_file, fs) = mapped(&borrowed, &MountOptions { cache_capacity: 3 });

    for i in 0..fs.archive().entry_count() {
        fs.read(i, 0, 64).unwrap();
        assert!(fs.cache().len() <= 3);
    }
    assert!(!fs.cache().contains(0));
    assert!(fs.cache().contains(9));
}

#[test]
fn session_is_shareable_across_threads() {
    let entries: Vec<(String, Vec<u8>)> = (0..32)
        .map(|i| (format!("dir{}/f{i}", i % 4), vec![i as u8; 1000 + i]))
        .collect();
    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(n, b)| (n.as_str(), b.as_slice()))
        .collect();
    let (_file, fs) = mapped(&borrowed, &MountOptions { cache_capacity: 5 });
    let fs = Arc::new(fs);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let fs = Arc::clone(&fs);
            std::thread::spawn(move || {
                for round in 0..50 {
                    let i = (round * 7 + t) % 32;
                    let path = format!("dir{}/f{i}", i % 4);
                    let zipmount::ResolvedNode::RealEntry(index) = fs.locate(&path) else {
                        panic!("{path} should resolve");
                    };
                    let body = fs.read(index, 0, usize::MAX).unwrap();
                    assert_eq!(body, vec![i as u8; 1000 + i]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(fs.cache().len() <= 5);
}

#[test]
fn marker_directory_stat_matches_listing() {
    let (_file, fs) = mapped(&[("d/", b""), ("d/x", b"x")], &MountOptions::default());

    let d = fs.create_file("d", CreateDisposition::Open).unwrap();
    let info = fs.file_information(&d).unwrap();
    assert!(info.is_directory());
    assert_eq!(info.last_write_filetime, zipmount::time::to_filetime(common::MTIME));

    let root = fs.create_file("\\", CreateDisposition::Open).unwrap();
    let mut rows = Vec::new();
    fs.find_files(&root, |row| rows.push(row)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stat, info);
}
