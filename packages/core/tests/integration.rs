//! End-to-end scenarios against real files in a scratch directory.

use modefile_core::{
    Content, Error, FileHandle, Mode, ReadOptions, Registry, TextEncoding, WriteOptions,
    WriteWarning,
};
use tempfile::TempDir;

fn mode(token: &str) -> Mode {
    token.parse().unwrap()
}

#[test]
fn every_write_mode_round_trips() {
    let dir = TempDir::new().unwrap();

    for token in ["a", "w", "ab", "wb", "a+", "w+", "ab+", "wb+"] {
        let path = dir.path().join(format!("round-trip-{}", token.replace('+', "plus")));
        let write_mode = mode(token);

        let mut handle = FileHandle::open(&path, write_mode).unwrap();
        handle.write("Hello", WriteOptions::default()).unwrap();
        handle.seek(0).unwrap();

        if !write_mode.supports_read() {
            handle
                .change_mode(Mode::READ.with_binary(write_mode.is_binary()))
                .unwrap();
        }

        let expected = if write_mode.is_binary() {
            Content::Bytes(b"Hello".to_vec())
        } else {
            Content::Text("Hello".to_string())
        };
        assert_eq!(handle.read_to_end().unwrap(), expected, "mode {}", token);
    }
}

#[test]
fn switching_from_read_to_append_and_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("story.txt");
    std::fs::write(&path, "Hello, World!").unwrap();

    for token in ["r", "rb"] {
        let mut handle = FileHandle::open(&path, mode(token)).unwrap();
        let before = handle.read_to_end().unwrap();

        handle.change_mode(mode("a")).unwrap();
        handle
            .write(" Changing contents...", WriteOptions::default())
            .unwrap();
        handle.change_mode(mode("r")).unwrap();

        let after = handle.read_to_end().unwrap();
        assert_ne!(after, before);
        assert!(after.as_text().unwrap().ends_with("Changing contents..."));
    }
}

#[test]
fn same_mode_change_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stable.txt");
    std::fs::write(&path, "unchanged").unwrap();

    for token in ["r", "rb", "r+", "a+"] {
        let mut handle = FileHandle::open(&path, mode(token)).unwrap();
        let first = handle.read(ReadOptions::all().at(0)).unwrap();

        handle.change_mode(mode(token)).unwrap();
        assert_eq!(handle.mode(), mode(token));
        let second = handle.read(ReadOptions::all().at(0)).unwrap();
        assert_eq!(first, second, "mode {}", token);
    }
}

#[test]
fn same_mode_change_keeps_content_of_truncating_modes() {
    let dir = TempDir::new().unwrap();

    for token in ["w+", "wb+"] {
        let path = dir.path().join(format!("rewritten-{}", token.replace('+', "plus")));
        let mut handle = FileHandle::open(&path, mode(token)).unwrap();
        handle.write(b"Hello".to_vec(), WriteOptions::default()).unwrap();
        let before = handle.read(ReadOptions::all().at(0)).unwrap();

        handle.change_mode(mode(token)).unwrap();
        let after = handle.read(ReadOptions::all().at(0)).unwrap();

        assert_eq!(before, after, "mode {}", token);
        assert_eq!(std::fs::read(&path).unwrap(), b"Hello");
    }

    let path = dir.path().join("write-only.txt");
    let mut handle = FileHandle::open(&path, mode("w")).unwrap();
    handle.write("kept", WriteOptions::default()).unwrap();
    handle.change_mode(mode("w")).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept");

    handle.change_mode(mode("w+")).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn retargeting_between_files() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");

    let mut handle = FileHandle::open(&first, mode("w")).unwrap();
    handle.write("Hello, World!", WriteOptions::default()).unwrap();
    handle.rename(&second, true).unwrap();
    handle.write("Hello, World!", WriteOptions::default()).unwrap();
    handle.change_mode(mode("r")).unwrap();

    let from_second = handle.read_to_end().unwrap();
    handle.rename(&first, false).unwrap();
    let from_first = handle.read_to_end().unwrap();

    assert_eq!(from_first, from_second);
}

#[test]
fn writing_and_reading_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lines.txt");
    let lines = vec!["Hello\n".to_string(), "World!".to_string()];

    let mut handle = FileHandle::open(&path, mode("w")).unwrap();
    handle
        .write(lines.clone(), WriteOptions::default().lines())
        .unwrap();
    handle.change_mode(mode("r")).unwrap();

    assert_eq!(
        handle.read(ReadOptions::all().lines()).unwrap(),
        Content::Lines(lines)
    );
}

#[test]
fn binary_bytes_into_text_handle_fall_back_to_base64() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fallback.txt");

    let mut handle = FileHandle::open(&path, mode("w")).unwrap();
    let report = handle
        .write(vec![0xffu8, 0xfe, 0x00], WriteOptions::default())
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(
        &report.warnings[0],
        WriteWarning::EncodingFallback {
            encoding: TextEncoding::Utf8,
            ..
        }
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "//4A");
}

#[test]
fn exclusive_handle_needs_explicit_mode_change() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("archive.bin");

    let mut handle = FileHandle::open(&path, mode("xb")).unwrap();
    assert_eq!(handle.mode(), mode("rb"));
    assert!(matches!(
        handle.write(vec![1u8, 2, 3], WriteOptions::default()),
        Err(Error::UnsupportedOperation { .. })
    ));

    handle.change_mode(mode("wb+")).unwrap();
    handle.write(vec![1u8, 2, 3], WriteOptions::default()).unwrap();
    handle.seek(0).unwrap();
    assert_eq!(
        handle.read_to_end().unwrap().as_bytes(),
        Some(&[1u8, 2, 3][..])
    );

    assert!(matches!(
        FileHandle::open(&path, mode("x")),
        Err(Error::AlreadyExists { .. })
    ));
}

#[test]
fn registry_manages_many_files() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<_> = (0..3)
        .map(|i| dir.path().join(format!("file-{}.txt", i)))
        .collect();

    let mut registry: Registry<u32> = Registry::new();
    registry
        .open_many(&paths, &[mode("w+"), mode("w+"), mode("w+")], &[10, 20, 30])
        .unwrap();

    registry
        .write_many(
            &[10, 20, 30],
            vec!["ten".into(), "twenty".into(), "thirty".into()],
            WriteOptions::default(),
        )
        .unwrap();

    assert_eq!(
        registry.read_from(&20, ReadOptions::all().at(0)).unwrap(),
        Content::Text("twenty".to_string())
    );

    assert!(registry.remove(&20).unwrap());
    assert!(registry.get(&20).is_none());
    assert_eq!(registry.len(), 2);

    drop(registry);
    assert_eq!(std::fs::read_to_string(&paths[2]).unwrap(), "thirty");
}
