// tests/integration/fs_abstraction.rs

use std::path::{Path, PathBuf};

use datahook::codec::DataFileCodec;
use datahook::fs::FileSystem;
use datahook::fs::mock::MockFileSystem;
use datahook::types::Direction;
use datahook::watch::resolver_for_target;
use datahook_test_utils::builders::{ConfigFileBuilder, DataFileBuilder};

#[test]
fn test_mock_fs_install_dir_resolution() {
    let fs = MockFileSystem::new();
    fs.add_dir("/games/app");

    let cfg = ConfigFileBuilder::new()
        .with_install_dir("/games/app", "hook.dat")
        .build();
    let path = resolver_for_target(&fs, &cfg.target, None)
        .unwrap()
        .resolve()
        .unwrap();

    assert_eq!(path, PathBuf::from("/games/app/ot/scripts/hook.dat"));
}

#[test]
fn test_mock_fs_serialize_into_existing_file() {
    let fs = MockFileSystem::new();
    fs.add_dir("/games/app/ot/scripts");
    let path = Path::new("/games/app/ot/scripts/hook.dat");
    fs.add_file(
        path,
        DataFileBuilder::new()
            .key("player", "alice")
            .outbound(r#"{"hp":100}"#)
            .build(),
    );

    let codec = DataFileCodec::default();
    let existing = fs.read(path).unwrap();
    let updated = codec
        .serialize(&r#"{"cmd":"heal"}"#.into(), Some(&existing))
        .unwrap();
    fs.write_atomic(path, &updated).unwrap();

    let on_disk = fs.contents(path).unwrap();
    assert_eq!(codec.parse(&on_disk).unwrap().as_bytes(), br#"{"hp":100}"#);
    assert_eq!(
        codec.parse_as(&on_disk, Direction::Inbound).unwrap().as_bytes(),
        br#"{"cmd":"heal"}"#
    );
    assert_eq!(fs.write_count(), 1);
}

#[test]
fn test_mock_fs_mtime_is_monotonic() {
    let fs = MockFileSystem::new();
    fs.add_dir("/d");
    let path = Path::new("/d/hook.dat");
    assert_eq!(fs.modified(path).unwrap(), None);

    fs.add_file(path, "a");
    let first = fs.modified(path).unwrap().unwrap();
    fs.write_atomic(path, b"b").unwrap();
    let second = fs.modified(path).unwrap().unwrap();
    assert!(second > first);

    fs.remove_file(path);
    assert!(!fs.exists(path));
    assert!(fs.is_dir(Path::new("/d")));
}
