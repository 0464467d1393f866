// tests/integration/error_handling.rs

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use datahook::config::load_and_validate;
use datahook::errors::DatahookError;
use datahook::fs::mock::MockFileSystem;
use datahook::watch::resolver_for_target;

#[test]
fn test_conflicting_target_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[target]
path = "/tmp/hook.dat"
install_dir = "/games/app"
datafile = "hook.dat"
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(DatahookError::ConfigError(msg)) => {
            assert!(msg.contains("path"));
            assert!(msg.contains("install_dir"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_retry_bound_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[read]\nretries = 65\n").unwrap();

    match load_and_validate(file.path()) {
        Err(DatahookError::ConfigError(msg)) => assert!(msg.contains("65")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_key_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[poll]\nintervall_ms = 10\n").unwrap();

    match load_and_validate(file.path()) {
        Err(DatahookError::TomlError(e)) => assert!(e.to_string().contains("intervall_ms")),
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Datahook.toml"));
    assert!(matches!(result, Err(DatahookError::IoError(_))));
}

#[test]
fn test_unresolvable_install_dir_is_path_resolution_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "[target]\ninstall_dir = \"/not/installed\"\ndatafile = \"hook.dat\"\n"
    )
    .unwrap();
    let cfg = load_and_validate(file.path()).unwrap();

    let fs = MockFileSystem::new();
    let resolver = resolver_for_target(&fs, &cfg.target, None).unwrap();
    match resolver.resolve() {
        Err(DatahookError::PathResolution(msg)) => assert!(msg.contains("not/installed")),
        other => panic!("Expected PathResolution, got: {:?}", other),
    }

    // --path bypasses the installation lookup entirely.
    let resolver = resolver_for_target(&fs, &cfg.target, Some(Path::new("/x/hook.dat"))).unwrap();
    assert_eq!(resolver.resolve().unwrap(), Path::new("/x/hook.dat"));
}

#[test]
fn test_codec_errors_are_classified() {
    assert!(DatahookError::MissingMeta.is_codec_error());
    assert!(DatahookError::MissingChunk { index: 2 }.is_codec_error());
    assert!(!DatahookError::WatcherClosed.is_codec_error());
    assert!(!DatahookError::PathResolution("x".into()).is_codec_error());
}
