// tests/integration/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

use datahook::config::{load_and_validate, load_or_default};
use datahook_test_utils::builders::ConfigFileBuilder;

#[test]
fn test_full_config_maps_to_watch_options() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[target]
path = "/srv/app/ot/scripts/hook.dat"

[poll]
missing_interval_ms = 100
present_interval_us = 50
deliver_initial = false
suppress_unchanged = false

[read]
retries = 8
backoff_us = 16

[codec]
chunk_size = 64
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.target.path, Some(PathBuf::from("/srv/app/ot/scripts/hook.dat")));

    let opts = cfg.watch_options();
    assert_eq!(opts.missing_interval, Duration::from_millis(100));
    assert_eq!(opts.present_interval, Duration::from_micros(50));
    assert_eq!(opts.read_retries, 8);
    assert_eq!(opts.read_backoff, Duration::from_micros(16));
    assert!(!opts.deliver_initial);
    assert!(!opts.suppress_unchanged);
    assert_eq!(opts.codec.chunk_size(), 64);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_or_default(dir.path().join("Datahook.toml")).unwrap();

    let opts = cfg.watch_options();
    assert_eq!(opts.missing_interval, Duration::from_secs(2));
    assert_eq!(opts.present_interval, Duration::from_micros(500));
    assert_eq!(opts.read_retries, 5);
    assert_eq!(opts.read_backoff, Duration::from_micros(4));
    assert_eq!(cfg.codec().chunk_size(), 250);
    assert_eq!(cfg.target.scripts_subdir, PathBuf::from("ot").join("scripts"));
}

#[test]
fn test_builder_matches_loaded_config() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "[target]\ninstall_dir = \"/games/app\"\ndatafile = \"hook.dat\"\n\n[read]\nretries = 2\n"
    )
    .unwrap();
    let loaded = load_and_validate(file.path()).unwrap();

    let built = ConfigFileBuilder::new()
        .with_install_dir("/games/app", "hook.dat")
        .with_read_retries(2)
        .build();

    assert_eq!(loaded.target.install_dir, built.target.install_dir);
    assert_eq!(loaded.target.datafile, built.target.datafile);
    assert_eq!(loaded.read.retries, built.read.retries);
}
