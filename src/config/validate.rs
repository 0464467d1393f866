// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DatahookError, Result};

/// Upper bound on `[read].retries`, keeps a stalled writer from turning the
/// retry loop into a busy loop.
pub const MAX_READ_RETRIES: u32 = 64;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DatahookError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_target(cfg)?;
    validate_poll(cfg)?;
    validate_read(cfg)?;
    validate_codec(cfg)?;
    Ok(())
}

fn validate_target(cfg: &RawConfigFile) -> Result<()> {
    let target = &cfg.target;

    if target.path.is_some() && target.install_dir.is_some() {
        return Err(DatahookError::ConfigError(
            "[target] sets both `path` and `install_dir`; use one".to_string(),
        ));
    }

    if target.install_dir.is_some() && target.datafile.is_none() {
        return Err(DatahookError::ConfigError(
            "[target].install_dir requires [target].datafile".to_string(),
        ));
    }

    if let Some(name) = &target.datafile {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(DatahookError::ConfigError(format!(
                "[target].datafile must be a bare file name (got {name:?})"
            )));
        }
    }

    Ok(())
}

fn validate_poll(cfg: &RawConfigFile) -> Result<()> {
    if cfg.poll.missing_interval_ms == 0 {
        return Err(DatahookError::ConfigError(
            "[poll].missing_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.poll.present_interval_us == 0 {
        return Err(DatahookError::ConfigError(
            "[poll].present_interval_us must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_read(cfg: &RawConfigFile) -> Result<()> {
    let retries = cfg.read.retries;
    if retries == 0 || retries > MAX_READ_RETRIES {
        return Err(DatahookError::ConfigError(format!(
            "[read].retries must be between 1 and {MAX_READ_RETRIES} (got {retries})"
        )));
    }
    Ok(())
}

fn validate_codec(cfg: &RawConfigFile) -> Result<()> {
    if cfg.codec.chunk_size == 0 {
        return Err(DatahookError::ConfigError(
            "[codec].chunk_size must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
