// src/config/mod.rs

//! Configuration loading and validation for datahook.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate value ranges and the `[target]` shape (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{CodecSection, ConfigFile, PollSection, RawConfigFile, ReadSection, TargetSection};
pub use validate::validate_config;
