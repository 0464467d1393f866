mod config_loading;
mod error_handling;
mod fs_abstraction;
