//! Configuration loading
//!
//! Settings come from `GRAPHKIT_*` environment variables or a TOML/JSON file.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, load_or_default, probe_config_paths};
