//! Configuration loading and credential persistence
//!
//! `loader` reads the application config from environment variables and
//! files; `credentials` owns the per-platform credential document.

pub mod credentials;
pub mod loader;

// Re-export commonly used items
pub use credentials::CredentialStore;
pub use loader::{load, load_from_env, load_from_file, discover_config_paths};
