//! rwb-core: content catalog and save backups for Train Simulator Classic
//!
//! This crate focuses on a small, well-factored surface:
//! - Display-name resolution from Route/ScenarioProperties.xml (names)
//! - Timestamped backups of a scenario's CurrentSave.bin (backups)
//! - Route/scenario catalog built from an installation (catalog)
//! - Persisted settings and installation discovery (config, install)
//!
pub mod backups;
pub mod catalog;
pub mod config;
pub mod error;
pub mod install;
pub mod names;

pub use backups::{create_backup, delete_backup, list_backups, restore_backup};
pub use catalog::{Catalog, Route, Scenario, scan_catalog};
pub use config::{Config, ConfigStore};
pub use error::{BackupError, CatalogError, ConfigError, NameError};
pub use install::detect_installation;
pub use names::resolve_display_name;
