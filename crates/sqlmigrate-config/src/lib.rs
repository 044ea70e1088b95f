pub mod loader;
pub mod model;

pub use loader::ConfigLoader;
pub use model::{DEFAULT_DIR, DEFAULT_TABLE, MigrateConfig, RollbackMode, validate_identifier};
