/// Narrow row-store abstraction over user-game entries and the catalog.
pub mod entry_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
