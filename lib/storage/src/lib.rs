//! Storage for tastematch: input table loading and snapshot files.

pub mod snapshot;
pub mod tables;

pub use snapshot::{SnapshotDescription, SnapshotManager};
pub use tables::{load_items, load_reviews, load_scene_table, load_table, Table, TableFormat};
