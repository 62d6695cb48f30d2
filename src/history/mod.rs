//! Run history for undo.
//!
//! - `entry`: persisted run and move records
//! - `store`: the per-folder history file
//! - `undo`: reverting the newest run

mod entry;
mod store;
mod undo;

pub use entry::*;
pub use store::*;
pub use undo::*;
