//! Plain data shared between the pipeline stages.

mod events;
mod file;
mod stats;

pub use events::*;
pub use file::*;
pub use stats::*;
