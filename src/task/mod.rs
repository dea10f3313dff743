//! Task and result records, and the source that feeds the pool

pub mod source;
pub mod types;

pub use source::{TaskSource, ValueRange};
pub use types::{Outcome, Task, TaskResult};
