pub mod log;
pub mod person;
pub mod task;

pub use log::CompletionLog;
pub use person::{Person, person_label};
pub use task::{Frequency, Task};
