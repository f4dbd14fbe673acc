pub mod timer;

pub use timer::{TimerService, TimerView};
