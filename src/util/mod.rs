//! Small helpers shared by the list, palette and UI layers.

mod panic;
mod text;
mod time;

pub use panic::{catch_task_panic, panic_message};
pub use text::{display_width, format_duration, sanitize_line, truncate_to_width};
pub use time::relative_age;
