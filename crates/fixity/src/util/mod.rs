pub mod format;
pub mod progress;

pub use format::{format_bytes, format_duration_ms, format_timestamp};
pub use progress::{create_progress_bar, create_spinner};
