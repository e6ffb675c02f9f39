// Replay log handed to participants that join after activity has started

pub use event_log::{EventLog, DEFAULT_MAX_HISTORY};

mod event_log;
