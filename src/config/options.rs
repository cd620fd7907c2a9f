use std::time::Duration;

/// Timing knobs for the port, reader task and auto-reply.
#[derive(Debug, Clone, Copy)]
pub struct LinkOptions {
    /// Upper bound on a single blocking read
    pub read_timeout: Duration,
    /// Idle time between reader polls
    pub poll_interval: Duration,
    /// Wait between a device prompt and the automatic answer
    pub reply_delay: Duration,
    pub read_buffer_size: usize,
    pub event_capacity: usize,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
            reply_delay: Duration::from_millis(100),
            read_buffer_size: 1024,
            event_capacity: 256,
        }
    }
}
