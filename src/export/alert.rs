use std::sync::{Arc, Mutex};

/// Blocking, user-visible message.
pub trait Alert: Send {
    fn alert(&mut self, message: &str);
}

/// Reports alerts through the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAlert;

impl Alert for LogAlert {
    fn alert(&mut self, message: &str) {
        tracing::error!(target: "birthday_card::alert", "{message}");
    }
}

/// Keeps every message; clones share the list.
#[derive(Clone, Debug, Default)]
pub struct RecordingAlert {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl Alert for RecordingAlert {
    fn alert(&mut self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(message.to_string());
    }
}
