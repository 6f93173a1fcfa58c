//! Scripted reply link
//!
//! A [`ScriptedLink`] answers each command line from a fixed table and
//! records every line it was sent. Lines without an entry time out, as a
//! silent instrument would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use p9710_protocol::{LineLink, TransportError};

/// Link that replies from a command table
#[derive(Debug, Clone)]
pub struct ScriptedLink {
    port: String,
    replies: HashMap<String, String>,
    sent: Arc<Mutex<Vec<String>>>,
    open: bool,
    pending: Option<String>,
}

impl ScriptedLink {
    /// Create an empty script
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            replies: HashMap::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
            open: false,
            pending: None,
        }
    }

    /// Add a reply for a command line (builder style)
    pub fn reply(mut self, command: impl Into<String>, reply: impl Into<String>) -> Self {
        self.replies.insert(command.into(), reply.into());
        self
    }

    /// Shared log of every line written, in order
    pub fn sent_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.sent)
    }

    fn lock_sent(&self) -> MutexGuard<'_, Vec<String>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LineLink for ScriptedLink {
    fn port_name(&self) -> &str {
        &self.port
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> Result<(), TransportError> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.open = false;
        self.pending = None;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        self.lock_sent().push(line.to_string());
        self.pending = self.replies.get(line).cloned();
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        self.pending
            .take()
            .ok_or(TransportError::Timeout(timeout.as_millis() as u64))
    }
}
