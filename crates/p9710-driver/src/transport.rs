//! Request/response session over a [`LineLink`]
//!
//! Every command runs as a full cycle: open the line, write the command,
//! read one reply line, close the line, then wait the settle delay. Some
//! serial stacks corrupt the next open when a port is reopened right after
//! closing, so the delay is paid after every command, queries included.
//!
//! Failures anywhere in the cycle are logged and replaced by
//! [`SENTINEL_REPLY`]; reply parsers downstream turn that into `NaN`, an
//! empty string or an unknown range.

use std::time::Duration;

use p9710_protocol::{Command, LineLink, TransportError, SENTINEL_REPLY};
use tracing::{debug, trace, warn};

use crate::config::SessionConfig;

/// Anything that can answer a command with a reply line
pub trait Query {
    /// Run `command` and return the reply text
    fn query(&mut self, command: Command) -> String;
}

impl<F> Query for F
where
    F: FnMut(Command) -> String,
{
    fn query(&mut self, command: Command) -> String {
        self(command)
    }
}

/// An owned line plus the pacing rules for using it
pub struct TransportSession {
    link: Box<dyn LineLink>,
    read_timeout: Duration,
    settle_delay: Duration,
}

impl TransportSession {
    /// Create a session over `link`
    pub fn new(link: Box<dyn LineLink>, read_timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            link,
            read_timeout,
            settle_delay,
        }
    }

    /// Create a session with the timing from `config`
    pub fn from_config(link: Box<dyn LineLink>, config: &SessionConfig) -> Self {
        Self::new(link, config.read_timeout(), config.settle_delay())
    }

    /// Name of the port behind this session
    pub fn port_name(&self) -> &str {
        self.link.port_name()
    }

    /// Reply deadline
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Pause after each close
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Run one raw command line and return its reply or the sentinel
    pub fn execute(&mut self, line: &str) -> String {
        let reply = match self.exchange(line) {
            Ok(reply) => {
                debug!("{} <- {:?} -> {:?}", self.link.port_name(), line, reply);
                reply
            }
            Err(e) => {
                warn!("{}: {:?} failed: {}", self.link.port_name(), line, e);
                SENTINEL_REPLY.to_string()
            }
        };

        if let Err(e) = self.link.close() {
            warn!("{}: close failed: {}", self.link.port_name(), e);
        }
        if !self.settle_delay.is_zero() {
            trace!("Settling {:?}", self.settle_delay);
            std::thread::sleep(self.settle_delay);
        }

        reply
    }

    fn exchange(&mut self, line: &str) -> Result<String, TransportError> {
        if !self.link.is_open() {
            self.link.open()?;
        }
        self.link.write_line(line)?;
        self.link.read_line(self.read_timeout)
    }
}

impl Query for TransportSession {
    fn query(&mut self, command: Command) -> String {
        self.execute(&command.encode())
    }
}
