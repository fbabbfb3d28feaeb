//! Port handshake primitives and the lock that serializes them
//!
//! The port pair has no framing. If two sequences interleave their bytes the
//! EC silently works on garbage. So every sequence runs on a [`Transaction`],
//! which can only be had by locking the [`PortInterface`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::Level;

use crate::ec::protocol::*;
use crate::ec::{EcError, EcPort, EcResult, PollConfig, WaitFor};
use crate::os_specific;

/// Owns the port pair. The only way to the ports is through [`PortInterface::lock`]
pub struct PortInterface {
    port: Mutex<Box<dyn EcPort>>,
    poll: PollConfig,
}

impl PortInterface {
    pub fn new(port: Box<dyn EcPort>, poll: PollConfig) -> Self {
        PortInterface {
            port: Mutex::new(port),
            poll,
        }
    }

    /// Block until no other sequence is running on the ports
    pub fn lock(&self) -> Transaction<'_> {
        // A panic mid-sequence leaves the EC no worse off than a timeout does
        let port = self.port.lock().unwrap_or_else(PoisonError::into_inner);
        Transaction {
            port,
            poll: self.poll,
        }
    }
}

/// Exclusive use of the port pair. Released when dropped
pub struct Transaction<'a> {
    port: MutexGuard<'a, Box<dyn EcPort>>,
    poll: PollConfig,
}

impl Transaction<'_> {
    fn poll_status(&mut self, wait_for: WaitFor, ready: impl Fn(u8) -> bool) -> EcResult<()> {
        for _ in 0..self.poll.max_attempts {
            if ready(self.port.read_status()) {
                return Ok(());
            }
            if self.poll.interval_us > 0 {
                os_specific::sleep(self.poll.interval_us);
            }
        }

        warn!(
            "Waited {} times for {:?}, giving up",
            self.poll.max_attempts, wait_for
        );
        Err(EcError::Timeout(wait_for))
    }

    /// Wait until the EC has consumed the last byte written to it
    pub fn wait_ibf(&mut self) -> EcResult<()> {
        self.poll_status(WaitFor::InputBufferClear, |status| {
            status & EC_STATUS_IBF == 0
        })
    }

    /// Wait until the EC has a result byte ready
    pub fn wait_obf(&mut self) -> EcResult<()> {
        self.poll_status(WaitFor::OutputBufferFull, |status| {
            status & EC_STATUS_OBF != 0
        })
    }

    /// Write a byte to the command port, once the EC is ready for it
    pub fn send_command(&mut self, command: u8) -> EcResult<()> {
        self.wait_ibf()?;
        if log_enabled!(Level::Trace) {
            trace!("  Command: {:#04X}", command);
        }
        self.port.write_command(command);
        Ok(())
    }

    /// Write a byte to the data port, once the EC is ready for it
    pub fn send_data(&mut self, data: u8) -> EcResult<()> {
        self.wait_ibf()?;
        if log_enabled!(Level::Trace) {
            trace!("  Data:    {:#04X}", data);
        }
        self.port.write_data(data);
        Ok(())
    }

    /// Read a byte from the data port, once the EC has produced it
    pub fn receive_data(&mut self) -> EcResult<u8> {
        self.wait_obf()?;
        let data = self.port.read_data();
        if log_enabled!(Level::Trace) {
            trace!("  Read:    {:#04X}", data);
        }
        Ok(data)
    }
}
