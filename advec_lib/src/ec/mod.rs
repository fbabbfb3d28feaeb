//! Talk to the Advantech AHC1EC0 embedded controller over its command/data port pair
//!
//! Everything the EC offers is reached through the same two-port handshake:
//! - Internal RAM, including the SMBus proxy cells
//! - ACPI shadow RAM
//! - GPIO status and direction
//! - AD channels
//! - One Key Recovery flags and OEM status bytes
//! - The dynamic pin/device table
//!
//! All access goes through [`Ec`], which owns the port and the lock that
//! serializes every port sequence.

use alloc::string::{String, ToString};

#[cfg(feature = "raw_pio")]
pub mod portio;
pub mod protocol;
pub mod ram;
pub mod registers;
#[cfg(test)]
pub(crate) mod sim;
pub mod smbus;
pub mod table;
pub mod transaction;

use protocol::*;
use table::DynamicTable;
use transaction::PortInterface;

/// What the host was waiting for when it gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitFor {
    /// IBF to clear, the EC didn't consume the last byte
    InputBufferClear,
    /// OBF to be set, the EC didn't produce a result byte
    OutputBufferFull,
    /// EC_SMBUS_PROTOCOL to read back 0
    SmbusIdle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcError {
    /// A poll bound was exhausted. Chip unresponsive or protocol out of sync
    Timeout(WaitFor),
    /// The EC answered 0xFF for this GPIO pin or AD channel
    InvalidTarget(u8),
    /// The SMBus proxy finished with a status other than EC_SMBUS_STATUS_DONE
    SmbusError(u8),
    /// The dynamic table has no item at this index
    InvalidTable(usize),
    /// Failed to get access to the port pair
    DeviceError(String),
}
pub type EcResult<T> = Result<T, EcError>;

/// Raw access to the two EC ports
///
/// Implementations do no waiting and no locking, that's done on top.
pub trait EcPort: Send {
    /// Read the status byte from the command port
    fn read_status(&mut self) -> u8;
    fn write_command(&mut self, command: u8);
    fn read_data(&mut self) -> u8;
    fn write_data(&mut self, data: u8);
}

/// Bound for a busy-wait loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// How many times to check before giving up
    pub max_attempts: u32,
    /// Delay between two checks, in microseconds. 0 means no delay
    pub interval_us: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            max_attempts: EC_MAX_TIMEOUT_COUNT,
            interval_us: EC_UDELAY_TIME,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EcConfig {
    /// Bound for waiting on IBF/OBF
    pub poll: PollConfig,
    /// Bound for waiting on the SMBus proxy to go idle
    pub smbus_poll: PollConfig,
}

/// An attached EC
///
/// Created once with [`Ec::attach`], dropping it detaches.
pub struct Ec {
    port: PortInterface,
    smbus_poll: PollConfig,
    table: DynamicTable,
    table_result: EcResult<()>,
    product_name: String,
}

impl Ec {
    /// Take ownership of the port pair and read the dynamic table
    ///
    /// A table that ends early is not fatal, the entries up to that point are
    /// kept and [`Ec::table_result`] reports where it stopped. If the EC
    /// doesn't respond at all, attaching fails.
    pub fn attach(port: Box<dyn EcPort>, config: &EcConfig, product_name: &str) -> EcResult<Ec> {
        let port = PortInterface::new(port, config.poll);

        let mut table = DynamicTable::new();
        let table_result = table.discover(&mut port.lock());
        match &table_result {
            Ok(()) => debug!("Dynamic table complete"),
            Err(EcError::InvalidTable(index)) => {
                warn!("Dynamic table ends at item {}", index)
            }
            Err(err) => {
                error!("Failed to read dynamic table: {:?}", err);
                return Err(err.clone());
            }
        }

        info!("Attached EC of {:?}", product_name);
        Ok(Ec {
            port,
            smbus_poll: config.smbus_poll,
            table,
            table_result,
            product_name: product_name.to_string(),
        })
    }

    pub fn detach(self) {
        info!("Detached EC of {:?}", self.product_name);
    }

    /// Product name the EC was attached with, for diagnostics only
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn dynamic_table(&self) -> &DynamicTable {
        &self.table
    }

    /// Outcome of the table scan done at attach time
    pub fn table_result(&self) -> &EcResult<()> {
        &self.table_result
    }
}

/// Print the error and turn the result into an Option
pub fn print_err<T>(something: EcResult<T>) -> Option<T> {
    match something {
        Ok(x) => Some(x),
        Err(err) => {
            println!("Error: {:?}", err);
            None
        }
    }
}
