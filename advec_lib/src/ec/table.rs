//! Dynamic pin/device table
//!
//! The EC firmware knows which of its HW pins drive which device (backlight,
//! EEPROM write protect, ...). The mapping is read once when attaching and
//! doesn't change afterwards.

use crate::ec::protocol::*;
use crate::ec::transaction::Transaction;
use crate::ec::{EcError, EcResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    pub device_id: u8,
    pub hw_pin_number: u8,
}

impl TableEntry {
    /// Slot that the EC didn't fill
    pub const UNDEFINED: TableEntry = TableEntry {
        device_id: EC_INVALID,
        hw_pin_number: EC_INVALID,
    };

    /// The EC marks a missing value with 0xFF, in either field
    pub fn is_defined(&self) -> bool {
        self.device_id != EC_INVALID && self.hw_pin_number != EC_INVALID
    }
}

impl Default for TableEntry {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicTable {
    entries: [TableEntry; EC_MAX_TBL_NUM],
}

impl Default for DynamicTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicTable {
    pub fn new() -> Self {
        DynamicTable {
            entries: [TableEntry::UNDEFINED; EC_MAX_TBL_NUM],
        }
    }

    /// All slots, including those the EC didn't fill
    pub fn entries(&self) -> &[TableEntry; EC_MAX_TBL_NUM] {
        &self.entries
    }

    /// Entry at `index`, if the EC filled it
    pub fn get(&self, index: usize) -> Option<&TableEntry> {
        self.entries.get(index).filter(|entry| entry.is_defined())
    }

    pub fn defined(&self) -> impl Iterator<Item = (usize, &TableEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_defined())
    }

    /// First entry for a device
    pub fn find(&self, device_id: u8) -> Option<&TableEntry> {
        self.defined()
            .map(|(_, entry)| entry)
            .find(|entry| entry.device_id == device_id)
    }

    /// HW pin number that a device is wired to
    pub fn pin_for_device(&self, device_id: u8) -> Option<u8> {
        self.find(device_id).map(|entry| entry.hw_pin_number)
    }

    /// Read the table from the EC, one slot after the other
    ///
    /// Stops at the first slot the EC doesn't know. Whatever was read until
    /// then is kept, the rest stays undefined.
    pub(crate) fn discover(&mut self, tx: &mut Transaction) -> EcResult<()> {
        self.entries = [TableEntry::UNDEFINED; EC_MAX_TBL_NUM];

        for (index, slot) in self.entries.iter_mut().enumerate() {
            tx.send_command(EC_TBL_WRITE_ITEM)?;
            tx.send_data(index as u8)?;
            if tx.receive_data()? == EC_INVALID {
                return Err(EcError::InvalidTable(index));
            }

            tx.send_command(EC_TBL_GET_PIN)?;
            let hw_pin_number = tx.receive_data()?;
            if hw_pin_number == EC_INVALID {
                return Err(EcError::InvalidTable(index));
            }

            tx.send_command(EC_TBL_GET_DEVID)?;
            let device_id = tx.receive_data()?;

            debug!(
                "  Table item {:2}: Device {:#04X} on pin {:#04X}",
                index, device_id, hw_pin_number
            );
            *slot = TableEntry {
                device_id,
                hw_pin_number,
            };
        }
        Ok(())
    }
}
