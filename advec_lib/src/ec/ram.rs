//! Byte access to the EC internal RAM
//!
//! Every RAM-addressed feature, the SMBus proxy included, is built on these.

use crate::ec::protocol::*;
use crate::ec::transaction::Transaction;
use crate::ec::{Ec, EcResult};

impl Transaction<'_> {
    fn read_ram_with(&mut self, opcode: u8, addr: u8) -> EcResult<u8> {
        self.send_command(opcode)?;
        self.send_data(addr)?;
        self.receive_data()
    }

    fn write_ram_with(&mut self, opcode: u8, addr: u8, data: u8) -> EcResult<()> {
        self.send_command(opcode)?;
        self.send_data(addr)?;
        // EC doesn't acknowledge the write with OBF
        self.send_data(data)
    }

    pub fn read_ram(&mut self, addr: u8) -> EcResult<u8> {
        self.read_ram_with(EC_HW_RAM_READ, addr).map_err(|err| {
            error!("read_ram({:#04X}) failed: {:?}", addr, err);
            err
        })
    }

    pub fn write_ram(&mut self, addr: u8, data: u8) -> EcResult<()> {
        self.write_ram_with(EC_HW_RAM_WRITE, addr, data).map_err(|err| {
            error!("write_ram({:#04X}) failed: {:?}", addr, err);
            err
        })
    }
}

impl Ec {
    /// Read one byte of EC RAM
    pub fn read_ram(&self, addr: u8) -> EcResult<u8> {
        self.port.lock().read_ram(addr)
    }

    /// Write one byte of EC RAM
    pub fn write_ram(&self, addr: u8, data: u8) -> EcResult<()> {
        self.port.lock().write_ram(addr, data)
    }

    /// Read one byte of the extended RAM window
    pub fn read_extend_ram(&self, addr: u8) -> EcResult<u8> {
        self.port
            .lock()
            .read_ram_with(EC_HW_EXTEND_RAM_READ, addr)
            .map_err(|err| {
                debug!("read_extend_ram({:#04X}) failed: {:?}", addr, err);
                err
            })
    }

    pub fn write_extend_ram(&self, addr: u8, data: u8) -> EcResult<()> {
        self.port
            .lock()
            .write_ram_with(EC_HW_EXTEND_RAM_WRITE, addr, data)
            .map_err(|err| {
                debug!("write_extend_ram({:#04X}) failed: {:?}", addr, err);
                err
            })
    }

    /// Send a bare command byte, without any address or data
    pub fn write_hwram_command(&self, command: u8) -> EcResult<()> {
        self.port.lock().send_command(command)
    }
}
