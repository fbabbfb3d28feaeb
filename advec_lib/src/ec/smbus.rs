//! SMBus transactions through the EC's RAM-mapped host controller cells
//!
//! The EC runs the bus transaction itself. The host fills in channel, slave
//! address, register and data, arms the engine by writing the protocol cell,
//! then polls that cell until the EC clears it.
//!
//! All of it happens under one lock, so that no other caller can rewrite the
//! cells while the engine is working on them.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::ec::protocol::*;
use crate::ec::transaction::Transaction;
use crate::ec::{Ec, EcError, EcResult, PollConfig, WaitFor};
use crate::os_specific;

/// Where an SMBus transaction goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmbusRequest {
    /// Which of the EC's SMBus channels
    pub channel: u8,
    /// 8-bit slave address, as the EC expects it
    pub slave_address: u8,
    /// Command/register byte
    pub register: u8,
}

/// Value written to EC_SMBUS_PROTOCOL to arm the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum SmbusProtocol {
    WriteByte = 0x06,
    ReadByte = 0x07,
    WriteWord = 0x08,
    ReadWord = 0x09,
}

impl SmbusProtocol {
    fn is_word(self) -> bool {
        matches!(self, SmbusProtocol::WriteWord | SmbusProtocol::ReadWord)
    }

    fn is_read(self) -> bool {
        matches!(self, SmbusProtocol::ReadByte | SmbusProtocol::ReadWord)
    }
}

/// Failure reasons in the low bits of EC_SMBUS_STATUS
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum SmbusStatus {
    Ok = 0x00,
    UnknownFailure = 0x07,
    AddressNack = 0x10,
    DeviceError = 0x11,
    CommandDenied = 0x12,
    UnknownError = 0x13,
    AccessDenied = 0x17,
    Timeout = 0x18,
    UnsupportedProtocol = 0x19,
    Busy = 0x1A,
    PecError = 0x1F,
}

impl SmbusStatus {
    pub fn decode(status: u8) -> Option<SmbusStatus> {
        SmbusStatus::from_u8(status & EC_SMBUS_STATUS_CODE_MASK)
    }
}

impl Transaction<'_> {
    /// Poll EC_SMBUS_PROTOCOL until the engine has cleared it
    fn wait_smbus_idle(&mut self, poll: &PollConfig) -> EcResult<()> {
        for _ in 0..poll.max_attempts {
            if self.read_ram(EC_SMBUS_PROTOCOL)? == 0 {
                return Ok(());
            }
            if poll.interval_us > 0 {
                os_specific::sleep(poll.interval_us);
            }
        }
        warn!(
            "SMBus engine still busy after {} polls, giving up",
            poll.max_attempts
        );
        Err(EcError::Timeout(WaitFor::SmbusIdle))
    }

    /// Run one SMBus transaction. Word data is MSB first
    fn smbus_transfer(
        &mut self,
        poll: &PollConfig,
        protocol: SmbusProtocol,
        request: &SmbusRequest,
        data: u16,
    ) -> EcResult<u16> {
        self.write_ram(EC_SMBUS_CHANNEL, request.channel)?;
        self.write_ram(EC_SMBUS_SLV_ADDR, request.slave_address)?;
        self.write_ram(EC_SMBUS_CMD, request.register)?;

        if !protocol.is_read() {
            if protocol.is_word() {
                let [msb, lsb] = data.to_be_bytes();
                self.write_ram(ec_smbus_dat_offset(0), msb)?;
                self.write_ram(ec_smbus_dat_offset(1), lsb)?;
            } else {
                self.write_ram(EC_SMBUS_DATA, data as u8)?;
            }
        }

        self.write_ram(EC_SMBUS_PROTOCOL, protocol as u8)?;
        self.wait_smbus_idle(poll)?;

        let status = self.read_ram(EC_SMBUS_STATUS)?;
        if status != EC_SMBUS_STATUS_DONE {
            return Err(EcError::SmbusError(status));
        }

        if !protocol.is_read() {
            Ok(data)
        } else if protocol.is_word() {
            let msb = self.read_ram(ec_smbus_dat_offset(0))?;
            let lsb = self.read_ram(ec_smbus_dat_offset(1))?;
            Ok(u16::from_be_bytes([msb, lsb]))
        } else {
            self.read_ram(EC_SMBUS_DATA).map(u16::from)
        }
    }
}

impl Ec {
    fn smbus(&self, protocol: SmbusProtocol, request: &SmbusRequest, data: u16) -> EcResult<u16> {
        let res = self
            .port
            .lock()
            .smbus_transfer(&self.smbus_poll, protocol, request, data);
        match &res {
            Ok(value) => debug!(
                "SMBus {:?} ch {} addr {:#04X} reg {:#04X}: {:#06X}",
                protocol, request.channel, request.slave_address, request.register, value
            ),
            Err(EcError::SmbusError(status)) => error!(
                "SMBus {:?} ch {} addr {:#04X} reg {:#04X} failed with status {:#04X} ({:?})",
                protocol,
                request.channel,
                request.slave_address,
                request.register,
                status,
                SmbusStatus::decode(*status)
            ),
            Err(err) => error!(
                "SMBus {:?} ch {} addr {:#04X} reg {:#04X} failed: {:?}",
                protocol, request.channel, request.slave_address, request.register, err
            ),
        }
        res
    }

    pub fn smbus_read_byte(&self, request: &SmbusRequest) -> EcResult<u8> {
        self.smbus(SmbusProtocol::ReadByte, request, 0)
            .map(|value| value as u8)
    }

    pub fn smbus_write_byte(&self, request: &SmbusRequest, data: u8) -> EcResult<()> {
        self.smbus(SmbusProtocol::WriteByte, request, data.into())
            .map(|_| ())
    }

    pub fn smbus_read_word(&self, request: &SmbusRequest) -> EcResult<u16> {
        self.smbus(SmbusProtocol::ReadWord, request, 0)
    }

    pub fn smbus_write_word(&self, request: &SmbusRequest, data: u16) -> EcResult<()> {
        self.smbus(SmbusProtocol::WriteWord, request, data).map(|_| ())
    }
}
