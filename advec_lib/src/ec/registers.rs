//! Register families behind the EC command dispatcher
//!
//! ACPI RAM, GPIO status/direction, One Key Recovery flags and OEM status all
//! run the same exchange: an opcode on the command port, a target on the data
//! port, then a value in or out. They only differ in the bytes around that,
//! which [`Exchange`] describes. AD readings add a second stage on top.

use crate::ec::protocol::*;
use crate::ec::transaction::Transaction;
use crate::ec::{Ec, EcError, EcResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFamily {
    /// ACPI shadow RAM, addressed by byte
    AcpiRam,
    /// GPIO level, addressed by HW pin number
    GpioStatus,
    /// GPIO direction, addressed by HW pin number
    GpioDirection,
    /// One Key Recovery flags
    OneKeyFlag,
    /// Vendor status bytes
    OemStatus,
}

/// What happens after the target was handed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    /// Pick up one byte
    Read,
    /// Hand over one more byte
    Write(u8),
    /// Nothing, the target alone is the request
    Latch,
}

#[derive(Debug, Clone, Copy)]
struct Exchange {
    opcode: u8,
    /// Sub-function sent on the data port ahead of the target
    selector: Option<u8>,
    /// EC echoes the target back, or 0xFF if it doesn't exist
    validated: bool,
    /// Command to issue once the target is accepted
    then: Option<u8>,
}

impl Exchange {
    const fn direct(opcode: u8) -> Self {
        Exchange {
            opcode,
            selector: None,
            validated: false,
            then: None,
        }
    }

    const fn indexed(select: u8, then: Option<u8>) -> Self {
        Exchange {
            opcode: select,
            selector: None,
            validated: true,
            then,
        }
    }
}

const AD_VALUE: Exchange = Exchange::indexed(EC_AD_INDEX_WRITE, None);

impl RegisterFamily {
    fn read_exchange(self) -> Exchange {
        match self {
            RegisterFamily::AcpiRam => Exchange::direct(EC_ACPI_RAM_READ),
            RegisterFamily::GpioStatus => {
                Exchange::indexed(EC_GPIO_INDEX_WRITE, Some(EC_GPIO_STATUS_READ))
            }
            RegisterFamily::GpioDirection => {
                Exchange::indexed(EC_GPIO_INDEX_WRITE, Some(EC_GPIO_DIR_READ))
            }
            RegisterFamily::OneKeyFlag => Exchange::direct(EC_ONE_KEY_FLAG),
            RegisterFamily::OemStatus => Exchange {
                selector: Some(EC_ASG_OEM_READ),
                ..Exchange::direct(EC_ASG_OEM)
            },
        }
    }

    fn write_exchange(self) -> Exchange {
        match self {
            RegisterFamily::AcpiRam => Exchange::direct(EC_ACPI_DATA_WRITE),
            RegisterFamily::GpioStatus => {
                Exchange::indexed(EC_GPIO_INDEX_WRITE, Some(EC_GPIO_STATUS_WRITE))
            }
            RegisterFamily::GpioDirection => {
                Exchange::indexed(EC_GPIO_INDEX_WRITE, Some(EC_GPIO_DIR_WRITE))
            }
            RegisterFamily::OneKeyFlag => Exchange::direct(EC_ONE_KEY_FLAG),
            RegisterFamily::OemStatus => Exchange {
                selector: Some(EC_ASG_OEM_WRITE),
                ..Exchange::direct(EC_ASG_OEM)
            },
        }
    }
}

impl Transaction<'_> {
    /// Hand the target to the EC, checking the echo if there is one
    fn select_target(&mut self, exchange: &Exchange, target: u8) -> EcResult<()> {
        self.send_command(exchange.opcode)?;
        if let Some(selector) = exchange.selector {
            self.send_data(selector)?;
        }
        self.send_data(target)?;

        if exchange.validated && self.receive_data()? == EC_INVALID {
            return Err(EcError::InvalidTarget(target));
        }
        if let Some(then) = exchange.then {
            self.send_command(then)?;
        }
        Ok(())
    }

    fn exchange(&mut self, exchange: &Exchange, target: u8, transfer: Transfer) -> EcResult<u8> {
        self.select_target(exchange, target)?;
        match transfer {
            Transfer::Read => self.receive_data(),
            Transfer::Write(value) => self.send_data(value).map(|_| value),
            Transfer::Latch => Ok(target),
        }
    }

    fn read_ad(&mut self, pin: u8) -> EcResult<(u8, u8)> {
        self.select_target(&AD_VALUE, pin)?;
        self.send_command(EC_AD_LSB_READ)?;
        let lsb = self.receive_data()?;
        self.send_command(EC_AD_MSB_READ)?;
        let msb = self.receive_data()?;
        Ok((msb, lsb))
    }
}

/// Turn a raw AD reading into the value handed to consumers
///
/// The reading is 10 bits wide. Consumers expect it already multiplied by
/// the channel's multiplier and by 100.
pub fn scale_ad_value(msb: u8, lsb: u8, multiplier: u8) -> u32 {
    let raw = ((u32::from(msb) << 8) | u32::from(lsb)) & EC_AD_VALUE_MASK;
    raw * u32::from(multiplier) * EC_AD_SCALE
}

impl Ec {
    fn run_exchange(
        &self,
        family: RegisterFamily,
        exchange: Exchange,
        target: u8,
        transfer: Transfer,
    ) -> EcResult<u8> {
        let res = self.port.lock().exchange(&exchange, target, transfer);
        match &res {
            Err(EcError::InvalidTarget(_)) => {
                error!("{:?}: EC has no target {:#04X}", family, target)
            }
            Err(err) => warn!(
                "{:?} {:?} of {:#04X} (opcode {:#04X}) failed: {:?}",
                family, transfer, target, exchange.opcode, err
            ),
            Ok(value) => trace!("{:?} {:?} {:#04X}: {:#04X}", family, transfer, target, value),
        }
        res
    }

    /// Read one byte of any register family
    pub fn read_register(&self, family: RegisterFamily, target: u8) -> EcResult<u8> {
        self.run_exchange(family, family.read_exchange(), target, Transfer::Read)
    }

    fn write_register(&self, family: RegisterFamily, target: u8, value: u8) -> EcResult<()> {
        self.run_exchange(family, family.write_exchange(), target, Transfer::Write(value))
            .map(|_| ())
    }

    pub fn read_acpi_value(&self, addr: u8) -> EcResult<u8> {
        self.read_register(RegisterFamily::AcpiRam, addr)
    }

    pub fn write_acpi_value(&self, addr: u8, value: u8) -> EcResult<()> {
        self.write_register(RegisterFamily::AcpiRam, addr, value)
    }

    /// Read the level of a GPIO pin
    pub fn read_gpio_status(&self, pin: u8) -> EcResult<u8> {
        self.read_register(RegisterFamily::GpioStatus, pin)
    }

    pub fn write_gpio_status(&self, pin: u8, value: u8) -> EcResult<()> {
        self.write_register(RegisterFamily::GpioStatus, pin, value)
    }

    /// Read the direction of a GPIO pin
    pub fn read_gpio_dir(&self, pin: u8) -> EcResult<u8> {
        self.read_register(RegisterFamily::GpioDirection, pin)
    }

    pub fn write_gpio_dir(&self, pin: u8, value: u8) -> EcResult<()> {
        self.write_register(RegisterFamily::GpioDirection, pin, value)
    }

    /// Read an AD channel, scaled by `multiplier` and 100
    pub fn read_ad_value(&self, pin: u8, multiplier: u8) -> EcResult<u32> {
        let res = self.port.lock().read_ad(pin);
        match res {
            Ok((msb, lsb)) => {
                trace!("AD pin {:#04X}: MSB {:#04X} LSB {:#04X}", pin, msb, lsb);
                Ok(scale_ad_value(msb, lsb, multiplier))
            }
            Err(err) => {
                warn!("Reading AD pin {:#04X} failed: {:?}", pin, err);
                Err(err)
            }
        }
    }

    /// Get a One Key Recovery flag
    pub fn read_onekey_status(&self, addr: u8) -> EcResult<u8> {
        self.read_register(RegisterFamily::OneKeyFlag, addr)
    }

    /// Set a One Key Recovery flag. The address alone is the request
    pub fn write_onekey_status(&self, addr: u8) -> EcResult<()> {
        let family = RegisterFamily::OneKeyFlag;
        self.run_exchange(family, family.write_exchange(), addr, Transfer::Latch)
            .map(|_| ())
    }

    pub fn read_oem_status(&self, addr: u8) -> EcResult<u8> {
        self.read_register(RegisterFamily::OemStatus, addr)
    }

    pub fn write_oem_status(&self, addr: u8, value: u8) -> EcResult<()> {
        self.write_register(RegisterFamily::OemStatus, addr, value)
    }
}
