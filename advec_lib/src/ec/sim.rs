//! Simulated EC firmware behind the port pair, for tests
//!
//! Models the command dispatcher byte by byte, so any sequence that is out of
//! order or interleaved with another one shows up in `violations`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::ec::protocol::*;
use crate::ec::{EcConfig, EcPort, PollConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortEvent {
    Command(u8),
    Data(u8),
    Read(u8),
}

/// What the firmware expects to receive next on the data port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Idle,
    RamReadAddr { extended: bool },
    RamWriteAddr { extended: bool },
    RamWriteData { extended: bool, addr: u8 },
    AcpiReadAddr,
    AcpiWriteAddr,
    AcpiWriteData(u8),
    GpioIndex,
    GpioStatusValue,
    GpioDirValue,
    AdIndex,
    OneKeyAddr,
    OemSub,
    OemReadAddr,
    OemWriteAddr,
    OemWriteData(u8),
    TableItem,
}

pub struct SimState {
    pub ram: [u8; 256],
    pub ext_ram: [u8; 256],
    pub acpi: [u8; 256],
    pub onekey: [u8; 256],
    /// Addresses of the One Key Recovery flags that were set
    pub onekey_set: Vec<u8>,
    pub oem: [u8; 256],
    /// GPIO pin -> (status, direction). Pins not in here are invalid
    pub gpio: HashMap<u8, (u8, u8)>,
    /// AD pin -> raw reading. Pins not in here are invalid
    pub ad: HashMap<u8, u16>,
    /// Table slot -> (HW pin number, device ID)
    pub table: [Option<(u8, u8)>; EC_MAX_TBL_NUM],

    /// (channel, slave address, register) -> value behind the SMBus proxy
    pub smbus_regs: HashMap<(u8, u8, u8), u16>,
    /// Status the SMBus proxy reports once done
    pub smbus_status: u8,
    /// How many reads of EC_SMBUS_PROTOCOL still see the engine busy
    pub smbus_busy_reads: usize,
    /// Engine never goes idle
    pub smbus_hang: bool,

    pub stuck_ibf: bool,
    pub never_obf: bool,
    /// Next status reads report IBF set
    pub ibf_busy_polls: usize,
    /// Status reads that don't yet report OBF although a result is there
    pub obf_delay_polls: usize,
    /// Sleep before each port access, to widen race windows
    pub step_delay: Option<Duration>,

    pub status_reads: usize,
    pub events: Vec<PortEvent>,
    pub commands: Vec<u8>,
    /// RAM addresses read through EC_HW_RAM_READ
    pub ram_reads: Vec<u8>,
    /// Bytes that arrived when the firmware didn't expect them
    pub violations: usize,

    pending: Pending,
    output: Option<u8>,
    /// The host may skip reading `output`
    output_optional: bool,
    selected_gpio: Option<u8>,
    selected_ad: Option<u8>,
    selected_item: Option<usize>,
}

impl SimState {
    fn new() -> Self {
        SimState {
            ram: [0; 256],
            ext_ram: [0; 256],
            acpi: [0; 256],
            onekey: [0; 256],
            onekey_set: vec![],
            oem: [0; 256],
            gpio: HashMap::new(),
            ad: HashMap::new(),
            table: [None; EC_MAX_TBL_NUM],
            smbus_regs: HashMap::new(),
            smbus_status: EC_SMBUS_STATUS_DONE,
            smbus_busy_reads: 0,
            smbus_hang: false,
            stuck_ibf: false,
            never_obf: false,
            ibf_busy_polls: 0,
            obf_delay_polls: 0,
            step_delay: None,
            status_reads: 0,
            events: vec![],
            commands: vec![],
            ram_reads: vec![],
            violations: 0,
            pending: Pending::Idle,
            output: None,
            output_optional: false,
            selected_gpio: None,
            selected_ad: None,
            selected_item: None,
        }
    }

    /// Forget any half-done sequence, like the firmware does after a while
    pub fn reset_pending(&mut self) {
        self.pending = Pending::Idle;
        self.output = None;
        self.output_optional = false;
    }

    fn status(&mut self) -> u8 {
        self.status_reads += 1;
        let mut status = 0;
        if self.stuck_ibf {
            status |= EC_STATUS_IBF;
        } else if self.ibf_busy_polls > 0 {
            self.ibf_busy_polls -= 1;
            status |= EC_STATUS_IBF;
        }
        if self.output.is_some() && !self.never_obf {
            if self.obf_delay_polls > 0 {
                self.obf_delay_polls -= 1;
            } else {
                status |= EC_STATUS_OBF;
            }
        }
        status
    }

    fn command(&mut self, command: u8) {
        self.events.push(PortEvent::Command(command));
        self.commands.push(command);
        let unread = self.output.is_some() && !self.output_optional;
        if self.pending != Pending::Idle || unread {
            self.violations += 1;
        }
        self.reset_pending();

        self.pending = match command {
            EC_HW_RAM_READ => Pending::RamReadAddr { extended: false },
            EC_HW_EXTEND_RAM_READ => Pending::RamReadAddr { extended: true },
            EC_HW_RAM_WRITE => Pending::RamWriteAddr { extended: false },
            EC_HW_EXTEND_RAM_WRITE => Pending::RamWriteAddr { extended: true },
            EC_ACPI_RAM_READ => Pending::AcpiReadAddr,
            EC_ACPI_DATA_WRITE => Pending::AcpiWriteAddr,
            EC_GPIO_INDEX_WRITE => Pending::GpioIndex,
            EC_GPIO_STATUS_WRITE => Pending::GpioStatusValue,
            EC_GPIO_DIR_WRITE => Pending::GpioDirValue,
            EC_AD_INDEX_WRITE => Pending::AdIndex,
            EC_ONE_KEY_FLAG => Pending::OneKeyAddr,
            EC_ASG_OEM => Pending::OemSub,
            EC_TBL_WRITE_ITEM => Pending::TableItem,
            _ => Pending::Idle,
        };

        self.output = match command {
            EC_GPIO_STATUS_READ => self.gpio_selected().map(|(status, _)| status),
            EC_GPIO_DIR_READ => self.gpio_selected().map(|(_, dir)| dir),
            EC_AD_LSB_READ => self.ad_selected().map(|raw| raw as u8),
            EC_AD_MSB_READ => self.ad_selected().map(|raw| (raw >> 8) as u8),
            EC_TBL_GET_PIN => self.item_selected().map(|(pin, _)| pin),
            EC_TBL_GET_DEVID => self.item_selected().map(|(_, id)| id),
            _ => None,
        };
    }

    fn gpio_selected(&self) -> Option<(u8, u8)> {
        self.selected_gpio.and_then(|pin| self.gpio.get(&pin).copied())
    }

    fn ad_selected(&self) -> Option<u16> {
        self.selected_ad.and_then(|pin| self.ad.get(&pin).copied())
    }

    fn item_selected(&self) -> Option<(u8, u8)> {
        self.selected_item.and_then(|i| self.table[i])
    }

    fn data(&mut self, data: u8) {
        self.events.push(PortEvent::Data(data));
        if self.output.is_some() && !self.output_optional {
            self.violations += 1;
        }
        self.output = None;
        self.output_optional = false;

        let pending = self.pending;
        self.pending = Pending::Idle;
        match pending {
            Pending::Idle => self.violations += 1,
            Pending::RamReadAddr { extended: false } => {
                self.ram_reads.push(data);
                self.output = Some(self.read_ram(data));
            }
            Pending::RamReadAddr { extended: true } => {
                self.output = Some(self.ext_ram[data as usize]);
            }
            Pending::RamWriteAddr { extended } => {
                self.pending = Pending::RamWriteData {
                    extended,
                    addr: data,
                }
            }
            Pending::RamWriteData { extended: false, addr } => self.write_ram(addr, data),
            Pending::RamWriteData { extended: true, addr } => self.ext_ram[addr as usize] = data,
            Pending::AcpiReadAddr => self.output = Some(self.acpi[data as usize]),
            Pending::AcpiWriteAddr => self.pending = Pending::AcpiWriteData(data),
            Pending::AcpiWriteData(addr) => self.acpi[addr as usize] = data,
            Pending::GpioIndex => {
                self.selected_gpio = Some(data);
                let valid = self.gpio.contains_key(&data);
                self.output = Some(if valid { data } else { EC_INVALID });
            }
            Pending::GpioStatusValue => {
                if let Some(pin) = self.selected_gpio {
                    if let Some(gpio) = self.gpio.get_mut(&pin) {
                        gpio.0 = data;
                    }
                }
            }
            Pending::GpioDirValue => {
                if let Some(pin) = self.selected_gpio {
                    if let Some(gpio) = self.gpio.get_mut(&pin) {
                        gpio.1 = data;
                    }
                }
            }
            Pending::AdIndex => {
                self.selected_ad = Some(data);
                let valid = self.ad.contains_key(&data);
                self.output = Some(if valid { data } else { EC_INVALID });
            }
            Pending::OneKeyAddr => {
                // Reading and setting use the same bytes, the host decides
                // whether to pick up the answer
                self.onekey_set.push(data);
                self.output = Some(self.onekey[data as usize]);
                self.output_optional = true;
            }
            Pending::OemSub => {
                self.pending = match data {
                    EC_ASG_OEM_READ => Pending::OemReadAddr,
                    EC_ASG_OEM_WRITE => Pending::OemWriteAddr,
                    _ => {
                        self.violations += 1;
                        Pending::Idle
                    }
                }
            }
            Pending::OemReadAddr => self.output = Some(self.oem[data as usize]),
            Pending::OemWriteAddr => self.pending = Pending::OemWriteData(data),
            Pending::OemWriteData(addr) => self.oem[addr as usize] = data,
            Pending::TableItem => {
                let index = data as usize;
                if index < EC_MAX_TBL_NUM && self.table[index].is_some() {
                    self.selected_item = Some(index);
                    self.output = Some(data);
                } else {
                    self.selected_item = None;
                    self.output = Some(EC_INVALID);
                }
            }
        }
    }

    fn read(&mut self) -> u8 {
        self.output_optional = false;
        let data = self.output.take().unwrap_or(0);
        self.events.push(PortEvent::Read(data));
        data
    }

    fn read_ram(&mut self, addr: u8) -> u8 {
        if addr == EC_SMBUS_PROTOCOL && self.ram[addr as usize] != 0 && !self.smbus_hang {
            if self.smbus_busy_reads > 0 {
                self.smbus_busy_reads -= 1;
            } else {
                self.smbus_complete();
            }
        }
        self.ram[addr as usize]
    }

    fn write_ram(&mut self, addr: u8, data: u8) {
        self.ram[addr as usize] = data;
    }

    fn smbus_complete(&mut self) {
        let protocol = self.ram[EC_SMBUS_PROTOCOL as usize];
        let key = (
            self.ram[EC_SMBUS_CHANNEL as usize],
            self.ram[EC_SMBUS_SLV_ADDR as usize],
            self.ram[EC_SMBUS_CMD as usize],
        );
        let msb = ec_smbus_dat_offset(0) as usize;
        let lsb = ec_smbus_dat_offset(1) as usize;

        if self.smbus_status == EC_SMBUS_STATUS_DONE {
            match protocol {
                0x06 => {
                    self.smbus_regs.insert(key, self.ram[msb] as u16);
                }
                0x07 => {
                    if let Some(value) = self.smbus_regs.get(&key) {
                        self.ram[msb] = *value as u8;
                    }
                }
                0x08 => {
                    let word = u16::from_be_bytes([self.ram[msb], self.ram[lsb]]);
                    self.smbus_regs.insert(key, word);
                }
                0x09 => {
                    if let Some(value) = self.smbus_regs.get(&key) {
                        let [hi, lo] = value.to_be_bytes();
                        self.ram[msb] = hi;
                        self.ram[lsb] = lo;
                    }
                }
                _ => {}
            }
        }
        self.ram[EC_SMBUS_STATUS as usize] = self.smbus_status;
        self.ram[EC_SMBUS_PROTOCOL as usize] = 0;
    }
}

/// Handle to the simulated EC. Clones share the same firmware state
#[derive(Clone)]
pub struct SimEc {
    state: Arc<Mutex<SimState>>,
}

impl SimEc {
    pub fn new() -> Self {
        SimEc {
            state: Arc::new(Mutex::new(SimState::new())),
        }
    }

    /// Inspect or change the firmware state
    pub fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Tight bounds without delays, to run timeouts quickly
    pub fn config(&self) -> EcConfig {
        EcConfig {
            poll: PollConfig {
                max_attempts: 50,
                interval_us: 0,
            },
            smbus_poll: PollConfig {
                max_attempts: 20,
                interval_us: 0,
            },
        }
    }

    fn step<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        if let Some(delay) = self.with(|s| s.step_delay) {
            thread::sleep(delay);
        }
        self.with(f)
    }
}

impl EcPort for SimEc {
    fn read_status(&mut self) -> u8 {
        self.with(|s| s.status())
    }

    fn write_command(&mut self, command: u8) {
        self.step(|s| s.command(command))
    }

    fn read_data(&mut self) -> u8 {
        self.step(|s| s.read())
    }

    fn write_data(&mut self, data: u8) {
        self.step(|s| s.data(data))
    }
}
