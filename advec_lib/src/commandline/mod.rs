//! Module to factor out commandline interaction
//! This way the tool binary only has to hand over its arguments.

pub mod clap_std;

use std::path::PathBuf;

use crate::built_info;
use crate::config;
use crate::ec::protocol::EC_MAX_TBL_NUM;
use crate::ec::smbus::SmbusRequest;
use crate::ec::{print_err, Ec, EcError, EcResult};
use crate::os_specific;
use crate::util;

/// Product name used when none is given on the commandline
pub const DEFAULT_PRODUCT_NAME: &str = "AHC1EC0";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevel(log::LevelFilter);

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel(log::LevelFilter::Error)
    }
}

/// What SMBus operation to run, and where
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmbusArg {
    ReadByte(SmbusRequest),
    WriteByte(SmbusRequest, u8),
    ReadWord(SmbusRequest),
    WriteWord(SmbusRequest, u16),
}

#[derive(Debug, Default)]
pub struct Cli {
    pub verbosity: LogLevel,
    pub version: bool,
    pub info: bool,
    pub product_name: Option<String>,
    pub config: Option<PathBuf>,
    pub table: bool,
    pub ram_read: Option<u8>,
    pub ram_write: Option<(u8, u8)>,
    pub ram_dump: bool,
    pub ext_ram_read: Option<u8>,
    pub ext_ram_write: Option<(u8, u8)>,
    pub raw_command: Option<u8>,
    pub acpi_read: Option<u8>,
    pub acpi_write: Option<(u8, u8)>,
    /// Pin and, to set it, the new value
    pub gpio_status: Option<(u8, Option<u8>)>,
    pub gpio_dir: Option<(u8, Option<u8>)>,
    /// Pin and multiplier
    pub ad: Option<(u8, u8)>,
    pub onekey_read: Option<u8>,
    pub onekey_set: Option<u8>,
    pub oem_read: Option<u8>,
    pub oem_write: Option<(u8, u8)>,
    pub smbus: Option<SmbusArg>,
}

pub fn parse(args: &[String]) -> Cli {
    clap_std::parse(args)
}

fn init_logger(level: LogLevel) {
    let env = env_logger::Env::default().default_filter_or(level.0.as_str());
    let _ = env_logger::Builder::from_env(env)
        .format_target(false)
        .format_timestamp(None)
        .try_init();
}

fn print_tool_version() {
    println!("Tool Version Information");
    println!("  Version:     {}", built_info::PKG_VERSION);
    println!("  Built At:    {}", built_info::BUILT_TIME_UTC);
    println!(
        "  Git Commit:  {}",
        built_info::GIT_COMMIT_HASH.unwrap_or("?")
    );
    println!(
        "  Git Dirty:   {}",
        built_info::GIT_DIRTY.map_or("?".to_string(), |x| x.to_string())
    );

    if log_enabled!(log::Level::Info) {
        println!(
            "  Built on CI: {:?}",
            built_info::CI_PLATFORM.unwrap_or("None")
        );
        println!(
            "  Git ref:     {:?}",
            built_info::GIT_HEAD_REF.unwrap_or("?")
        );
        println!("  rustc Ver:   {}", built_info::RUSTC_VERSION);
        println!("  Features     {:?}", built_info::FEATURES);
        println!("  DEBUG:       {}", built_info::DEBUG);
        println!("  Target OS:   {}", built_info::CFG_OS);
    }
}

fn print_info(ec: &Ec) {
    println!("EC");
    println!("  Product:     {}", ec.product_name());
    println!("  Table:       {}", table_summary(ec.table_result()));
    println!("OS");
    println!("  Version:     {}", os_specific::get_os_version());
}

fn table_summary(result: &EcResult<()>) -> String {
    match result {
        Ok(()) => format!("Complete, {} items", EC_MAX_TBL_NUM),
        Err(EcError::InvalidTable(index)) => format!("{} items", index),
        Err(err) => format!("Unreadable ({:?})", err),
    }
}

fn print_table(ec: &Ec) {
    let table = ec.dynamic_table();
    println!("Dynamic Table ({})", table_summary(ec.table_result()));
    let mut found = false;
    for (index, entry) in table.defined() {
        found = true;
        println!(
            "  {:2}: Device {:#04X}  HW Pin {:#04X}",
            index, entry.device_id, entry.hw_pin_number
        );
    }
    if !found {
        println!("  No items");
    }
}

fn dump_ram(ec: &Ec) {
    let mut buffer = vec![0_u8; 0x100];
    for (addr, byte) in buffer.iter_mut().enumerate() {
        match ec.read_ram(addr as u8) {
            Ok(value) => *byte = value,
            Err(err) => {
                println!("Failed to read RAM at {:#04X}: {:?}", addr, err);
                return;
            }
        }
    }
    util::print_multiline_buffer(&buffer, 0);
}

fn print_byte(what: &str, addr: u8, res: EcResult<u8>) {
    if let Some(value) = print_err(res) {
        println!("{} {:#04X}: {:#04X}", what, addr, value);
    }
}

fn run_smbus(ec: &Ec, arg: &SmbusArg) {
    let describe = |request: &SmbusRequest| {
        format!(
            "SMBus ch {} addr {:#04X} reg {:#04X}",
            request.channel, request.slave_address, request.register
        )
    };
    match arg {
        SmbusArg::ReadByte(request) => {
            if let Some(value) = print_err(ec.smbus_read_byte(request)) {
                println!("{}: {:#04X}", describe(request), value);
            }
        }
        SmbusArg::ReadWord(request) => {
            if let Some(value) = print_err(ec.smbus_read_word(request)) {
                println!("{}: {:#06X}", describe(request), value);
            }
        }
        SmbusArg::WriteByte(request, value) => {
            print_err(ec.smbus_write_byte(request, *value));
        }
        SmbusArg::WriteWord(request, value) => {
            print_err(ec.smbus_write_word(request, *value));
        }
    }
}

#[cfg(feature = "raw_pio")]
fn open_ec(args: &Cli) -> EcResult<Ec> {
    use crate::ec::portio::PortIo;

    let config = config::load_config(args.config.as_deref());
    let port = PortIo::new()?;
    let product_name = args
        .product_name
        .as_deref()
        .unwrap_or(DEFAULT_PRODUCT_NAME);
    Ec::attach(Box::new(port), &config, product_name)
}

#[cfg(not(feature = "raw_pio"))]
fn open_ec(args: &Cli) -> EcResult<Ec> {
    let _ = config::load_config(args.config.as_deref());
    Err(EcError::DeviceError(
        "Built without port I/O support".to_string(),
    ))
}

pub fn run_with_args(args: &Cli) -> i32 {
    init_logger(args.verbosity);

    if args.version {
        print_tool_version();
        return 0;
    }

    let ec = match open_ec(args) {
        Ok(ec) => ec,
        Err(err) => {
            println!("Failed to attach to the EC: {:?}", err);
            return 1;
        }
    };

    if args.info {
        print_info(&ec);
    }
    if args.table {
        print_table(&ec);
    }

    if let Some((addr, value)) = args.ram_write {
        print_err(ec.write_ram(addr, value));
    }
    if let Some(addr) = args.ram_read {
        print_byte("RAM", addr, ec.read_ram(addr));
    }
    if args.ram_dump {
        dump_ram(&ec);
    }
    if let Some((addr, value)) = args.ext_ram_write {
        print_err(ec.write_extend_ram(addr, value));
    }
    if let Some(addr) = args.ext_ram_read {
        print_byte("Extended RAM", addr, ec.read_extend_ram(addr));
    }
    if let Some(command) = args.raw_command {
        print_err(ec.write_hwram_command(command));
    }

    if let Some((addr, value)) = args.acpi_write {
        print_err(ec.write_acpi_value(addr, value));
    }
    if let Some(addr) = args.acpi_read {
        print_byte("ACPI", addr, ec.read_acpi_value(addr));
    }

    match args.gpio_status {
        Some((pin, Some(value))) => {
            print_err(ec.write_gpio_status(pin, value));
        }
        Some((pin, None)) => print_byte("GPIO status", pin, ec.read_gpio_status(pin)),
        None => {}
    }
    match args.gpio_dir {
        Some((pin, Some(value))) => {
            print_err(ec.write_gpio_dir(pin, value));
        }
        Some((pin, None)) => print_byte("GPIO direction", pin, ec.read_gpio_dir(pin)),
        None => {}
    }
    if let Some((pin, multiplier)) = args.ad {
        if let Some(value) = print_err(ec.read_ad_value(pin, multiplier)) {
            println!("AD {:#04X}: {}", pin, value);
        }
    }

    if let Some(addr) = args.onekey_set {
        print_err(ec.write_onekey_status(addr));
    }
    if let Some(addr) = args.onekey_read {
        print_byte("One Key", addr, ec.read_onekey_status(addr));
    }
    if let Some((addr, value)) = args.oem_write {
        print_err(ec.write_oem_status(addr, value));
    }
    if let Some(addr) = args.oem_read {
        print_byte("OEM", addr, ec.read_oem_status(addr));
    }

    if let Some(smbus) = &args.smbus {
        run_smbus(&ec, smbus);
    }

    ec.detach();
    0
}
