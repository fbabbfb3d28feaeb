//! Commandline parsing with clap, for the regular OS commandline tool
use clap::error::ErrorKind;
use clap::{command, Args, Command, FromArgMatches};
use clap_num::maybe_hex;

use crate::commandline::{Cli, LogLevel, SmbusArg};
use crate::ec::smbus::SmbusRequest;

/// Inspect and drive the Advantech AHC1EC0 embedded controller
#[derive(clap::Parser)]
#[command(arg_required_else_help = true)]
struct ClapCli {
    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity,

    /// Show tool version information (Add -vv for more details)
    #[arg(long)]
    version: bool,

    /// Show information about the EC and the OS
    #[arg(long)]
    info: bool,

    /// Product name to attach the EC with
    #[arg(long)]
    product_name: Option<String>,

    /// Path to the config file with polling bounds
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Show the dynamic pin/device table
    #[arg(long)]
    table: bool,

    /// Read a byte of EC RAM
    #[arg(long, value_parser=maybe_hex::<u8>, value_name = "ADDR")]
    ram_read: Option<u8>,

    /// Write a byte of EC RAM
    #[arg(long, value_parser=maybe_hex::<u8>, value_names = ["ADDR", "VALUE"])]
    #[clap(num_args = 2)]
    ram_write: Vec<u8>,

    /// Dump all of EC RAM
    #[arg(long)]
    ram_dump: bool,

    /// Read a byte of extended EC RAM
    #[arg(long, value_parser=maybe_hex::<u8>, value_name = "ADDR")]
    ext_ram_read: Option<u8>,

    /// Write a byte of extended EC RAM
    #[arg(long, value_parser=maybe_hex::<u8>, value_names = ["ADDR", "VALUE"])]
    #[clap(num_args = 2)]
    ext_ram_write: Vec<u8>,

    /// Send a bare command byte to the EC (for debugging only)
    #[arg(long, value_parser=maybe_hex::<u8>, value_name = "COMMAND")]
    raw_command: Option<u8>,

    /// Read a byte of ACPI RAM
    #[arg(long, value_parser=maybe_hex::<u8>, value_name = "ADDR")]
    acpi_read: Option<u8>,

    /// Write a byte of ACPI RAM
    #[arg(long, value_parser=maybe_hex::<u8>, value_names = ["ADDR", "VALUE"])]
    #[clap(num_args = 2)]
    acpi_write: Vec<u8>,

    /// Get GPIO pin level, or set it if a value is provided
    #[arg(long, value_parser=maybe_hex::<u8>, value_names = ["PIN", "VALUE"])]
    #[clap(num_args = 1..=2)]
    gpio_status: Vec<u8>,

    /// Get GPIO pin direction, or set it if a value is provided
    #[arg(long, value_parser=maybe_hex::<u8>, value_names = ["PIN", "VALUE"])]
    #[clap(num_args = 1..=2)]
    gpio_dir: Vec<u8>,

    /// Read an AD channel, scaled by the multiplier and 100
    #[arg(long, value_parser=maybe_hex::<u8>, value_names = ["PIN", "MULTIPLIER"])]
    #[clap(num_args = 2)]
    ad: Vec<u8>,

    /// Read a One Key Recovery flag
    #[arg(long, value_parser=maybe_hex::<u8>, value_name = "ADDR")]
    onekey_read: Option<u8>,

    /// Set a One Key Recovery flag
    #[arg(long, value_parser=maybe_hex::<u8>, value_name = "ADDR")]
    onekey_set: Option<u8>,

    /// Read an OEM status byte
    #[arg(long, value_parser=maybe_hex::<u8>, value_name = "ADDR")]
    oem_read: Option<u8>,

    /// Write an OEM status byte
    #[arg(long, value_parser=maybe_hex::<u8>, value_names = ["ADDR", "VALUE"])]
    #[clap(num_args = 2)]
    oem_write: Vec<u8>,

    /// Read a byte from an SMBus device behind the EC
    #[arg(long, value_parser=maybe_hex::<u8>, value_names = ["CHANNEL", "ADDR", "REG"])]
    #[clap(num_args = 3)]
    smbus_read_byte: Vec<u8>,

    /// Write a byte to an SMBus device behind the EC
    #[arg(long, value_parser=maybe_hex::<u16>, value_names = ["CHANNEL", "ADDR", "REG", "VALUE"])]
    #[clap(num_args = 4)]
    smbus_write_byte: Vec<u16>,

    /// Read a word from an SMBus device behind the EC
    #[arg(long, value_parser=maybe_hex::<u8>, value_names = ["CHANNEL", "ADDR", "REG"])]
    #[clap(num_args = 3)]
    smbus_read_word: Vec<u8>,

    /// Write a word to an SMBus device behind the EC
    #[arg(long, value_parser=maybe_hex::<u16>, value_names = ["CHANNEL", "ADDR", "REG", "VALUE"])]
    #[clap(num_args = 4)]
    smbus_write_word: Vec<u16>,
}

/// Values of a flag that takes exactly `count` values, if it was given
///
/// Repeating the flag appends more values, which has no meaning here.
fn exactly<'a, T>(
    cli: &mut Command,
    arg: &str,
    values: &'a [T],
    count: usize,
) -> Result<Option<&'a [T]>, clap::Error> {
    match values.len() {
        0 => Ok(None),
        n if n == count => Ok(Some(values)),
        _ => Err(cli.error(
            ErrorKind::TooManyValues,
            format!("--{} can only be given once", arg),
        )),
    }
}

fn pair(cli: &mut Command, arg: &str, values: &[u8]) -> Result<Option<(u8, u8)>, clap::Error> {
    Ok(exactly(cli, arg, values, 2)?.map(|v| (v[0], v[1])))
}

fn get_or_set(
    cli: &mut Command,
    arg: &str,
    values: &[u8],
) -> Result<Option<(u8, Option<u8>)>, clap::Error> {
    match values.len() {
        0 => Ok(None),
        1 => Ok(Some((values[0], None))),
        2 => Ok(Some((values[0], Some(values[1])))),
        _ => Err(cli.error(
            ErrorKind::TooManyValues,
            format!("--{} can only be given once", arg),
        )),
    }
}

fn request(values: &[u8]) -> SmbusRequest {
    SmbusRequest {
        channel: values[0],
        slave_address: values[1],
        register: values[2],
    }
}

fn byte(cli: &mut Command, what: &str, arg: &str, value: u16) -> Result<u8, clap::Error> {
    u8::try_from(value).map_err(|_| {
        cli.error(
            ErrorKind::InvalidValue,
            format!("{} of --{} must fit in a byte", what, arg),
        )
    })
}

/// Split CHANNEL ADDR REG VALUE, where only VALUE may be wider than a byte
fn request_with_value(
    cli: &mut Command,
    arg: &str,
    values: &[u16],
) -> Result<(SmbusRequest, u16), clap::Error> {
    let mut bytes = [0_u8; 3];
    for (b, value) in bytes.iter_mut().zip(values) {
        *b = byte(cli, "CHANNEL, ADDR and REG", arg, *value)?;
    }
    Ok((request(&bytes), values[3]))
}

fn smbus_arg(cli: &mut Command, args: &ClapCli) -> Result<Option<SmbusArg>, clap::Error> {
    let read_byte = exactly(cli, "smbus-read-byte", &args.smbus_read_byte, 3)?;
    let write_byte = exactly(cli, "smbus-write-byte", &args.smbus_write_byte, 4)?;
    let read_word = exactly(cli, "smbus-read-word", &args.smbus_read_word, 3)?;
    let write_word = exactly(cli, "smbus-write-word", &args.smbus_write_word, 4)?;

    let given = [
        read_byte.is_some(),
        write_byte.is_some(),
        read_word.is_some(),
        write_word.is_some(),
    ];
    if given.iter().filter(|x| **x).count() > 1 {
        return Err(cli.error(
            ErrorKind::ArgumentConflict,
            "Only one SMBus operation can be run at a time",
        ));
    }

    if let Some(values) = read_byte {
        Ok(Some(SmbusArg::ReadByte(request(values))))
    } else if let Some(values) = read_word {
        Ok(Some(SmbusArg::ReadWord(request(values))))
    } else if let Some(values) = write_byte {
        let (request, value) = request_with_value(cli, "smbus-write-byte", values)?;
        let value = byte(cli, "VALUE", "smbus-write-byte", value)?;
        Ok(Some(SmbusArg::WriteByte(request, value)))
    } else if let Some(values) = write_word {
        let (request, value) = request_with_value(cli, "smbus-write-word", values)?;
        Ok(Some(SmbusArg::WriteWord(request, value)))
    } else {
        Ok(None)
    }
}

/// Parse commandline arguments, handing back any usage error
pub fn try_parse(args: &[String]) -> Result<Cli, clap::Error> {
    let cli = command!().disable_version_flag(true);
    let mut cli = ClapCli::augment_args(cli);

    let matches = cli.clone().try_get_matches_from(args)?;
    let args = ClapCli::from_arg_matches(&matches)?;
    let cli = &mut cli;

    Ok(Cli {
        verbosity: LogLevel(args.verbosity.log_level_filter()),
        version: args.version,
        info: args.info,
        product_name: args.product_name.clone(),
        config: args.config.clone(),
        table: args.table,
        ram_read: args.ram_read,
        ram_write: pair(cli, "ram-write", &args.ram_write)?,
        ram_dump: args.ram_dump,
        ext_ram_read: args.ext_ram_read,
        ext_ram_write: pair(cli, "ext-ram-write", &args.ext_ram_write)?,
        raw_command: args.raw_command,
        acpi_read: args.acpi_read,
        acpi_write: pair(cli, "acpi-write", &args.acpi_write)?,
        gpio_status: get_or_set(cli, "gpio-status", &args.gpio_status)?,
        gpio_dir: get_or_set(cli, "gpio-dir", &args.gpio_dir)?,
        ad: pair(cli, "ad", &args.ad)?,
        onekey_read: args.onekey_read,
        onekey_set: args.onekey_set,
        oem_read: args.oem_read,
        oem_write: pair(cli, "oem-write", &args.oem_write)?,
        smbus: smbus_arg(cli, &args)?,
    })
}

/// Parse commandline arguments. Exits on error or when help is requested
pub fn parse(args: &[String]) -> Cli {
    try_parse(args).unwrap_or_else(|err| err.exit())
}
