//! Real port backend using raw port I/O
//!
//! Userspace first has to ask the kernel for access to the two ports, which
//! needs root. On Linux that's `ioperm`, on FreeBSD the process has I/O
//! privilege for as long as it holds `/dev/io` open.

use alloc::string::ToString;
#[cfg(any(test, all(target_os = "freebsd", feature = "freebsd_pio")))]
use std::fs::File;
#[cfg(any(test, all(target_os = "freebsd", feature = "freebsd_pio")))]
use std::path::Path;

use hwio::{Io, Pio};
#[cfg(all(target_os = "linux", feature = "linux_pio"))]
use libc::ioperm;
#[cfg(all(any(target_os = "linux", target_os = "freebsd"), feature = "unix"))]
use nix::unistd::Uid;
use spin::Mutex;

use crate::ec::protocol::*;
use crate::ec::{EcError, EcPort, EcResult};

#[derive(PartialEq)]
enum Initialized {
    NotYet,
    Succeeded,
    Failed,
}

lazy_static! {
    static ref INITIALIZED: Mutex<Initialized> = Mutex::new(Initialized::NotYet);
}

#[cfg(all(target_os = "freebsd", feature = "freebsd_pio"))]
const IO_DEVICE_PATH: &str = "/dev/io";

#[cfg(all(target_os = "freebsd", feature = "freebsd_pio"))]
lazy_static! {
    // Closing it drops the I/O privilege again
    static ref IO_DEVICE: Mutex<Option<File>> = Mutex::new(None);
}

#[cfg(any(test, all(target_os = "freebsd", feature = "freebsd_pio")))]
fn open_io_device(path: &Path) -> EcResult<File> {
    std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|err| {
            error!("Failed to open {}: {}", path.display(), err);
            EcError::DeviceError(format!("Failed to open {}: {}", path.display(), err))
        })
}

fn init() -> EcResult<()> {
    let mut init = INITIALIZED.lock();
    match *init {
        // Can directly give up, trying again won't help
        Initialized::Failed => {
            return Err(EcError::DeviceError(
                "Port I/O access was denied before".to_string(),
            ))
        }
        Initialized::Succeeded => return Ok(()),
        Initialized::NotYet => {}
    }

    #[cfg(all(any(target_os = "linux", target_os = "freebsd"), feature = "unix"))]
    if !Uid::effective().is_root() {
        error!("Must be root to use port based I/O for EC communication.");
        *init = Initialized::Failed;
        return Err(EcError::DeviceError("Not running as root".to_string()));
    }

    // Data and command port are adjacent, 0x299 and 0x29A
    #[cfg(all(target_os = "linux", feature = "linux_pio"))]
    unsafe {
        let res = ioperm(EC_DATA_PORT as u64, 2, 1);
        if res != 0 {
            error!("ioperm failed. port access is likely blocked by Linux kernel lockdown mode");
            *init = Initialized::Failed;
            return Err(EcError::DeviceError("ioperm failed".to_string()));
        }
    }

    #[cfg(all(target_os = "freebsd", feature = "freebsd_pio"))]
    match open_io_device(Path::new(IO_DEVICE_PATH)) {
        Ok(file) => *IO_DEVICE.lock() = Some(file),
        Err(err) => {
            *init = Initialized::Failed;
            return Err(err);
        }
    }

    debug!(
        "Got access to EC ports {:#X}/{:#X}",
        EC_COMMAND_PORT, EC_DATA_PORT
    );
    *init = Initialized::Succeeded;
    Ok(())
}

/// The EC's command/data port pair
pub struct PortIo {
    command: Pio<u8>,
    data: Pio<u8>,
}

impl PortIo {
    pub fn new() -> EcResult<Self> {
        init()?;
        Ok(PortIo {
            command: Pio::new(EC_COMMAND_PORT),
            data: Pio::new(EC_DATA_PORT),
        })
    }
}

impl EcPort for PortIo {
    fn read_status(&mut self) -> u8 {
        self.command.read()
    }

    fn write_command(&mut self, command: u8) {
        self.command.write(command)
    }

    fn read_data(&mut self) -> u8 {
        self.data.read()
    }

    fn write_data(&mut self, data: u8) {
        self.data.write(data)
    }
}
