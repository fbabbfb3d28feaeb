//! Helper functions that need OS/platform specific implementations

use alloc::string::{String, ToString};
use std::{thread, time};

#[cfg(all(target_family = "unix", feature = "unix"))]
pub fn get_os_version() -> String {
    if let Ok(uts) = nix::sys::utsname::uname() {
        // uname -a without hostname
        format!(
            "{} {} {} {}",
            uts.sysname().to_string_lossy(),
            uts.release().to_string_lossy(),
            uts.version().to_string_lossy(),
            uts.machine().to_string_lossy(),
        )
    } else {
        "Unknown".to_string()
    }
}

#[cfg(not(all(target_family = "unix", feature = "unix")))]
pub fn get_os_version() -> String {
    "Unknown".to_string()
}

/// Sleep a number of microseconds
pub fn sleep(micros: u64) {
    let duration = time::Duration::from_micros(micros);
    thread::sleep(duration);
}
