//! A library to drive the Advantech AHC1EC0 embedded controller and build tools to do so.

extern crate alloc;

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate log;

#[cfg(feature = "std")]
pub mod commandline;
pub mod config;
pub mod ec;
mod os_specific;
pub mod util;

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
