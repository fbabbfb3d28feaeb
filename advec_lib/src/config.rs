//! Runtime tuning of the EC polling bounds
//!
//! Read from `advec_config.toml`, next to the executable or in the current
//! working directory:
//!
//! ```toml
//! [poll]
//! max_attempts = 1000
//! interval_us = 50
//!
//! [smbus]
//! max_attempts = 1000
//! interval_us = 50
//! ```
//!
//! Every key is optional, what's left out keeps its default.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ec::{EcConfig, PollConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Config {
    poll: Option<Poll>,
    smbus: Option<Poll>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Poll {
    max_attempts: Option<u32>,
    interval_us: Option<u64>,
}

impl Poll {
    fn apply(&self, poll: &mut PollConfig) {
        if let Some(max_attempts) = self.max_attempts {
            poll.max_attempts = max_attempts;
        }
        if let Some(interval_us) = self.interval_us {
            poll.interval_us = interval_us;
        }
    }
}

pub const CONFIG_FILE: &str = "advec_config.toml";

fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![];
    if let Ok(mut path) = std::env::current_exe() {
        path.pop();
        path.push(CONFIG_FILE);
        paths.push(path);
    }
    paths.push(CONFIG_FILE.into());
    paths
}

fn read_config_file(path: Option<&Path>) -> Option<(PathBuf, String)> {
    if let Some(path) = path {
        return match std::fs::read_to_string(path) {
            Ok(str) => Some((path.to_path_buf(), str)),
            Err(err) => {
                error!("Failed to read {}: {}", path.display(), err);
                None
            }
        };
    }

    config_paths()
        .into_iter()
        .find_map(|path| std::fs::read_to_string(&path).ok().map(|str| (path, str)))
}

/// Parse a config file, on top of the defaults
pub fn parse_config(toml_str: &str) -> Result<EcConfig, toml::de::Error> {
    let decoded: Config = toml::from_str(toml_str)?;
    trace!("{:?}", decoded);

    let mut config = EcConfig::default();
    if let Some(poll) = &decoded.poll {
        poll.apply(&mut config.poll);
    }
    if let Some(smbus) = &decoded.smbus {
        smbus.apply(&mut config.smbus_poll);
    }
    Ok(config)
}

/// Load the config from `path`, or from the default locations
///
/// Never fails. If there's no file or it can't be parsed, the defaults are used.
pub fn load_config(path: Option<&Path>) -> EcConfig {
    let Some((path, toml_str)) = read_config_file(path) else {
        debug!("No {}, using defaults", CONFIG_FILE);
        return EcConfig::default();
    };

    match parse_config(&toml_str) {
        Ok(config) => {
            debug!("Loaded {}: {:?}", path.display(), config);
            config
        }
        Err(err) => {
            error!("Invalid config {}, using defaults: {}", path.display(), err);
            EcConfig::default()
        }
    }
}
