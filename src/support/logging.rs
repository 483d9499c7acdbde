//-
// Copyright (c) 2025, Davchain contributors
//
// This file is part of Davchain.
//
// Davchain is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Davchain is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Davchain. If not, see <http://www.gnu.org/licenses/>.

//! Process-wide logging setup.

use std::path::Path;

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use super::error::Error;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}][{t}] {m}{n}";

/// Initialise logging for the process.
///
/// If `<root>/logging.toml` exists, it is handed to log4rs verbatim.
/// Otherwise everything at `Info` and above goes to standard error.
pub fn init(root: &Path) -> Result<(), Error> {
    let log_config_file = root.join("logging.toml");
    if log_config_file.is_file() {
        log4rs::init_file(
            log_config_file,
            log4rs::file::Deserializers::new(),
        )
        .map_err(|e| Error::Logging(e.to_string()))
    } else {
        init_stderr(LevelFilter::Info)
    }
}

/// Send everything at `level` and above to standard error.
pub fn init_stderr(level: LevelFilter) -> Result<(), Error> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| Error::Logging(e.to_string()))?;

    log4rs::init_config(config)
        .map(|_| ())
        .map_err(|e| Error::Logging(e.to_string()))
}
