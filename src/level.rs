// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-udp.
//
// gelf-udp is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-udp is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-udp.  If not,
// see <http://www.gnu.org/licenses/>.

//! GELF severity levels.
//!
//! GELF borrows its `level` field from syslog: [`Level`] replicates the names used in
//! `<syslog.h>`, and its discriminants are the integers that go out on the wire.

use crate::error::{Error, FieldViolation, Violation};

type StdResult<T, E> = std::result::Result<T, E>;

/// RFC [5424] defines eight severity levels for messages. The enumeration values duplicate the
/// constants documented as per the `syslog()` manual [page] & defined in `<syslog.h>`; GELF uses
/// them unchanged.
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
/// [page]: https://man7.org/linux/man-pages/man3/syslog.3.html
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// system is unusable
    LOG_EMERG,
    /// action must be take immediately
    LOG_ALERT,
    /// critical conditions
    LOG_CRIT,
    /// error conditions
    LOG_ERR,
    /// warning conditions
    LOG_WARNING,
    /// normal, but significant condition
    LOG_NOTICE,
    /// informational message
    LOG_INFO,
    /// debug-level message
    LOG_DEBUG,
}

impl std::default::Default for Level {
    /// GELF receivers assume ALERT when no level is given, and so do we.
    fn default() -> Self {
        Level::LOG_ALERT
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Level::LOG_EMERG => "LOG_EMERG",
                Level::LOG_ALERT => "LOG_ALERT",
                Level::LOG_CRIT => "LOG_CRIT",
                Level::LOG_ERR => "LOG_ERR",
                Level::LOG_WARNING => "LOG_WARNING",
                Level::LOG_NOTICE => "LOG_NOTICE",
                Level::LOG_INFO => "LOG_INFO",
                Level::LOG_DEBUG => "LOG_DEBUG",
            }
        )
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        level as u8
    }
}

impl std::convert::TryFrom<i64> for Level {
    type Error = Error;
    fn try_from(x: i64) -> StdResult<Self, Self::Error> {
        match x {
            0 => Ok(Level::LOG_EMERG),
            1 => Ok(Level::LOG_ALERT),
            2 => Ok(Level::LOG_CRIT),
            3 => Ok(Level::LOG_ERR),
            4 => Ok(Level::LOG_WARNING),
            5 => Ok(Level::LOG_NOTICE),
            6 => Ok(Level::LOG_INFO),
            7 => Ok(Level::LOG_DEBUG),
            _ => Err(Error::bad_field(FieldViolation::new(
                crate::message::LEVEL,
                Violation::LevelOutOfRange(x),
            ))),
        }
    }
}

impl std::convert::TryFrom<u8> for Level {
    type Error = Error;
    fn try_from(x: u8) -> StdResult<Self, Self::Error> {
        Level::try_from(x as i64)
    }
}

#[cfg(test)]
mod level_tests {
    use super::*;
    #[test]
    fn test_level() {
        assert_eq!(3, u8::from(Level::LOG_ERR));
        assert_eq!(format!("{}", Level::LOG_DEBUG), "LOG_DEBUG".to_string());
        for i in 0..8_u8 {
            assert_eq!(u8::from(Level::try_from(i).unwrap()), i);
        }
        assert!(Level::try_from(8_u8).is_err());
        assert!(Level::try_from(-1_i64).is_err());
        assert_eq!(Level::default(), Level::LOG_ALERT);
    }
}
