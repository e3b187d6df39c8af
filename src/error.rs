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

//! [gelf-udp](crate) errors

use backtrace::Backtrace;

/// The ways in which a single field value can be unacceptable to a [`GelfMessage`].
///
/// [`GelfMessage`]: crate::message::GelfMessage
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Violation {
    /// `level` must lie in [0, 7]
    LevelOutOfRange(i64),
    /// `line` may not be negative (other than the "no line" sentinel)
    NegativeLine(i64),
    /// `_id` is reserved by Graylog
    ReservedKey,
    /// field names may not be empty
    EmptyKey,
    /// the field requires a value of a different type
    WrongType { expected: &'static str },
    /// NaN & the infinities have no JSON representation
    NotFinite,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Violation::LevelOutOfRange(l) => write!(f, "level {} is not in the range [0, 7]", l),
            Violation::NegativeLine(l) => write!(f, "line {} is negative", l),
            Violation::ReservedKey => write!(f, "the key is reserved"),
            Violation::EmptyKey => write!(f, "the key is empty"),
            Violation::WrongType { expected } => write!(f, "expected a value of type {}", expected),
            Violation::NotFinite => write!(f, "the value is not a finite number"),
        }
    }
}

/// A [`Violation`] together with the (normalized) key to which it applies.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldViolation {
    pub key: String,
    pub violation: Violation,
}

impl FieldViolation {
    pub fn new<K: Into<String>>(key: K, violation: Violation) -> FieldViolation {
        FieldViolation {
            key: key.into(),
            violation,
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "field '{}': {}", self.key, self.violation)
    }
}

/// [gelf-udp](crate) error type
///
/// Like its cousin [tracing-rfc-5424], [gelf-udp](crate) eschews libraries like [thiserror],
/// [anyhow] & [Snafu] in favor of a straightforward enumeration with a few match arms chosen on
/// the basis what the caller will need to repond.
///
/// [tracing-rfc-5424]: https://docs.rs/tracing-rfc-5424
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// A single field value was rejected; the message was left unchanged
    BadField {
        violation: FieldViolation,
        back: Backtrace,
    },
    /// One or more initial fields were rejected; no message was produced
    Construction {
        violations: Vec<FieldViolation>,
        back: Backtrace,
    },
    /// The field is not present in the message
    NoSuchField { key: String, back: Backtrace },
    /// `version`, `host` & `short_message` cannot be removed
    RequiredField { key: String, back: Backtrace },
    /// The payload needs more chunks than the one-byte chunk count can express
    TooManyChunks {
        len: usize,
        chunk_size: usize,
        count: usize,
        back: Backtrace,
    },
    /// Failed to render or compress a message
    Encoding {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Malformed configuration
    BadConfig { reason: String, back: Backtrace },
}

impl Error {
    pub(crate) fn bad_field(violation: FieldViolation) -> Error {
        Error::BadField {
            violation,
            back: Backtrace::new(),
        }
    }
    pub(crate) fn bad_config<S: Into<String>>(reason: S) -> Error {
        Error::BadConfig {
            reason: reason.into(),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn transport<E>(err: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        }
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadField { violation, .. } => write!(f, "Invalid GELF {}", violation),
            Error::Construction { violations, .. } => {
                write!(f, "Couldn't build a GELF message; ")?;
                let mut first = true;
                for v in violations {
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                    first = false;
                }
                Ok(())
            }
            Error::NoSuchField { key, .. } => write!(f, "No field '{}' in this message", key),
            Error::RequiredField { key, .. } => {
                write!(f, "'{}' is a required GELF field & can't be removed", key)
            }
            Error::TooManyChunks {
                len,
                chunk_size,
                count,
                ..
            } => write!(
                f,
                "A payload of {} bytes would need {} chunks of {} bytes; at most {} are allowed",
                len,
                count,
                chunk_size,
                crate::chunk::MAX_CHUNK_COUNT
            ),
            Error::Encoding { source, .. } => write!(f, "While encoding a message, got {}", source),
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            Error::BadConfig { reason, .. } => write!(f, "Bad configuration: {}", reason),
            _ => write!(f, "Other gelf-udp error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadField { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Construction { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::NoSuchField { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::RequiredField { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::TooManyChunks { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Encoding { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Transport { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::BadConfig { back, .. } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "gelf-udp error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
