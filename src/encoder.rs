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

//! GELF serialization.
//!
//! A [`GelfMessage`] goes out on the wire as a JSON object, compressed. Graylog will sniff the
//! compression scheme from the first bytes of each datagram, so gzip (the default), zlib and
//! uncompressed payloads are all acceptable.

use crate::{
    error::{Error, Result},
    message::GelfMessage,
};

use backtrace::Backtrace;
use flate2::write::{GzEncoder, ZlibEncoder};
use serde::Deserialize;

use std::io::Write;

/// How the JSON text is compressed before transport.
///
/// Names are matched without regard to case, whether parsed or deserialized.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub enum Compression {
    /// RFC 1952 (DEFLATE with a gzip header & trailer)
    #[default]
    Gzip,
    /// RFC 1950 (DEFLATE with a zlib header & checksum)
    Zlib,
    /// Plain UTF-8 JSON
    None,
}

impl std::str::FromStr for Compression {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gzip" => Ok(Compression::Gzip),
            "zlib" => Ok(Compression::Zlib),
            "none" => Ok(Compression::None),
            _ => Err(Error::bad_config(format!(
                "unknown compression scheme '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Compression {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

fn encoding_error<E>(err: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::Encoding {
        source: Box::new(err),
        back: Backtrace::new(),
    }
}

/// Renders [`GelfMessage`]s to compressed bytes.
///
/// The encoder holds no state between calls; the output is a pure function of the message's
/// current fields.
#[derive(Copy, Clone, Debug, Default)]
pub struct GelfEncoder {
    compression: Compression,
}

impl GelfEncoder {
    pub fn new(compression: Compression) -> GelfEncoder {
        GelfEncoder { compression }
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// The canonical JSON text for `msg`: keys in sorted order, numbers in their shortest
    /// round-tripping form (so no superfluous trailing zeros).
    pub fn to_json(&self, msg: &GelfMessage) -> Result<String> {
        serde_json::to_string(msg).map_err(encoding_error)
    }

    pub fn encode(&self, msg: &GelfMessage) -> Result<Vec<u8>> {
        let json = self.to_json(msg)?;
        match self.compression {
            Compression::Gzip => {
                let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
                enc.write_all(json.as_bytes()).map_err(encoding_error)?;
                enc.finish().map_err(encoding_error)
            }
            Compression::Zlib => {
                let mut enc = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                enc.write_all(json.as_bytes()).map_err(encoding_error)?;
                enc.finish().map_err(encoding_error)
            }
            Compression::None => Ok(json.into_bytes()),
        }
    }
}

/// Serialize `msg` with the default (gzip) encoder.
pub fn serialize(msg: &GelfMessage) -> Result<Vec<u8>> {
    GelfEncoder::default().encode(msg)
}
