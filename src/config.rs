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

//! [gelf-udp](crate) configuration.
//!
//! [`GelfConfig`] may be built in code, deserialized (from JSON, or any other format [serde]
//! speaks), or read from a flat list of `key=value` properties of the sort logging frameworks
//! commonly keep in their configuration files:
//!
//! ```text
//! udp.host=graylog.example.com
//! udp.port=12201
//! udp.maxChunkSize=1024
//! facility=billing
//! includeLocationInformation=true
//! additionalFields=env:prod, region:us-west-2
//! additionalField.team=payments
//! ```
//!
//! [serde]: https://serde.rs

use crate::{
    encoder::Compression,
    error::{Error, Result},
    message::{GELF_VERSION, UNKNOWN_HOST},
};

use serde::Deserialize;

use std::collections::BTreeMap;

pub const DEFAULT_GRAYLOG_HOST: &str = "localhost";
pub const DEFAULT_GRAYLOG_PORT: u16 = 12201;
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
/// Chunk size meaning "never chunk".
pub const DISABLE_CHUNKING: usize = 0;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GelfConfig {
    /// Graylog host
    pub host: String,
    /// Graylog GELF UDP input port
    pub port: u16,
    /// Maximum payload bytes per chunk; [`DISABLE_CHUNKING`] sends every message whole
    pub chunk_size: usize,
    /// Copy file & line information from records into messages
    pub include_location: bool,
    /// Fixed facility; when `None`, each record's logger name is used
    pub facility: Option<String>,
    /// Value for the GELF `host` field; discovered when `None`
    pub logging_host: Option<String>,
    /// Added to every message
    pub additional_fields: BTreeMap<String, String>,
    pub version: String,
    pub compression: Compression,
}

impl std::default::Default for GelfConfig {
    fn default() -> Self {
        GelfConfig {
            host: DEFAULT_GRAYLOG_HOST.to_owned(),
            port: DEFAULT_GRAYLOG_PORT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            include_location: false,
            facility: None,
            logging_host: None,
            additional_fields: BTreeMap::new(),
            version: GELF_VERSION.to_owned(),
            compression: Compression::default(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| Error::bad_config(format!("{} should be a number, not '{}'", key, value)))
}

impl GelfConfig {
    pub fn from_json(text: &str) -> Result<GelfConfig> {
        serde_json::from_str(text).map_err(|err| Error::bad_config(format!("{}", err)))
    }

    /// Read configuration from `key`/`value` pairs; keys this crate doesn't recognize are
    /// ignored.
    pub fn from_properties<I, K, V>(props: I) -> Result<GelfConfig>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut cfg = GelfConfig::default();
        for (key, value) in props {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "udp.host" => cfg.host = value.trim().to_owned(),
                "udp.port" => cfg.port = parse_number(key, value)?,
                "udp.maxChunkSize" => cfg.chunk_size = parse_number(key, value)?,
                "facility" => {
                    cfg.facility = Some(value.to_owned()).filter(|f| !f.is_empty());
                }
                "includeLocationInformation" => {
                    cfg.include_location =
                        value.trim_start().starts_with(|c: char| c == 't' || c == 'T')
                }
                "loggingHostName" => cfg.logging_host = Some(value.trim().to_owned()),
                "additionalFields" => cfg.add_additional_fields(value)?,
                "version" => cfg.version = value.trim().to_owned(),
                "compression" => cfg.compression = value.trim().parse()?,
                _ => {
                    if let Some(name) = key.strip_prefix("additionalField.") {
                        cfg.additional_fields
                            .insert(name.to_owned(), value.to_owned());
                    }
                }
            }
        }
        Ok(cfg)
    }

    /// Parse `fields` (see [`parse_additional_fields`]) & add them to this configuration. On
    /// error, the configuration is unchanged.
    pub fn add_additional_fields(&mut self, fields: &str) -> Result<()> {
        let fields = parse_additional_fields(fields)?;
        self.additional_fields.extend(fields);
        Ok(())
    }

    pub fn endpoint(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    /// The configured logging host, or else the one [`discover_hostname`] finds.
    pub fn resolve_logging_host(&self) -> String {
        match &self.logging_host {
            Some(host) if !host.is_empty() => host.clone(),
            _ => discover_hostname(),
        }
    }
}

/// Parse a comma-separated list of `key:value` pairs, trimming whitespace around each key &
/// value; `"env: prod, region :eu"` yields `{"env": "prod", "region": "eu"}`.
pub fn parse_additional_fields(fields: &str) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for field in fields.split(',').filter(|f| !f.trim().is_empty()) {
        let parts: Vec<&str> = field.split(':').collect();
        match parts.as_slice() {
            [key, value] if !key.trim().is_empty() => {
                out.insert(key.trim().to_owned(), value.trim().to_owned());
            }
            _ => {
                return Err(Error::bad_config(format!(
                    "'{}' is not of the form key:value",
                    field.trim()
                )))
            }
        }
    }
    Ok(out)
}

/// Attempt to figure-out a name for this host.
///
/// Tries [gethostname()] first, then the first local IP address; if neither is available,
/// returns [`UNKNOWN_HOST`]. This can't fail.
///
/// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
pub fn discover_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|hn| hn.into_string().ok())
        .filter(|hn| !hn.is_empty())
        .or_else(|| local_ip_address::local_ip().ok().map(|ip| ip.to_string()))
        .unwrap_or_else(|| UNKNOWN_HOST.to_owned())
}
