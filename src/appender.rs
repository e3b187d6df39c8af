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

//! From log records to GELF datagrams.
//!
//! [`Appender`] ties the pieces of this crate together: it turns a [`Record`] into a
//! [`GelfMessage`] according to a [`GelfConfig`], serializes it, and hands the result to its
//! [`Transport`]. [`Record`] is deliberately neutral: adapting the event type of any particular
//! logging framework to it is left to the caller.

use crate::{
    config::GelfConfig,
    encoder::GelfEncoder,
    error::Result,
    level::Level,
    message::{GelfMessage, FILE, LINE},
    transport::{Transport, UdpTransport},
};

use chrono::prelude::*;
use tracing::debug;

use std::collections::BTreeMap;

/// Graylog truncates anything longer; we leave room for nothing more than this.
pub const SHORT_MESSAGE_LENGTH: usize = 250;

/// A single log event, independent of any logging framework.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub message: String,
    pub level: Level,
    pub timestamp: DateTime<Utc>,
    /// Name of the logger (or module, or target) that produced the event
    pub logger: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub thread: Option<String>,
    /// Nested diagnostic context, if the framework keeps one
    pub context: Option<String>,
}

impl Record {
    /// A record timestamped now, with no logger, location, thread or context.
    pub fn new<S: Into<String>>(level: Level, message: S) -> Record {
        Record {
            message: message.into(),
            level,
            timestamp: Utc::now(),
            logger: String::new(),
            file: None,
            line: None,
            thread: None,
            context: None,
        }
    }
    pub fn with_logger<S: Into<String>>(mut self, logger: S) -> Self {
        self.logger = logger.into();
        self
    }
    pub fn with_location<S: Into<String>>(mut self, file: S, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
    pub fn with_thread<S: Into<String>>(mut self, thread: S) -> Self {
        self.thread = Some(thread.into());
        self
    }
    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Seconds since the epoch, microseconds in the fractional part.
fn gelf_timestamp(t: &DateTime<Utc>) -> f64 {
    t.timestamp() as f64 + t.timestamp_subsec_micros() as f64 / 1_000_000.0
}

/// The first [`SHORT_MESSAGE_LENGTH`] - 1 characters of `msg`.
fn short_message(msg: &str) -> &str {
    match msg.char_indices().nth(SHORT_MESSAGE_LENGTH - 1) {
        Some((idx, _)) => &msg[..idx],
        None => msg,
    }
}

/// Sends [`Record`]s to Graylog via its [`Transport`].
///
/// Once [`close`](Appender::close)d, an [`Appender`] quietly discards records until it's given a
/// new transport.
pub struct Appender<T: Transport> {
    encoder: GelfEncoder,
    transport: Option<T>,
    host: String,
    version: String,
    facility: Option<String>,
    include_location: bool,
    additional_fields: BTreeMap<String, String>,
}

impl Appender<UdpTransport> {
    /// Attempt to construct an [`Appender`] that will send gzipped GELF messages via UDP to port
    /// 12201 on localhost
    pub fn try_default() -> Result<Self> {
        Appender::from_config(&GelfConfig::default())
    }
    /// Construct an [`Appender`] that will send to the UDP endpoint named in `cfg`
    pub fn from_config(cfg: &GelfConfig) -> Result<Self> {
        Appender::with_transport(cfg, UdpTransport::from_config(cfg)?)
    }
}

impl<T: Transport> Appender<T> {
    /// Construct an [`Appender`] configured by `cfg` that will send via `transport`; `cfg`'s
    /// endpoint & chunk size go unused.
    ///
    /// Fails with [`Error::Construction`](crate::error::Error::Construction) if any of the static
    /// additional fields can't be stored in a message.
    pub fn with_transport(cfg: &GelfConfig, transport: T) -> Result<Self> {
        // Trial run: surfaces every unusable static field at once.
        GelfMessage::from_fields(
            cfg.additional_fields
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )?;
        Ok(Appender {
            encoder: GelfEncoder::new(cfg.compression),
            transport: Some(transport),
            host: cfg.resolve_logging_host(),
            version: cfg.version.clone(),
            facility: cfg.facility.clone(),
            include_location: cfg.include_location,
            additional_fields: cfg.additional_fields.clone(),
        })
    }

    /// `None` once closed
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// Replace the transport (re-opening a closed [`Appender`]), returning the old one, if any.
    pub fn set_transport(&mut self, transport: T) -> Option<T> {
        self.transport.replace(transport)
    }

    /// Release the transport; subsequent calls to [`append`](Appender::append) send nothing.
    /// Idempotent.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!(host = %self.host, "Closed GELF appender.");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// Static fields added to every message
    pub fn additional_fields(&self) -> &BTreeMap<String, String> {
        &self.additional_fields
    }

    /// Add (or replace) a static field; `key` is checked just as at construction & on failure
    /// nothing changes.
    pub fn additional_field(&mut self, key: &str, value: &str) -> Result<()> {
        GelfMessage::from_fields(vec![(key, value)])?;
        self.additional_fields.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    pub fn clear_additional_fields(&mut self) {
        self.additional_fields.clear();
    }

    pub fn include_location(&self) -> bool {
        self.include_location
    }

    pub fn set_include_location(&mut self, include_location: bool) {
        self.include_location = include_location;
    }

    /// The value sent in every message's `host` field
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the [`GelfMessage`] for `record`.
    pub fn message_for(&self, record: &Record) -> Result<GelfMessage> {
        let mut msg = GelfMessage::builder()
            .version(&self.version)
            .host(&self.host)
            .short_message(short_message(&record.message))
            .full_message(&record.message)
            .timestamp(gelf_timestamp(&record.timestamp))
            .level(record.level)
            .facility(self.facility.as_deref().unwrap_or(&record.logger))
            .build()?;

        if self.include_location {
            if let Some(file) = &record.file {
                msg.set(FILE, file.as_str())?;
            }
            if let Some(line) = record.line {
                msg.set(LINE, line)?;
            }
        }

        for (key, value) in &self.additional_fields {
            msg.set_additional(key, value.as_str())?;
        }

        msg.set_additional("logger_name", record.logger.as_str())?;
        if let Some(thread) = &record.thread {
            msg.set_additional("thread", thread.as_str())?;
        }
        if let Some(ndc) = record.context.as_deref().filter(|c| !c.is_empty()) {
            msg.set_additional("ndc", ndc)?;
        }
        Ok(msg)
    }

    /// Format, encode & send `record`, returning the number of datagrams submitted (zero if
    /// closed).
    pub fn append(&self, record: &Record) -> Result<usize> {
        match &self.transport {
            Some(transport) => {
                let msg = self.message_for(record)?;
                transport.send(&self.encoder.encode(&msg)?)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod smoke {

    use super::*;

    use crate::{
        chunk::{ChunkHeader, CHUNK_HEADER_LEN},
        encoder::Compression,
        error::Error,
        message::Value,
        transport::{MemorySender, MemoryTransport},
    };

    use flate2::read::GzDecoder;

    use std::io::Read;

    fn test_config() -> GelfConfig {
        GelfConfig {
            logging_host: Some("bree.local".to_owned()),
            ..GelfConfig::default()
        }
    }

    #[test]
    fn test_message_for() {
        let app =
            Appender::with_transport(&test_config(), MemoryTransport::new(MemorySender::default(), 0))
                .unwrap();
        let record = Record::new(Level::LOG_WARNING, "Hello, 世界!")
            .with_logger("unit-tests")
            .with_location("src/appender.rs", 42)
            .with_timestamp(Utc.timestamp_opt(1654000000, 250_000_000).unwrap())
            .with_thread("main");
        let msg = app.message_for(&record).unwrap();
        assert_eq!(msg.host(), "bree.local");
        assert_eq!(msg.version(), "1.0");
        assert_eq!(msg.short_message(), "Hello, 世界!");
        assert_eq!(msg.full_message(), Some("Hello, 世界!"));
        assert_eq!(msg.timestamp(), Some(1654000000.25));
        assert_eq!(msg.level(), Some(Level::LOG_WARNING));
        // no configured facility, so the logger name is used
        assert_eq!(msg.facility(), Some("unit-tests"));
        // location information is off by default
        assert!(msg.file().is_none());
        assert!(msg.line().is_none());
        assert_eq!(msg.get("_logger_name").unwrap(), &Value::from("unit-tests"));
        assert_eq!(msg.get("_thread").unwrap(), &Value::from("main"));
        assert!(!msg.contains("_ndc"));
    }

    #[test]
    fn test_configured_fields() {
        let mut cfg = test_config();
        cfg.facility = Some("billing".to_owned());
        cfg.include_location = true;
        cfg.add_additional_fields("env:prod, region:eu").unwrap();
        let app =
            Appender::with_transport(&cfg, MemoryTransport::new(MemorySender::default(), 0)).unwrap();
        let record = Record::new(Level::LOG_ERR, "boom")
            .with_logger("payments")
            .with_location("src/pay.rs", 7)
            .with_context("req=42");
        let msg = app.message_for(&record).unwrap();
        assert_eq!(msg.facility(), Some("billing"));
        assert_eq!(msg.file(), Some("src/pay.rs"));
        assert_eq!(msg.line(), Some(7));
        assert_eq!(msg.get("env").unwrap(), &Value::from("prod"));
        assert_eq!(msg.get("_region").unwrap(), &Value::from("eu"));
        assert_eq!(msg.get("_ndc").unwrap(), &Value::from("req=42"));
    }

    #[test]
    fn test_bad_static_fields() {
        let mut cfg = test_config();
        cfg.additional_fields.insert("id".to_owned(), "x".to_owned());
        cfg.additional_fields.insert("".to_owned(), "y".to_owned());
        match Appender::with_transport(&cfg, MemoryTransport::new(MemorySender::default(), 0)) {
            Err(Error::Construction { violations, .. }) => assert_eq!(violations.len(), 2),
            _ => panic!("expected both keys to be rejected"),
        }
    }

    #[test]
    fn test_short_message_truncation() {
        let long: String = std::iter::repeat('é').take(1000).collect();
        assert_eq!(short_message(&long).chars().count(), SHORT_MESSAGE_LENGTH - 1);
        assert_eq!(short_message("short"), "short");

        let app =
            Appender::with_transport(&test_config(), MemoryTransport::new(MemorySender::default(), 0))
                .unwrap();
        let msg = app.message_for(&Record::new(Level::LOG_INFO, long.clone())).unwrap();
        assert_eq!(msg.short_message().chars().count(), 249);
        assert_eq!(msg.full_message(), Some(long.as_str()));

        // An empty message still yields a valid document
        let msg = app.message_for(&Record::new(Level::LOG_INFO, "")).unwrap();
        assert_eq!(msg.short_message(), "empty");
        assert!(msg.full_message().is_none());
    }

    #[test]
    fn test_append() {
        let sender = MemorySender::default();
        let mut cfg = test_config();
        cfg.chunk_size = 64;
        let app = Appender::with_transport(&cfg, MemoryTransport::new(sender.clone(), cfg.chunk_size))
            .unwrap();

        // Pseudo-random text compresses poorly, so the payload needs several chunks
        let mut state = 0x2545_f491_4f6c_dd1d_u64;
        let text: String = (0..2000)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                char::from(b'a' + ((state >> 33) % 26) as u8)
            })
            .collect();
        let n = app
            .append(&Record::new(Level::LOG_INFO, text.clone()).with_logger("smoke"))
            .unwrap();
        let datagrams = sender.take();
        assert_eq!(n, datagrams.len());
        assert!(n > 1);

        let mut parts: Vec<(u8, Vec<u8>)> = datagrams
            .iter()
            .map(|d| {
                (
                    ChunkHeader::parse(d).unwrap().sequence,
                    d[CHUNK_HEADER_LEN..].to_vec(),
                )
            })
            .collect();
        parts.sort_by_key(|(seq, _)| *seq);
        let payload: Vec<u8> = parts.into_iter().flat_map(|(_, p)| p).collect();

        let mut json = String::new();
        GzDecoder::new(&payload[..]).read_to_string(&mut json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(json["full_message"], serde_json::Value::from(text));
        assert_eq!(json["host"], "bree.local");
        assert_eq!(json["level"], 6);
        assert_eq!(json["_logger_name"], "smoke");
        assert!(json["timestamp"].is_f64());
    }

    #[test]
    fn test_close() {
        let sender = MemorySender::default();
        let mut app =
            Appender::with_transport(&test_config(), MemoryTransport::new(sender.clone(), 0))
                .unwrap();
        assert_eq!(app.append(&Record::new(Level::LOG_INFO, "before")).unwrap(), 1);
        app.close();
        assert!(app.is_closed());
        assert!(app.transport().is_none());
        assert_eq!(app.append(&Record::new(Level::LOG_INFO, "after")).unwrap(), 0);
        app.close();
        assert_eq!(sender.take().len(), 1);
    }

    #[test]
    fn test_set_transport() {
        let first = MemorySender::default();
        let second = MemorySender::default();
        let mut app =
            Appender::with_transport(&test_config(), MemoryTransport::new(first.clone(), 0))
                .unwrap();
        let old = app.set_transport(MemoryTransport::new(second.clone(), 0));
        assert!(old.is_some());
        app.append(&Record::new(Level::LOG_INFO, "to the second")).unwrap();
        assert!(first.datagrams().is_empty());
        assert_eq!(second.datagrams().len(), 1);

        // a closed appender comes back to life with a new transport
        app.close();
        assert!(app.set_transport(MemoryTransport::new(first.clone(), 0)).is_none());
        assert_eq!(app.append(&Record::new(Level::LOG_INFO, "back")).unwrap(), 1);
        assert_eq!(first.datagrams().len(), 1);
    }

    #[test]
    fn test_additional_field_mutation() {
        let mut app =
            Appender::with_transport(&test_config(), MemoryTransport::new(MemorySender::default(), 0))
                .unwrap();
        assert!(app.additional_fields().is_empty());
        app.additional_field("env", "staging").unwrap();
        app.additional_field("env", "prod").unwrap();
        assert_eq!(app.additional_fields().len(), 1);
        assert_eq!(app.additional_fields()["env"], "prod");

        assert!(matches!(
            app.additional_field("id", "x"),
            Err(Error::Construction { .. })
        ));
        assert!(app.additional_field("", "x").is_err());
        assert!(app.additional_field("level", "loud").is_err());
        assert_eq!(app.additional_fields().len(), 1);

        let msg = app.message_for(&Record::new(Level::LOG_INFO, "hi")).unwrap();
        assert_eq!(msg.get("_env").unwrap(), &Value::from("prod"));

        app.clear_additional_fields();
        assert!(app.additional_fields().is_empty());
        let msg = app.message_for(&Record::new(Level::LOG_INFO, "hi")).unwrap();
        assert!(!msg.contains("env"));
    }

    #[test]
    fn test_set_include_location() {
        let mut app =
            Appender::with_transport(&test_config(), MemoryTransport::new(MemorySender::default(), 0))
                .unwrap();
        let record = Record::new(Level::LOG_INFO, "here").with_location("src/lib.rs", 3);
        assert!(!app.include_location());
        assert!(app.message_for(&record).unwrap().file().is_none());
        app.set_include_location(true);
        assert!(app.include_location());
        let msg = app.message_for(&record).unwrap();
        assert_eq!(msg.file(), Some("src/lib.rs"));
        assert_eq!(msg.line(), Some(3));
    }

    #[test]
    fn test_uncompressed() {
        let sender = MemorySender::default();
        let mut cfg = test_config();
        cfg.compression = Compression::None;
        let app =
            Appender::with_transport(&cfg, MemoryTransport::new(sender.clone(), 0)).unwrap();
        assert_eq!(app.append(&Record::new(Level::LOG_DEBUG, "plain")).unwrap(), 1);
        let datagrams = sender.take();
        let json: serde_json::Value = serde_json::from_slice(&datagrams[0]).unwrap();
        assert_eq!(json["short_message"], "plain");
        assert_eq!(json["level"], 7);
    }
}
