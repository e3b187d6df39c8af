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

//! Build [GELF] messages and send them to [Graylog] over UDP.
//!
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//! [Graylog]: https://graylog.org
//!
//! # Introduction
//!
//! The Graylog Extended Log Format is a JSON document with a handful of required & standard
//! fields plus any number of "additional" fields whose names begin with an underscore. Graylog
//! will accept such documents over UDP, compressed or not, and will reassemble documents too large
//! for a single datagram provided they're split into GELF "chunks".
//!
//! This crate provides the pieces needed to do that:
//!
//! - [`GelfMessage`](message::GelfMessage): a field map that is a valid GELF document from
//!   construction on
//! - [`GelfEncoder`](encoder::GelfEncoder): JSON serialization & compression
//! - [`ChunkedTransport`](transport::ChunkedTransport): chunking & fire-and-forget dispatch
//! - [`Appender`](appender::Appender): ties the above together for log records, configured by
//!   [`GelfConfig`](config::GelfConfig)
//!
//! # Usage
//!
//! ```rust
//! use gelf_udp::{encoder::serialize, level::Level, message::GelfMessage};
//!
//! let msg = GelfMessage::builder()
//!     .host("bree.local")
//!     .short_message("Hello, 世界!")
//!     .level(Level::LOG_INFO)
//!     .additional("request_id", 42)
//!     .build()
//!     .unwrap();
//! let datagram = serialize(&msg).unwrap(); // gzipped JSON
//! # assert_eq!(&datagram[..2], &[0x1f, 0x8b]);
//! ```
//!
//! To ship log records to Graylog listening on some other host:
//!
//! ```no_run
//! use gelf_udp::{
//!     appender::{Appender, Record},
//!     config::GelfConfig,
//!     level::Level,
//! };
//!
//! let cfg = GelfConfig::from_properties(vec![
//!     ("udp.host", "graylog.example.com"),
//!     ("facility", "billing"),
//!     ("additionalFields", "env:prod"),
//! ])
//! .unwrap();
//! let appender = Appender::from_config(&cfg).unwrap();
//! appender
//!     .append(&Record::new(Level::LOG_WARNING, "disk 90% full").with_logger("monitor"))
//!     .unwrap();
//! ```
//!
//! See [`_docs`] for more on how the pieces fit together.

pub mod _docs;
pub mod appender;
pub mod chunk;
pub mod config;
pub mod encoder;
pub mod error;
pub mod level;
pub mod message;
pub mod transport;
