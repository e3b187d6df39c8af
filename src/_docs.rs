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

//! # General gelf-udp Documentation
//!
//! ## Introduction
//!
//! General (i.e. not documenting a particular struct or a method) documentation goes here.
//!
//! ## From Log Records to Datagrams
//!
//! The translation from a log record to one or more UDP datagrams happens in three steps:
//!
//! 1. building a [GelfMessage] from the record
//! 2. serializing that message to (usually compressed) JSON
//! 3. splitting the result into chunks, if need be, and handing them to the network
//!
//! [GelfMessage]: crate::message::GelfMessage
//!
//! ### Building a GELF Message
//!
//! A [GelfMessage] is a sorted map from field names to [Value]s (strings, integers or reals).
//! Every mutation is checked: `level` must lie in zero through seven, `line` can't be negative,
//! additional field names get a leading underscore & `_id` is refused (Graylog reserves it). The
//! required fields (`version`, `host` & `short_message`) can't be removed, and setting one to the
//! empty string falls back to a default. The optional standard fields each have a sentinel that
//! removes them instead: -1 for `timestamp` & `line`, the empty string for `full_message` &
//! `file`.
//!
//! [Value]: crate::message::Value
//!
//! Construction through [from_fields] or the [builder] is all-or-nothing: every violation is
//! collected into a single [Construction] error & no message is produced.
//!
//! [from_fields]: crate::message::GelfMessage::from_fields
//! [builder]: crate::message::GelfMessage::builder
//! [Construction]: crate::error::Error::Construction
//!
//! ### Serialization
//!
//! [GelfEncoder] renders the field map as compact JSON (keys in sorted order) and then compresses
//! it with gzip, zlib, or not at all. Graylog recognizes all three by their leading bytes.
//!
//! [GelfEncoder]: crate::encoder::GelfEncoder
//!
//! ### Chunking & Transport
//!
//! The [Transport] trait is the seam between serialization & the network. [ChunkedTransport] sends
//! a payload of at most `chunk_size` bytes as one datagram; a larger one is split into
//! `ceil(len / chunk_size)` chunks, each with a twelve byte header carrying the magic bytes
//! `0x1e 0x0f`, an eight byte message id, the chunk's index & the chunk count. Since the count
//! travels in a single byte, payloads needing more than 255 chunks are refused with
//! [TooManyChunks]. A `chunk_size` of zero disables chunking altogether.
//!
//! [Transport]: crate::transport::Transport
//! [ChunkedTransport]: crate::transport::ChunkedTransport
//! [TooManyChunks]: crate::error::Error::TooManyChunks
//!
//! Message ids come from a [MessageIdGenerator]: an XxHash64 digest over the sending host &
//! process, the time, and a counter. They are unique with high probability, which is all the
//! receiver needs to tell concurrently arriving messages apart.
//!
//! [MessageIdGenerator]: crate::chunk::MessageIdGenerator
//!
//! Datagrams are handed to a [NetworkSender]. The UDP implementation, [UdpSender], queues them for
//! a dedicated thread that owns the socket; submission never waits on the network and no delivery
//! status is reported. Send failures are logged (via [tracing]) and dropped.
//!
//! [NetworkSender]: crate::transport::NetworkSender
//! [UdpSender]: crate::transport::UdpSender
//! [tracing]: https://docs.rs/tracing
//!
//! ## The Appender
//!
//! [Appender] is the piece applications hold on to. It's parameterized by its [Transport]:
//!
//! [Appender]: crate::appender::Appender
//!
//! ```ignore
//! pub struct Appender<T: Transport>
//! ```
//!
//! so that tests can substitute a [MemoryTransport] for the real [UdpTransport]. Given a [Record],
//! it fills in the standard fields: the first 249 characters of the message become the
//! `short_message` and the whole message the `full_message`. The facility is the configured one,
//! or else the record's logger name. File & line are included only when asked for. Every message
//! also carries the configured static fields, along with `_logger_name` and (when known)
//! `_thread` & `_ndc`.
//!
//! [MemoryTransport]: crate::transport::MemoryTransport
//! [UdpTransport]: crate::transport::UdpTransport
//! [Record]: crate::appender::Record
//!
//! An [Appender] can be closed, which releases its transport; until it's handed a new one it
//! discards records. Its static fields & whether it includes location information may be changed
//! at any time.
//!
//! Hooking [Appender] up to a particular logging framework is a matter of turning that framework's
//! events into [Record]s.
