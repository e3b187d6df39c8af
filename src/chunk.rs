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

//! GELF chunking.
//!
//! A payload too large for a single datagram is split into chunks, each prefixed with a twelve
//! byte header:
//!
//! ```text
//! offset 0-1   : 0x1E 0x0F       (chunk marker)
//! offset 2-9   : message id      (8 bytes)
//! offset 10    : sequence index  (0-based)
//! offset 11    : total chunk count
//! offset 12..  : payload slice
//! ```
//!
//! The receiver reassembles the message once it has seen `count` chunks bearing the same id; it
//! relies on the sequence index, not on arrival order.

use crate::{
    config::DISABLE_CHUNKING,
    error::{Error, Result},
};

use backtrace::Backtrace;
use bytes::{Buf, BufMut};
use chrono::prelude::*;
use twox_hash::XxHash64;

use std::{
    hash::Hasher,
    sync::atomic::{AtomicU64, Ordering},
};

pub const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
pub const CHUNK_HEADER_LEN: usize = 12;
/// Both the count & the sequence index must fit in one byte.
pub const MAX_CHUNK_COUNT: usize = u8::MAX as usize;

/// Number of chunks of at most `chunk_size` bytes needed to carry `len` bytes.
///
/// A payload that is an exact multiple of the chunk size needs exactly that multiple; there is
/// no trailing empty chunk. A `chunk_size` of [`DISABLE_CHUNKING`] means the payload travels
/// whole, in one datagram.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    if chunk_size == DISABLE_CHUNKING {
        1
    } else {
        len.div_ceil(chunk_size)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           message ids                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The eight byte identifier shared by every chunk of one message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub [u8; 8]);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", u64::from_be_bytes(self.0))
    }
}

/// Produces [`MessageId`]s.
///
/// Each id is an XxHash64 digest of this generator's identity (host name, process id & the
/// creating thread, fixed at construction), the current time in nanoseconds, and a per-generator
/// sequence number. The sequence number keeps two ids drawn from the same generator in the same
/// nanosecond from hashing the same input; ids from different generators are distinct only with
/// high probability. This is not a cryptographic guarantee.
#[derive(Debug)]
pub struct MessageIdGenerator {
    identity: u64,
    counter: AtomicU64,
}

impl MessageIdGenerator {
    pub fn new(hostname: &str) -> MessageIdGenerator {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(hostname.as_bytes());
        hasher.write_u32(std::process::id());
        hasher.write(format!("{:?}", std::thread::current().id()).as_bytes());
        MessageIdGenerator {
            identity: hasher.finish(),
            counter: AtomicU64::new(0),
        }
    }

    /// Safe to call from any number of threads at once.
    pub fn next_id(&self) -> MessageId {
        let now = Utc::now();
        let mut hasher = XxHash64::with_seed(self.identity);
        hasher.write_i64(now.timestamp());
        hasher.write_u32(now.timestamp_subsec_nanos());
        hasher.write_u64(self.counter.fetch_add(1, Ordering::Relaxed));
        MessageId(hasher.finish().to_be_bytes())
    }
}

impl std::default::Default for MessageIdGenerator {
    fn default() -> Self {
        MessageIdGenerator::new(&crate::config::discover_hostname())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          chunk headers                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: MessageId,
    pub sequence: u8,
    pub count: u8,
}

impl ChunkHeader {
    pub fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&CHUNK_MAGIC);
        buf.put_slice(&self.id.0);
        buf.put_u8(self.sequence);
        buf.put_u8(self.count);
    }

    /// Decode the header at the front of `datagram`; `None` if it isn't a GELF chunk.
    pub fn parse(datagram: &[u8]) -> Option<ChunkHeader> {
        if datagram.len() < CHUNK_HEADER_LEN || datagram[..2] != CHUNK_MAGIC {
            return None;
        }
        let mut buf = &datagram[2..CHUNK_HEADER_LEN];
        let mut id = [0_u8; 8];
        buf.copy_to_slice(&mut id);
        Some(ChunkHeader {
            id: MessageId(id),
            sequence: buf.get_u8(),
            count: buf.get_u8(),
        })
    }
}

/// Split `payload` into framed chunks of at most `chunk_size` payload bytes apiece, in
/// ascending sequence order.
///
/// With chunking disabled the result is the payload itself, unframed. Fails if the payload would
/// need more than [`MAX_CHUNK_COUNT`] chunks.
pub fn frame(payload: &[u8], chunk_size: usize, id: MessageId) -> Result<Vec<Vec<u8>>> {
    if chunk_size == DISABLE_CHUNKING {
        return Ok(vec![payload.to_vec()]);
    }
    let count = chunk_count(payload.len(), chunk_size);
    if count > MAX_CHUNK_COUNT {
        return Err(Error::TooManyChunks {
            len: payload.len(),
            chunk_size,
            count,
            back: Backtrace::new(),
        });
    }
    Ok(payload
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, slice)| {
            let mut chunk = Vec::with_capacity(CHUNK_HEADER_LEN + slice.len());
            ChunkHeader {
                id,
                sequence: i as u8,
                count: count as u8,
            }
            .put(&mut chunk);
            chunk.put_slice(slice);
            chunk
        })
        .collect())
}
