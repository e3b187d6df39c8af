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

//! The GELF transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, and the
//! [`NetworkSender`] trait beneath it: the primitive "send these bytes, don't wait for an
//! answer". [`ChunkedTransport`] sits between the two, deciding whether a payload goes out as a
//! single datagram or as a series of GELF chunks.
//!
//! # Examples
//!
//! To send GELF messages over UDP to a Graylog input listening on port 12201 (the default) on
//! localhost:
//!
//! ```rust
//! use gelf_udp::transport::UdpTransport;
//! let transpo = UdpTransport::local().unwrap();
//! ```
//!
//! On a non-standard port on another host, with chunking disabled:
//!
//! ```no_run
//! use gelf_udp::transport::UdpTransport;
//! let transpo = UdpTransport::new("graylog.example.com", 5514, 0).unwrap();
//! ```
//!
//! For testing, datagrams can simply be recorded:
//!
//! ```rust
//! use gelf_udp::transport::{MemorySender, MemoryTransport, Transport};
//! let sender = MemorySender::default();
//! let transpo = MemoryTransport::new(sender.clone(), 4);
//! assert_eq!(transpo.send(b"0123456789").unwrap(), 3);
//! assert_eq!(sender.datagrams().len(), 3);
//! ```

use crate::{
    chunk::{frame, MessageIdGenerator},
    config::{discover_hostname, GelfConfig, DEFAULT_CHUNK_SIZE, DEFAULT_GRAYLOG_PORT},
    error::{Error, Result},
};

use tracing::{debug, trace, warn};

use std::{
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc::{self, TrySendError},
        Arc, Mutex,
    },
    thread::JoinHandle,
};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Hand a serialized message to this transport mechanism, returning the number of datagrams
    /// submitted.
    ///
    /// Submission is all the caller learns about: implementations don't wait for, nor report on,
    /// delivery.
    fn send(&self, payload: &[u8]) -> Result<usize>;
}

/// The network primitive beneath a [`ChunkedTransport`]: submit one datagram & return
/// immediately. There is no completion signal.
pub trait NetworkSender {
    fn dispatch(&self, datagram: Vec<u8>);
}

impl<N: NetworkSender + ?Sized> NetworkSender for Arc<N> {
    fn dispatch(&self, datagram: Vec<u8>) {
        (**self).dispatch(datagram)
    }
}

/// A [`Transport`] that splits large payloads into GELF chunks.
///
/// Payloads of at most `chunk_size` bytes (or any payload at all, if `chunk_size` is zero) are
/// dispatched unmodified. Larger payloads are split into `ceil(len / chunk_size)` chunks sharing
/// one freshly generated message id, submitted in ascending sequence order. Nothing is promised
/// about the order in which they arrive.
pub struct ChunkedTransport<N: NetworkSender> {
    sender: N,
    chunk_size: usize,
    ids: MessageIdGenerator,
}

impl<N: NetworkSender> ChunkedTransport<N> {
    pub fn new(sender: N, chunk_size: usize) -> ChunkedTransport<N> {
        ChunkedTransport {
            sender,
            chunk_size,
            ids: MessageIdGenerator::default(),
        }
    }
    /// Construct with a specific message id generator
    pub fn with_ids(sender: N, chunk_size: usize, ids: MessageIdGenerator) -> ChunkedTransport<N> {
        ChunkedTransport {
            sender,
            chunk_size,
            ids,
        }
    }
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
    pub fn sender(&self) -> &N {
        &self.sender
    }
    pub fn into_sender(self) -> N {
        self.sender
    }
}

impl<N: NetworkSender> Transport for ChunkedTransport<N> {
    fn send(&self, payload: &[u8]) -> Result<usize> {
        if self.chunk_size == 0 || payload.len() <= self.chunk_size {
            self.sender.dispatch(payload.to_vec());
            return Ok(1);
        }

        let id = self.ids.next_id();
        let chunks = frame(payload, self.chunk_size, id)?;
        trace!(
            message_id = %id,
            chunk_count = chunks.len(),
            chunk_size = self.chunk_size,
            "Splitting a {}-byte GELF payload into chunks.",
            payload.len()
        );

        let count = chunks.len();
        for chunk in chunks {
            self.sender.dispatch(chunk);
        }
        Ok(count)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            UDP                                                 //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Datagrams a [`UdpSender`] will hold for its dispatch thread before dropping new ones.
pub const DEFAULT_QUEUE_DEPTH: usize = 4096;

/// Sending datagrams via UDP.
///
/// The socket is owned by a dedicated dispatch thread; [`dispatch`](NetworkSender::dispatch)
/// just queues the datagram for that thread, so it never blocks on the network & may be called
/// from any number of threads at once. The queue is bounded: when it's full, the new datagram is
/// dropped (and counted; see [`dropped`](UdpSender::dropped)). Failures to send are logged &
/// otherwise ignored.
///
/// Dropping the sender (or calling [`shutdown`](UdpSender::shutdown)) closes the queue, lets the
/// thread drain it & then releases the socket.
pub struct UdpSender {
    queue: Option<mpsc::SyncSender<Vec<u8>>>,
    worker: Option<JoinHandle<()>>,
    peer: SocketAddr,
    dropped: AtomicU64,
}

impl UdpSender {
    /// Resolve `host`:`port` (preferring IPv4), then open a socket connected to it.
    ///
    /// Resolution happens once, here; this is the only operation in the send path that may
    /// block.
    pub fn new(host: &str, port: u16) -> Result<UdpSender> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(Error::transport)?
            .collect();
        let peer = addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| {
                Error::transport(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{}:{} resolved to no addresses", host, port),
                ))
            })?;
        UdpSender::connect(peer)
    }

    pub fn connect(peer: SocketAddr) -> Result<UdpSender> {
        UdpSender::with_queue_depth(peer, DEFAULT_QUEUE_DEPTH)
    }

    /// Open a socket connected to `peer`, queueing at most `depth` datagrams for it.
    pub fn with_queue_depth(peer: SocketAddr, depth: usize) -> Result<UdpSender> {
        // Bind to any available port...
        let local = if peer.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).map_err(Error::transport)?;
        // and connect to the Graylog input at `peer`:
        socket.connect(peer).map_err(Error::transport)?;

        let (queue, rx) = mpsc::sync_channel::<Vec<u8>>(depth);
        let worker = std::thread::Builder::new()
            .name("gelf-udp-dispatch".to_owned())
            .spawn(move || {
                for datagram in rx {
                    if let Err(err) = socket.send(&datagram) {
                        warn!(%peer, "Failed to send a {}-byte GELF datagram: {}", datagram.len(), err);
                    }
                }
            })
            .map_err(Error::transport)?;

        debug!(%peer, depth, "Opened GELF UDP sender.");
        Ok(UdpSender {
            queue: Some(queue),
            worker: Some(worker),
            peer,
            dropped: AtomicU64::new(0),
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Datagrams discarded so far because the queue was full or the sender shut down
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting datagrams, wait for those already queued to be handed to the OS, and
    /// close the socket. Idempotent.
    pub fn shutdown(&mut self) {
        // Dropping the only `Sender` ends the worker's loop once the queue is drained.
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(peer = %self.peer, "The GELF dispatch thread panicked.");
            }
            debug!(peer = %self.peer, "Closed GELF UDP sender.");
        }
    }
}

impl NetworkSender for UdpSender {
    fn dispatch(&self, datagram: Vec<u8>) {
        let reason = match &self.queue {
            Some(queue) => match queue.try_send(datagram) {
                Ok(()) => return,
                Err(TrySendError::Full(_)) => "GELF dispatch queue is full",
                Err(TrySendError::Disconnected(_)) => "GELF dispatch thread has exited",
            },
            None => "GELF sender is shut down",
        };
        self.dropped.fetch_add(1, Ordering::Relaxed);
        debug!(peer = %self.peer, "{}; dropping datagram.", reason);
    }
}

impl Drop for UdpSender {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sending GELF messages via (chunked) UDP datagrams.
pub struct UdpTransport {
    inner: ChunkedTransport<UdpSender>,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `host`:`port`, splitting payloads into
    /// chunks of at most `chunk_size` bytes (zero disables chunking).
    pub fn new(host: &str, port: u16, chunk_size: usize) -> Result<UdpTransport> {
        let sender = UdpSender::new(host, port)?;
        Ok(UdpTransport {
            inner: ChunkedTransport::with_ids(
                sender,
                chunk_size,
                MessageIdGenerator::new(&discover_hostname()),
            ),
        })
    }
    /// Construct a [`Transport`] implementation via UDP at localhost:12201
    pub fn local() -> Result<UdpTransport> {
        UdpTransport::new("localhost", DEFAULT_GRAYLOG_PORT, DEFAULT_CHUNK_SIZE)
    }
    pub fn from_config(cfg: &GelfConfig) -> Result<UdpTransport> {
        let (host, port) = cfg.endpoint();
        UdpTransport::new(host, port, cfg.chunk_size)
    }
    pub fn peer(&self) -> SocketAddr {
        self.inner.sender().peer()
    }
    pub fn chunk_size(&self) -> usize {
        self.inner.chunk_size()
    }
    /// Release the socket now rather than on drop; see [`UdpSender::shutdown`].
    pub fn close(self) {
        self.inner.into_sender().shutdown()
    }
}

impl Transport for UdpTransport {
    fn send(&self, payload: &[u8]) -> Result<usize> {
        self.inner.send(payload)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           in-memory                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Records every datagram it's handed. Clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct MemorySender {
    datagrams: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemorySender {
    /// Everything dispatched so far, in submission order
    pub fn datagrams(&self) -> Vec<Vec<u8>> {
        match self.datagrams.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
    /// Remove & return everything dispatched so far
    pub fn take(&self) -> Vec<Vec<u8>> {
        match self.datagrams.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl NetworkSender for MemorySender {
    fn dispatch(&self, datagram: Vec<u8>) {
        match self.datagrams.lock() {
            Ok(mut guard) => guard.push(datagram),
            Err(poisoned) => poisoned.into_inner().push(datagram),
        }
    }
}

/// Chunked transport into memory; handy for tests
pub type MemoryTransport = ChunkedTransport<MemorySender>;
