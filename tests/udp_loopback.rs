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

//! Send GELF over a real UDP socket on the loopback interface & read it back.

use gelf_udp::{
    appender::{Appender, Record},
    chunk::{ChunkHeader, CHUNK_HEADER_LEN},
    config::GelfConfig,
    level::Level,
    transport::{Transport, UdpTransport},
};

use flate2::read::GzDecoder;

use std::{io::Read, net::UdpSocket, time::Duration};

fn receiver() -> (UdpSocket, u16) {
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let port = sock.local_addr().unwrap().port();
    (sock, port)
}

fn recv_n(sock: &UdpSocket, n: usize) -> Vec<Vec<u8>> {
    let mut buf = vec![0_u8; 65536];
    (0..n)
        .map(|_| {
            let len = sock.recv(&mut buf).unwrap();
            buf[..len].to_vec()
        })
        .collect()
}

fn reassemble(datagrams: &[Vec<u8>]) -> Vec<u8> {
    let mut parts: Vec<(ChunkHeader, &[u8])> = datagrams
        .iter()
        .map(|d| (ChunkHeader::parse(d).unwrap(), &d[CHUNK_HEADER_LEN..]))
        .collect();
    assert!(parts.iter().all(|(h, _)| h.id == parts[0].0.id));
    parts.sort_by_key(|(h, _)| h.sequence);
    parts.iter().flat_map(|(_, p)| p.iter().copied()).collect()
}

#[test]
fn unchunked() {
    let (sock, port) = receiver();
    let transpo = UdpTransport::new("127.0.0.1", port, 1024).unwrap();
    assert_eq!(transpo.send(b"hello, graylog").unwrap(), 1);
    let got = recv_n(&sock, 1);
    assert_eq!(got[0], b"hello, graylog");
    transpo.close();
}

#[test]
fn chunked() {
    let (sock, port) = receiver();
    let transpo = UdpTransport::new("127.0.0.1", port, 64).unwrap();
    assert_eq!(transpo.chunk_size(), 64);
    let payload: Vec<u8> = (0..1000_u32).map(|i| (i % 253) as u8).collect();
    let n = transpo.send(&payload).unwrap();
    assert_eq!(n, 16);
    let got = recv_n(&sock, n);
    for d in &got {
        let h = ChunkHeader::parse(d).unwrap();
        assert_eq!(h.count, 16);
        assert!(d.len() <= CHUNK_HEADER_LEN + 64);
    }
    assert_eq!(reassemble(&got), payload);
    transpo.close();
}

#[test]
fn appender_over_udp() {
    let (sock, port) = receiver();
    let cfg = GelfConfig {
        host: "127.0.0.1".to_owned(),
        port,
        logging_host: Some("loopback-test".to_owned()),
        ..GelfConfig::default()
    };
    let appender = Appender::from_config(&cfg).unwrap();
    let n = appender
        .append(&Record::new(Level::LOG_NOTICE, "Hello, 世界!").with_logger("udp_loopback"))
        .unwrap();
    assert_eq!(n, 1);

    let got = recv_n(&sock, 1);
    let mut text = String::new();
    GzDecoder::new(&got[0][..])
        .read_to_string(&mut text)
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["host"], "loopback-test");
    assert_eq!(json["short_message"], "Hello, 世界!");
    assert_eq!(json["level"], 5);
    assert_eq!(json["facility"], "udp_loopback");
    assert_eq!(json["_logger_name"], "udp_loopback");
}
