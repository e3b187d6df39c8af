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

//! Test writing to a Graylog GELF UDP input on port 12201 on the local host.
//!
//! Any `key=value` arguments are read as configuration properties, e.g.
//!
//! ```text
//! udp-test udp.host=graylog.local udp.maxChunkSize=512 additionalFields=env:test
//! ```

use gelf_udp::{
    appender::{Appender, Record},
    config::GelfConfig,
    level::Level,
};

pub fn main() {
    // Show the crate's own diagnostics (chunking, socket lifecycle)...
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    // read any properties given on the command line...
    let props: Vec<(String, String)> = std::env::args()
        .skip(1)
        .filter_map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
        })
        .collect();
    let cfg = GelfConfig::from_properties(props).unwrap();
    // and send.
    let appender = Appender::from_config(&cfg).unwrap();

    for level in [
        Level::LOG_DEBUG,
        Level::LOG_INFO,
        Level::LOG_NOTICE,
        Level::LOG_WARNING,
        Level::LOG_ERR,
        Level::LOG_CRIT,
        Level::LOG_ALERT,
        Level::LOG_EMERG,
    ] {
        let record = Record::new(level, format!("Hello, 世界! ({})", level))
            .with_logger("udp-test")
            .with_location(file!(), line!());
        appender.append(&record).unwrap();
    }

    // One message large enough to need chunking at the default chunk size
    let mut state = 0x9e37_79b9_7f4a_7c15_u64;
    let big: String = (0..16 * 1024)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            char::from(b'!' + (state % 94) as u8)
        })
        .collect();
    let n = appender
        .append(&Record::new(Level::LOG_INFO, big).with_logger("udp-test"))
        .unwrap();
    tracing::info!("Sent a large message in {} datagrams.", n);
}
