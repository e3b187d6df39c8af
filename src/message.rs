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

//! The GELF message model.
//!
//! A [`GelfMessage`] is a mapping from field names to [`Value`]s. [GELF] distinguishes three kinds
//! of field:
//!
//! - the required fields `version`, `host` & `short_message`; these are always present, and
//!   setting them to the empty string substitutes a default rather than failing
//! - the standard fields `timestamp`, `full_message`, `level`, `facility`, `file` & `line`; each
//!   has a "sentinel" value meaning "leave this field out of the message"
//! - "additional" fields, whose names are stored with a leading underscore
//!
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//!
//! # Examples
//!
//! ```rust
//! use gelf_udp::message::GelfMessage;
//! let mut msg = GelfMessage::builder()
//!     .short_message("test")
//!     .host("h1")
//!     .level(3)
//!     .facility("app")
//!     .build()
//!     .unwrap();
//! msg.set_additional("request_id", "abc123").unwrap();
//! assert!(msg.get("_request_id").is_ok());
//! assert!(msg.set_level(8).is_err());
//! ```

use crate::{
    error::{Error, FieldViolation, Result, Violation},
    level::Level,
};

use backtrace::Backtrace;
use serde::Serialize;

use std::collections::BTreeMap;

type StdResult<T, E> = std::result::Result<T, E>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                     field names & defaults                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

pub const VERSION: &str = "version";
pub const HOST: &str = "host";
pub const SHORT_MESSAGE: &str = "short_message";
pub const TIMESTAMP: &str = "timestamp";
pub const FULL_MESSAGE: &str = "full_message";
pub const LEVEL: &str = "level";
pub const FACILITY: &str = "facility";
pub const FILE: &str = "file";
pub const LINE: &str = "line";

/// Graylog uses `_id` internally; it may never appear in a message.
pub const RESERVED_KEY: &str = "_id";

pub const GELF_VERSION: &str = "1.0";
pub const UNKNOWN_HOST: &str = "unknown_host";
pub const DEFAULT_SHORT_MESSAGE: &str = "empty";
pub const DEFAULT_FACILITY: &str = "GELF";
/// Setting `line` to this value removes it.
pub const NO_LINE: i64 = -1;
/// Setting `timestamp` to this value removes it (and the server will stamp the message on
/// receipt).
pub const USE_SERVER_TIMESTAMP: f64 = -1.0;

const REQUIRED_FIELDS: [&str; 3] = [VERSION, HOST, SHORT_MESSAGE];
const STANDARD_FIELDS: [&str; 9] = [
    VERSION,
    HOST,
    SHORT_MESSAGE,
    TIMESTAMP,
    FULL_MESSAGE,
    LEVEL,
    FACILITY,
    FILE,
    LINE,
];

pub fn is_required_field(key: &str) -> bool {
    REQUIRED_FIELDS.contains(&key)
}

pub fn is_standard_field(key: &str) -> bool {
    STANDARD_FIELDS.contains(&key)
}

/// Map a logical field name to the key under which it is stored: standard names & names that
/// already begin with an underscore are unchanged, anything else gains a leading `_`.
pub fn make_key(key: &str) -> String {
    if is_standard_field(key) || key.starts_with('_') {
        key.to_owned()
    } else {
        format!("_{}", key)
    }
}

/// [`make_key`], refusing names that may not be stored at all.
pub fn normalize_key(key: &str) -> StdResult<String, FieldViolation> {
    if key.is_empty() {
        return Err(FieldViolation::new(key, Violation::EmptyKey));
    }
    let key = make_key(key);
    if key == RESERVED_KEY {
        Err(FieldViolation::new(key, Violation::ReservedKey))
    } else {
        Ok(key)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           enum Value                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A GELF field value: GELF allows only strings & numbers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Real(f64),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
    /// Integers widen to reals; strings have no numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(x) => Some(*x),
            Value::String(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::String(x.to_owned())
    }
}

impl From<String> for Value {
    fn from(x: String) -> Self {
        Value::String(x)
    }
}

impl From<&String> for Value {
    fn from(x: &String) -> Self {
        Value::String(x.clone())
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Integer(x)
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Integer(x as i64)
    }
}

impl From<u32> for Value {
    fn from(x: u32) -> Self {
        Value::Integer(x as i64)
    }
}

impl From<u8> for Value {
    fn from(x: u8) -> Self {
        Value::Integer(x as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<Level> for Value {
    fn from(x: Level) -> Self {
        Value::Integer(x as i64)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        field validation                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// What an acceptable assignment does to the message.
#[derive(Debug, PartialEq)]
enum Assignment {
    Store(Value),
    Omit,
}

fn expect_string(key: &str, value: Value) -> StdResult<String, FieldViolation> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(FieldViolation::new(
            key,
            Violation::WrongType { expected: "string" },
        )),
    }
}

fn expect_integer(key: &str, value: Value) -> StdResult<i64, FieldViolation> {
    match value {
        Value::Integer(i) => Ok(i),
        _ => Err(FieldViolation::new(
            key,
            Violation::WrongType {
                expected: "integer",
            },
        )),
    }
}

/// Decide what setting the (already normalized) `key` to `value` means, without touching any
/// message.
fn check(key: &str, value: Value) -> StdResult<Assignment, FieldViolation> {
    let or_default = |s: String, default: &str| {
        Value::String(if s.is_empty() { default.to_owned() } else { s })
    };
    match key {
        VERSION => Ok(Assignment::Store(or_default(
            expect_string(key, value)?,
            GELF_VERSION,
        ))),
        HOST => Ok(Assignment::Store(or_default(
            expect_string(key, value)?,
            UNKNOWN_HOST,
        ))),
        SHORT_MESSAGE => Ok(Assignment::Store(or_default(
            expect_string(key, value)?,
            DEFAULT_SHORT_MESSAGE,
        ))),
        FACILITY => Ok(Assignment::Store(or_default(
            expect_string(key, value)?,
            DEFAULT_FACILITY,
        ))),
        FULL_MESSAGE | FILE => {
            let s = expect_string(key, value)?;
            Ok(if s.is_empty() {
                Assignment::Omit
            } else {
                Assignment::Store(Value::String(s))
            })
        }
        TIMESTAMP => {
            let t = value.as_f64().ok_or_else(|| {
                FieldViolation::new(key, Violation::WrongType { expected: "number" })
            })?;
            if t == USE_SERVER_TIMESTAMP {
                Ok(Assignment::Omit)
            } else if !t.is_finite() {
                Err(FieldViolation::new(key, Violation::NotFinite))
            } else {
                // Always a real on the wire, even when the caller hands us whole seconds.
                Ok(Assignment::Store(Value::Real(t)))
            }
        }
        LEVEL => {
            let l = expect_integer(key, value)?;
            if (0..=7).contains(&l) {
                Ok(Assignment::Store(Value::Integer(l)))
            } else {
                Err(FieldViolation::new(key, Violation::LevelOutOfRange(l)))
            }
        }
        LINE => {
            let l = expect_integer(key, value)?;
            if l == NO_LINE {
                Ok(Assignment::Omit)
            } else if l < 0 {
                Err(FieldViolation::new(key, Violation::NegativeLine(l)))
            } else {
                Ok(Assignment::Store(Value::Integer(l)))
            }
        }
        _ => match value {
            Value::Real(x) if !x.is_finite() => Err(FieldViolation::new(key, Violation::NotFinite)),
            value => Ok(Assignment::Store(value)),
        },
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        struct GelfMessage                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A single GELF message.
///
/// Every mutation is validated on its own: a rejected assignment leaves the message exactly as
/// it was. The three required fields are present from construction on & can't be removed, so
/// any [`GelfMessage`] is a valid GELF document.
///
/// Fields are kept sorted by key, which makes the serialized form deterministic.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GelfMessage {
    fields: BTreeMap<String, Value>,
}

impl std::default::Default for GelfMessage {
    /// A message with the required fields at their defaults, `level` at ALERT & the default
    /// facility.
    fn default() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(VERSION.to_owned(), Value::from(GELF_VERSION));
        fields.insert(HOST.to_owned(), Value::from(UNKNOWN_HOST));
        fields.insert(SHORT_MESSAGE.to_owned(), Value::from(DEFAULT_SHORT_MESSAGE));
        fields.insert(LEVEL.to_owned(), Value::from(Level::default()));
        fields.insert(FACILITY.to_owned(), Value::from(DEFAULT_FACILITY));
        GelfMessage { fields }
    }
}

impl GelfMessage {
    pub fn builder() -> GelfMessageBuilder {
        GelfMessageBuilder { fields: Vec::new() }
    }

    /// Build a message from an arbitrary collection of fields, all-or-nothing.
    ///
    /// Every field is checked before any is applied; if any are rejected, the resulting
    /// [`Error::Construction`] lists them all.
    pub fn from_fields<I, K, V>(fields: I) -> Result<GelfMessage>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut checked = Vec::new();
        let mut violations = Vec::new();
        for (key, value) in fields {
            match normalize_key(key.as_ref()).and_then(|key| {
                let assignment = check(&key, value.into())?;
                Ok((key, assignment))
            }) {
                Ok(x) => checked.push(x),
                Err(violation) => violations.push(violation),
            }
        }
        if !violations.is_empty() {
            return Err(Error::Construction {
                violations,
                back: Backtrace::new(),
            });
        }
        let mut msg = GelfMessage::default();
        for (key, assignment) in checked {
            msg.apply(key, assignment);
        }
        Ok(msg)
    }

    fn apply(&mut self, key: String, assignment: Assignment) {
        match assignment {
            Assignment::Store(value) => {
                self.fields.insert(key, value);
            }
            Assignment::Omit => {
                self.fields.remove(&key);
            }
        }
    }

    /// Set `field` to `value`.
    ///
    /// `field` may name a standard field or an additional field (with or without its leading
    /// underscore). Setting a standard field to its sentinel removes it.
    pub fn set<V: Into<Value>>(&mut self, field: &str, value: V) -> Result<()> {
        let key = normalize_key(field).map_err(Error::bad_field)?;
        let assignment = check(&key, value.into()).map_err(Error::bad_field)?;
        self.apply(key, assignment);
        Ok(())
    }

    /// Set an additional field; `key` is stored with a leading underscore.
    pub fn set_additional<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<()> {
        self.set(key, value)
    }

    /// Set `field` only if it's not already present; returns whether the field was inserted.
    pub fn insert<V: Into<Value>>(&mut self, field: &str, value: V) -> Result<bool> {
        let key = normalize_key(field).map_err(Error::bad_field)?;
        if self.fields.contains_key(&key) {
            return Ok(false);
        }
        let assignment = check(&key, value.into()).map_err(Error::bad_field)?;
        let inserted = matches!(assignment, Assignment::Store(_));
        self.apply(key, assignment);
        Ok(inserted)
    }

    pub fn get(&self, field: &str) -> Result<&Value> {
        let key = make_key(field);
        match self.fields.get(&key) {
            Some(value) => Ok(value),
            None => Err(Error::NoSuchField {
                key,
                back: Backtrace::new(),
            }),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(&make_key(field))
    }

    /// Remove `field`, returning whether anything was actually removed. The required fields
    /// can't be removed.
    pub fn remove(&mut self, field: &str) -> Result<bool> {
        if is_required_field(field) {
            return Err(Error::RequiredField {
                key: field.to_owned(),
                back: Backtrace::new(),
            });
        }
        Ok(self.fields.remove(&make_key(field)).is_some())
    }

    /// Iterate over (stored key, value) pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn version(&self) -> &str {
        self.str_field(VERSION).unwrap_or(GELF_VERSION)
    }
    pub fn host(&self) -> &str {
        self.str_field(HOST).unwrap_or(UNKNOWN_HOST)
    }
    pub fn short_message(&self) -> &str {
        self.str_field(SHORT_MESSAGE).unwrap_or(DEFAULT_SHORT_MESSAGE)
    }
    pub fn full_message(&self) -> Option<&str> {
        self.str_field(FULL_MESSAGE)
    }
    /// Seconds since the epoch, with microseconds in the fractional part
    pub fn timestamp(&self) -> Option<f64> {
        self.fields.get(TIMESTAMP).and_then(Value::as_f64)
    }
    pub fn level(&self) -> Option<Level> {
        self.fields
            .get(LEVEL)
            .and_then(Value::as_i64)
            .and_then(|l| Level::try_from(l).ok())
    }
    pub fn facility(&self) -> Option<&str> {
        self.str_field(FACILITY)
    }
    pub fn file(&self) -> Option<&str> {
        self.str_field(FILE)
    }
    pub fn line(&self) -> Option<i64> {
        self.fields.get(LINE).and_then(Value::as_i64)
    }

    pub fn set_version(&mut self, version: &str) -> Result<()> {
        self.set(VERSION, version)
    }
    pub fn set_host(&mut self, host: &str) -> Result<()> {
        self.set(HOST, host)
    }
    pub fn set_short_message(&mut self, msg: &str) -> Result<()> {
        self.set(SHORT_MESSAGE, msg)
    }
    /// [`USE_SERVER_TIMESTAMP`] removes the timestamp
    pub fn set_timestamp(&mut self, timestamp: f64) -> Result<()> {
        self.set(TIMESTAMP, timestamp)
    }
    /// The empty string removes the full message
    pub fn set_full_message(&mut self, msg: &str) -> Result<()> {
        self.set(FULL_MESSAGE, msg)
    }
    pub fn set_level(&mut self, level: u8) -> Result<()> {
        self.set(LEVEL, level)
    }
    /// The empty string selects [`DEFAULT_FACILITY`]
    pub fn set_facility(&mut self, facility: &str) -> Result<()> {
        self.set(FACILITY, facility)
    }
    /// The empty string removes the file
    pub fn set_file(&mut self, file: &str) -> Result<()> {
        self.set(FILE, file)
    }
    /// [`NO_LINE`] removes the line
    pub fn set_line(&mut self, line: i64) -> Result<()> {
        self.set(LINE, line)
    }
}

/// Collects initial fields for a [`GelfMessage`]; nothing is validated until [`build`].
///
/// [`build`]: GelfMessageBuilder::build
pub struct GelfMessageBuilder {
    fields: Vec<(String, Value)>,
}

impl GelfMessageBuilder {
    pub fn field<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.fields.push((key.to_owned(), value.into()));
        self
    }
    pub fn version(self, version: &str) -> Self {
        self.field(VERSION, version)
    }
    pub fn host(self, host: &str) -> Self {
        self.field(HOST, host)
    }
    pub fn short_message(self, msg: &str) -> Self {
        self.field(SHORT_MESSAGE, msg)
    }
    pub fn timestamp(self, timestamp: f64) -> Self {
        self.field(TIMESTAMP, timestamp)
    }
    pub fn full_message(self, msg: &str) -> Self {
        self.field(FULL_MESSAGE, msg)
    }
    pub fn level<V: Into<Value>>(self, level: V) -> Self {
        self.field(LEVEL, level)
    }
    pub fn facility(self, facility: &str) -> Self {
        self.field(FACILITY, facility)
    }
    pub fn file(self, file: &str) -> Self {
        self.field(FILE, file)
    }
    pub fn line(self, line: i64) -> Self {
        self.field(LINE, line)
    }
    pub fn additional<V: Into<Value>>(self, key: &str, value: V) -> Self {
        self.field(key, value)
    }
    pub fn build(self) -> Result<GelfMessage> {
        GelfMessage::from_fields(self.fields)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn defaults() {
        let msg = GelfMessage::default();
        assert_eq!(msg.version(), "1.0");
        assert_eq!(msg.host(), "unknown_host");
        assert_eq!(msg.short_message(), "empty");
        assert_eq!(msg.level(), Some(Level::LOG_ALERT));
        assert_eq!(msg.facility(), Some(DEFAULT_FACILITY));
        assert!(msg.timestamp().is_none());
        assert!(msg.full_message().is_none());
        assert!(msg.file().is_none());
        assert!(msg.line().is_none());
    }

    #[test]
    fn levels() {
        let mut msg = GelfMessage::default();
        for l in 0..8_u8 {
            msg.set_level(l).unwrap();
            assert_eq!(msg.get(LEVEL).unwrap(), &Value::Integer(l as i64));
        }
        for l in [8_i64, 9, 255, -1, i64::MIN] {
            assert!(msg.set(LEVEL, l).is_err());
            assert_eq!(msg.level(), Some(Level::LOG_DEBUG));
        }
        assert!(msg.set(LEVEL, "3").is_err());
        assert!(msg.set(LEVEL, 3.0).is_err());
        assert_eq!(msg.level(), Some(Level::LOG_DEBUG));
    }

    #[test]
    fn sentinels_remove_standard_fields() {
        let mut msg = GelfMessage::builder()
            .timestamp(1654000000.25)
            .full_message("a longer message")
            .file("main.rs")
            .line(12)
            .build()
            .unwrap();
        assert_eq!(msg.timestamp(), Some(1654000000.25));
        assert_eq!(msg.full_message(), Some("a longer message"));
        assert_eq!(msg.file(), Some("main.rs"));
        assert_eq!(msg.line(), Some(12));

        msg.set_timestamp(USE_SERVER_TIMESTAMP).unwrap();
        msg.set_full_message("").unwrap();
        msg.set_file("").unwrap();
        msg.set_line(NO_LINE).unwrap();
        assert!(!msg.contains(TIMESTAMP));
        assert!(!msg.contains(FULL_MESSAGE));
        assert!(!msg.contains(FILE));
        assert!(!msg.contains(LINE));
        assert!(msg.get(LINE).is_err());

        // Setting a sentinel on an absent field is fine, too.
        msg.set_line(NO_LINE).unwrap();
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let mut msg = GelfMessage::builder()
            .host("h1")
            .short_message("hi")
            .facility("app")
            .build()
            .unwrap();
        msg.set_version("").unwrap();
        msg.set_host("").unwrap();
        msg.set_short_message("").unwrap();
        msg.set_facility("").unwrap();
        assert_eq!(msg.version(), GELF_VERSION);
        assert_eq!(msg.host(), UNKNOWN_HOST);
        assert_eq!(msg.short_message(), DEFAULT_SHORT_MESSAGE);
        assert_eq!(msg.facility(), Some(DEFAULT_FACILITY));
    }

    #[test]
    fn lines() {
        let mut msg = GelfMessage::default();
        msg.set_line(0).unwrap();
        assert_eq!(msg.line(), Some(0));
        msg.set_line(42).unwrap();
        match msg.set_line(-2) {
            Err(Error::BadField { violation, .. }) => {
                assert_eq!(violation.violation, Violation::NegativeLine(-2))
            }
            _ => panic!("expected a negative line to be rejected"),
        }
        assert_eq!(msg.line(), Some(42));
    }

    #[test]
    fn timestamps() {
        let mut msg = GelfMessage::default();
        msg.set(TIMESTAMP, 1654000000_i64).unwrap();
        assert_eq!(msg.get(TIMESTAMP).unwrap(), &Value::Real(1654000000.0));
        assert!(msg.set_timestamp(f64::NAN).is_err());
        assert!(msg.set(TIMESTAMP, "now").is_err());
        assert_eq!(msg.timestamp(), Some(1654000000.0));
    }

    #[test]
    fn additional_fields() {
        let mut msg = GelfMessage::default();
        msg.set_additional("foo", "bar").unwrap();
        assert_eq!(msg.get("_foo").unwrap(), &Value::from("bar"));
        // the logical name finds the same field
        assert_eq!(msg.get("foo").unwrap(), &Value::from("bar"));

        msg.set_additional("_baz", 17).unwrap();
        assert_eq!(msg.get("_baz").unwrap(), &Value::Integer(17));
        assert!(!msg.contains("__baz"));

        // Standard names are never prefixed
        msg.set_additional("file", "lib.rs").unwrap();
        assert_eq!(msg.file(), Some("lib.rs"));
        assert!(!msg.contains("_file"));

        for key in ["_id", "id", ""] {
            assert!(msg.set_additional(key, "x").is_err());
        }
        assert!(!msg.contains("_id"));
        assert!(msg.set_additional("ratio", f64::INFINITY).is_err());
    }

    #[test]
    fn remove() {
        let mut msg = GelfMessage::default();
        for key in [VERSION, HOST, SHORT_MESSAGE] {
            assert!(matches!(msg.remove(key), Err(Error::RequiredField { .. })));
            assert!(msg.contains(key));
        }
        msg.set_additional("foo", "bar").unwrap();
        assert!(msg.remove("foo").unwrap());
        assert!(!msg.remove("foo").unwrap());
        assert!(msg.remove(LEVEL).unwrap());
        assert!(msg.level().is_none());
        assert!(msg.get(LEVEL).is_err());
    }

    #[test]
    fn insert_only_if_absent() {
        let mut msg = GelfMessage::default();
        assert!(msg.insert("user", "alice").unwrap());
        assert!(!msg.insert("_user", "bob").unwrap());
        assert_eq!(msg.get("user").unwrap(), &Value::from("alice"));
        assert!(msg.insert("id", "x").is_err());
        // a sentinel inserts nothing
        assert!(!msg.insert(FILE, "").unwrap());
        assert!(!msg.contains(FILE));
    }

    #[test]
    fn construction_is_all_or_nothing() {
        let err = GelfMessage::builder()
            .short_message("hi")
            .level(9)
            .line(-5)
            .additional("_id", "x")
            .additional("ok", "fine")
            .build()
            .unwrap_err();
        match err {
            Error::Construction { violations, .. } => {
                assert_eq!(
                    violations,
                    vec![
                        FieldViolation::new(LEVEL, Violation::LevelOutOfRange(9)),
                        FieldViolation::new(LINE, Violation::NegativeLine(-5)),
                        FieldViolation::new("_id", Violation::ReservedKey),
                    ]
                );
            }
            _ => panic!("expected a construction error"),
        }
    }

    #[test]
    fn later_fields_win() {
        let msg = GelfMessage::from_fields(vec![("foo", "a"), ("_foo", "b"), ("host", "h2")])
            .unwrap();
        assert_eq!(msg.get("foo").unwrap(), &Value::from("b"));
        assert_eq!(msg.host(), "h2");
    }

    #[test]
    fn keys() {
        assert_eq!(make_key("level"), "level");
        assert_eq!(make_key("_x"), "_x");
        assert_eq!(make_key("x"), "_x");
        assert_eq!(
            normalize_key("id"),
            Err(FieldViolation::new("_id", Violation::ReservedKey))
        );
        assert!(is_required_field(HOST));
        assert!(!is_required_field(LEVEL));
        assert!(is_standard_field(LEVEL));
    }
}
