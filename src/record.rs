// Copyright (C) 2022-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-journal.
//
// tracing-journal is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// tracing-journal is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with tracing-journal.  If
// not, see <http://www.gnu.org/licenses/>.

//! The framework-neutral log record.
//!
//! A [`Record`] is what a [`Handler`](crate::handler::Handler) consumes: a message, a
//! [`Severity`], an optional timestamp & code location, and a list of [`Attr`]ibutes. Attributes
//! are key/[`Value`] pairs, where a value may itself be a group of attributes, so that a record
//! carries a tree of data which the [`JournalFormatter`](crate::formatter::JournalFormatter)
//! flattens into journal fields.

use crate::priority::Severity;

use chrono::prelude::*;

use std::{sync::Arc, time::Duration};

type StdResult<T, E> = std::result::Result<T, E>;

/// A value whose computation is deferred until a record is actually encoded.
///
/// Implementations may return another [`Value::Lazy`]; resolution continues until a concrete
/// value is produced (up to a fixed bound, in case of cycles).
pub trait LogValue: Send + Sync {
    fn log_value(&self) -> Value;
}

impl<F> LogValue for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn log_value(&self) -> Value {
        self()
    }
}

/// How many times [`Value::resolve`] will chase a [`LogValue`] before giving up.
const MAX_RESOLUTIONS: usize = 100;

/// An attribute value.
#[derive(Clone)]
pub enum Value {
    /// The zero value; an [`Attr`] with an empty key and this value is ignored
    Empty,
    Str(String),
    /// Raw bytes, written to the journal verbatim
    Bytes(Vec<u8>),
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    /// Written as integral microseconds
    Duration(Duration),
    /// Written as integral microseconds since the Unix epoch
    Time(DateTime<Utc>),
    /// A named collection of attributes; flattened with `_`-separated prefixes
    Group(Vec<Attr>),
    Lazy(Arc<dyn LogValue>),
}

impl Value {
    /// Force any deferred computation.
    pub fn resolve(self) -> Value {
        let mut value = self;
        for _ in 0..MAX_RESOLUTIONS {
            match value {
                Value::Lazy(lazy) => value = lazy.log_value(),
                value => return value,
            }
        }
        Value::Str(format!(
            "LogValue called too many times ({}) without producing a concrete value",
            MAX_RESOLUTIONS
        ))
    }
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
    pub fn is_group(&self) -> bool {
        matches!(self, Value::Group(_))
    }
    pub fn lazy<L: LogValue + 'static>(l: L) -> Value {
        Value::Lazy(Arc::new(l))
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        match self {
            Value::Empty => write!(f, "Empty"),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Bytes(b) => write!(f, "Bytes({:?})", b),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::I64(i) => write!(f, "I64({})", i),
            Value::U64(u) => write!(f, "U64({})", u),
            Value::F64(x) => write!(f, "F64({})", x),
            Value::Duration(d) => write!(f, "Duration({:?})", d),
            Value::Time(t) => write!(f, "Time({})", t.to_rfc3339()),
            Value::Group(attrs) => f.debug_tuple("Group").field(attrs).finish(),
            Value::Lazy(_) => write!(f, "Lazy(..)"),
        }
    }
}

/// The generic textual form of a value; used for every kind for which the journal encoding
/// doesn't have something more specific to say.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        match self {
            Value::Empty => Ok(()),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I64(i) => write!(f, "{}", i),
            Value::U64(u) => write!(f, "{}", u),
            Value::F64(x) => write!(f, "{}", x),
            Value::Duration(d) => write!(f, "{:?}", d),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Group(attrs) => {
                write!(f, "[")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}={}", attr.key, attr.value)?;
                }
                write!(f, "]")
            }
            Value::Lazy(_) => write!(f, "{}", self.clone().resolve()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::I64(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::U64(u as u64)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::U64(u)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::F64(x)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl From<Vec<Attr>> for Value {
    fn from(attrs: Vec<Attr>) -> Self {
        Value::Group(attrs)
    }
}

/// A key/value pair attached to a [`Record`] (or to a [`Handler`](crate::handler::Handler)).
#[derive(Clone, Debug)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new<K: Into<String>, V: Into<Value>>(key: K, value: V) -> Attr {
        Attr {
            key: key.into(),
            value: value.into(),
        }
    }
    /// A group attribute; an empty `key` makes the group transparent (its members are inlined).
    pub fn group<K: Into<String>>(key: K, attrs: Vec<Attr>) -> Attr {
        Attr {
            key: key.into(),
            value: Value::Group(attrs),
        }
    }
    /// The zero attribute: empty key, empty value. Returning this from a
    /// [`ReplaceAttr`](crate::formatter::ReplaceAttr) hook drops the attribute.
    pub fn empty() -> Attr {
        Attr {
            key: String::new(),
            value: Value::Empty,
        }
    }
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.value.is_empty()
    }
}

/// Where in the source a record was logged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeLocation {
    pub file: String,
    pub function: String,
    pub line: u32,
}

/// A single log record, ready for encoding.
#[derive(Clone, Debug)]
pub struct Record {
    pub message: String,
    pub severity: Severity,
    /// If `None`, the journal will timestamp the message on receipt.
    pub timestamp: Option<DateTime<Utc>>,
    pub code_location: Option<CodeLocation>,
    pub attrs: Vec<Attr>,
}

impl Record {
    pub fn new<M: Into<String>>(severity: Severity, message: M) -> Record {
        Record {
            message: message.into(),
            severity,
            timestamp: None,
            code_location: None,
            attrs: Vec::new(),
        }
    }
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Record {
        self.timestamp = Some(timestamp);
        self
    }
    pub fn with_code_location(mut self, code_location: CodeLocation) -> Record {
        self.code_location = Some(code_location);
        self
    }
    pub fn add_attr(mut self, attr: Attr) -> Record {
        self.attrs.push(attr);
        self
    }
    pub fn add_attrs<I: IntoIterator<Item = Attr>>(mut self, attrs: I) -> Record {
        self.attrs.extend(attrs);
        self
    }
}
