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

//! Structured logging to the [systemd journal] via its [native protocol].
//!
//! [systemd journal]: https://www.freedesktop.org/software/systemd/man/latest/systemd-journald.service.html
//! [native protocol]: https://systemd.io/JOURNAL_NATIVE_PROTOCOL/
//!
//! # Introduction
//!
//! journald accepts log entries as sets of `KEY=value` fields sent, one entry per datagram, to
//! `/run/systemd/journal/socket`. Unlike syslog, there's no fixed header: an entry is nothing
//! _but_ fields, a few of which (`MESSAGE`, `PRIORITY`, `CODE_FILE` & friends) the journal knows
//! about, and the rest of which are whatever the application cares to attach. That makes it a
//! natural destination for structured logs.
//!
//! This crate converts a [`Record`](record::Record) (a message, a [`Severity`](priority::Severity),
//! an optional timestamp & source location, and a tree of key/value [`Attr`](record::Attr)ibutes)
//! into that format & delivers it. Nested attributes are flattened into `PARENT_CHILD` field names.
//! Entries too large for one datagram are written to a sealed memfd whose descriptor is sent to
//! the daemon in their place. If journald isn't running, entries are quietly dropped.
//!
//! # Usage
//!
//! Directly, through a [`Handler`](handler::Handler):
//!
//! ```no_run
//! use tracing_journal::{
//!     handler::{Handler, Options},
//!     priority::Severity,
//!     record::{Attr, Record},
//! };
//!
//! let handler = Handler::new(Options::builder().identifier("my-service").build()).unwrap();
//! handler
//!     .with_group("HTTP")
//!     .handle(
//!         &Record::new(Severity::WARN, "Slow request")
//!             .add_attrs([Attr::new("METHOD", "GET"), Attr::new("STATUS", 200u64)]),
//!     )
//!     .unwrap();
//! ```
//!
//! produces a journal entry carrying `HTTP_METHOD=GET` & `HTTP_STATUS=200` along with the message
//! at priority 4.
//!
//! Or as a [`tracing-subscriber`] [`Layer`](layer::Layer):
//!
//! ```no_run
//! use tracing::info;
//! use tracing_journal::layer::Layer;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! let subscriber = Registry::default().with(Layer::try_default().unwrap());
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! info!(user = "alice", "Hello, journal!");
//! ```
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html

pub mod byte_utils;
pub mod error;
pub mod formatter;
pub mod handler;
pub mod kv;
pub mod layer;
pub mod level;
pub mod priority;
pub mod record;
pub mod sanitize;
pub mod tempfd;
pub mod transport;
