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

//! The journal [`Handler`].
//!
//! A [`Handler`] ties together a minimum level ([`Leveler`]), a [`JournalFormatter`] & a
//! [`Transport`], along with a [`Context`] of attributes & groups accumulated via
//! [`Handler::with_attrs`] & [`Handler::with_group`]:
//!
//! ```no_run
//! use tracing_journal::{
//!     handler::{Handler, Options},
//!     priority::Severity,
//!     record::{Attr, Record},
//! };
//!
//! let handler = Handler::new(Options::builder().level(Severity::DEBUG).build()).unwrap();
//! let request = handler.with_group("HTTP").with_attrs(&[Attr::new("METHOD", "PUT")]);
//! if request.enabled(Severity::INFO) {
//!     request
//!         .handle(&Record::new(Severity::INFO, "Hello, journal!"))
//!         .unwrap();
//! }
//! ```
//!
//! Deriving a handler never modifies the one it was derived from, so handlers may be freely shared
//! & derived from across threads.

use crate::{
    error::Result,
    formatter::{Context, JournalFormatter, JournalFormatterBuilder},
    level::{LevelVar, Leveler},
    priority::Severity,
    record::{Attr, Record},
    transport::{JournalSocket, Transport, JOURNAL_SOCKET},
};

use std::{
    path::PathBuf,
    sync::Arc,
};

/// [`Handler`] configuration.
pub struct Options {
    level: Arc<dyn Leveler>,
    formatter: JournalFormatter,
    socket_path: PathBuf,
}

impl std::default::Default for Options {
    fn default() -> Self {
        Options {
            level: Arc::new(LevelVar::default()),
            formatter: JournalFormatter::default(),
            socket_path: PathBuf::from(JOURNAL_SOCKET),
        }
    }
}

pub struct OptionsBuilder {
    level: Option<Arc<dyn Leveler>>,
    formatter: JournalFormatterBuilder,
    socket_path: Option<PathBuf>,
}

impl OptionsBuilder {
    /// Records below this level are ignored; the default is a [`LevelVar`] (so `INFO`, or `DEBUG`
    /// under `DEBUG_INVOCATION`).
    pub fn level<L: Leveler + 'static>(mut self, level: L) -> Self {
        self.level = Some(Arc::new(level));
        self
    }
    /// Share a [`Leveler`] (a [`LevelVar`], say) with the caller, so that it can be adjusted
    /// later.
    pub fn shared_level(mut self, level: Arc<dyn Leveler>) -> Self {
        self.level = Some(level);
        self
    }
    pub fn replace_attr<F>(mut self, f: F) -> Self
    where
        F: Fn(&[String], Attr) -> Attr + Send + Sync + 'static,
    {
        self.formatter = self.formatter.replace_attr(f);
        self
    }
    pub fn replace_group<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.formatter = self.formatter.replace_group(f);
        self
    }
    pub fn identifier<I: Into<Vec<u8>>>(mut self, identifier: I) -> Self {
        self.formatter = self.formatter.identifier(identifier);
        self
    }
    /// Send to a socket other than `/run/systemd/journal/socket`
    pub fn socket_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.socket_path = Some(path.into());
        self
    }
    pub fn build(self) -> Options {
        Options {
            level: self
                .level
                .unwrap_or_else(|| Arc::new(LevelVar::default())),
            formatter: self.formatter.build(),
            socket_path: self
                .socket_path
                .unwrap_or_else(|| PathBuf::from(JOURNAL_SOCKET)),
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder {
            level: None,
            formatter: JournalFormatter::builder(),
            socket_path: None,
        }
    }
}

/// Formats [`Record`]s as journal messages & sends them on their way.
pub struct Handler<T: Transport = JournalSocket> {
    level: Arc<dyn Leveler>,
    formatter: Arc<JournalFormatter>,
    transport: Arc<T>,
    context: Context,
}

// Derived `Clone` would needlessly require `T: Clone`.
impl<T: Transport> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Handler {
            level: self.level.clone(),
            formatter: self.formatter.clone(),
            transport: self.transport.clone(),
            context: self.context.clone(),
        }
    }
}

impl Handler<JournalSocket> {
    /// Construct a [`Handler`] that sends to the journal socket named in `opts`.
    pub fn new(opts: Options) -> Result<Self> {
        let transport = JournalSocket::new(&opts.socket_path)?;
        Ok(Handler::with_transport(opts, transport))
    }
    /// Construct a [`Handler`] with default [`Options`].
    pub fn try_default() -> Result<Self> {
        Handler::new(Options::default())
    }
}

impl<T: Transport> Handler<T> {
    /// Construct a [`Handler`] that sends via `transport`; `opts`' socket path is ignored.
    pub fn with_transport(opts: Options, transport: T) -> Self {
        Handler {
            level: opts.level,
            formatter: Arc::new(opts.formatter),
            transport: Arc::new(transport),
            context: Context::default(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Would a record at `severity` be handled?
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.level.level()
    }

    /// Encode `record` (in this handler's context) without sending it.
    pub fn format(&self, record: &Record) -> Vec<u8> {
        self.formatter.format(record, &self.context)
    }

    /// Encode `record` & send it.
    ///
    /// This doesn't consult [`Handler::enabled`]; that's the caller's job (typically before
    /// going to the trouble of building the record at all).
    pub fn handle(&self, record: &Record) -> Result<()> {
        self.transport.send(&self.format(record))
    }

    /// A new [`Handler`] whose records will carry `attrs` in addition to their own.
    pub fn with_attrs(&self, attrs: &[Attr]) -> Handler<T> {
        Handler {
            context: self.formatter.with_attrs(&self.context, attrs),
            ..self.clone()
        }
    }

    /// A new [`Handler`] in which all subsequent attributes (both those added through
    /// [`Handler::with_attrs`] and those of handled records) are qualified by group `name`.
    ///
    /// An empty `name` is a no-op: the result behaves exactly as `self`.
    pub fn with_group(&self, name: &str) -> Handler<T> {
        if name.is_empty() {
            return self.clone();
        }
        Handler {
            context: self.formatter.with_group(&self.context, name),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{kv::parse_fields, record::Value};

    use chrono::prelude::*;

    use std::{collections::HashMap, sync::Mutex};

    /// A [`Transport`] that just remembers what it was asked to send.
    #[derive(Default)]
    struct Captured(Mutex<Vec<Vec<u8>>>);

    impl Transport for Captured {
        fn send(&self, buf: &[u8]) -> Result<()> {
            self.0.lock().unwrap().push(buf.to_vec());
            Ok(())
        }
    }

    impl Captured {
        fn last(&self) -> HashMap<String, String> {
            parse_fields(self.0.lock().unwrap().last().unwrap())
                .into_iter()
                .map(|(k, v)| (k, String::from_utf8(v).unwrap()))
                .collect()
        }
        fn count(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    fn handler() -> Handler<Captured> {
        Handler::with_transport(
            Options::builder()
                .level(Severity::INFO)
                .identifier("handler-test")
                .build(),
            Captured::default(),
        )
    }

    #[test]
    fn basic_functionality() {
        let h = handler();
        let record = Record::new(Severity::INFO, "Hello, World!")
            .with_timestamp(Utc::now())
            .add_attr(Attr::new("key", "value"));
        h.handle(&record).unwrap();
        let kv = h.transport().last();
        assert_eq!(kv["MESSAGE"], "Hello, World!");
        assert_eq!(kv["PRIORITY"], "6");
        assert_eq!(kv["key"], "value");
        assert_eq!(kv["SYSLOG_IDENTIFIER"], "handler-test");
        assert_eq!(
            kv["SYSLOG_TIMESTAMP"],
            record.timestamp.unwrap().timestamp_micros().to_string()
        );

        h.handle(&Record::new(Severity::INFO, "Hello, World!")).unwrap();
        assert!(!h.transport().last().contains_key("SYSLOG_TIMESTAMP"));
        assert_eq!(h.transport().count(), 2);
    }

    #[test]
    fn enabled() {
        let h = handler();
        assert!(!h.enabled(Severity::DEBUG));
        assert!(!h.enabled(Severity(-1)));
        assert!(h.enabled(Severity::INFO));
        assert!(h.enabled(Severity::EMERGENCY));

        let var = Arc::new(LevelVar::new(Severity::WARN));
        let h = Handler::with_transport(
            Options::builder().shared_level(var.clone()).build(),
            Captured::default(),
        );
        assert!(!h.enabled(Severity::INFO));
        var.set(Severity::DEBUG);
        assert!(h.enabled(Severity::INFO));
    }

    #[test]
    fn empty_group_is_a_no_op() {
        let h = handler().with_attrs(&[Attr::new("A", 1i64)]);
        let g = h.with_group("");
        let record = Record::new(Severity::INFO, "m").add_attr(Attr::new("B", 2i64));
        assert_eq!(h.format(&record), g.format(&record));
        assert_eq!(h.context(), g.context());
    }

    #[test]
    fn groups_and_attrs() {
        let h = handler()
            .with_attrs(&[Attr::new("SERVICE", "api")])
            .with_group("HTTP")
            .with_attrs(&[Attr::new("METHOD", "PUT")])
            .with_group("RESPONSE");
        h.handle(
            &Record::new(Severity::WARN, "slow").add_attrs([
                Attr::new("STATUS", 200u64),
                Attr::group("", vec![Attr::new("BYTES", 512u64)]),
                Attr::group("EMPTY", vec![]),
                Attr::new("ELAPSED", std::time::Duration::from_millis(2)),
            ]),
        )
        .unwrap();
        let kv = h.transport().last();
        assert_eq!(kv["PRIORITY"], "4");
        assert_eq!(kv["SERVICE"], "api");
        assert_eq!(kv["HTTP_METHOD"], "PUT");
        assert_eq!(kv["HTTP_RESPONSE_STATUS"], "200");
        assert_eq!(kv["HTTP_RESPONSE_BYTES"], "512");
        assert_eq!(kv["HTTP_RESPONSE_ELAPSED"], "2000");
        assert!(!kv.keys().any(|k| k.contains("EMPTY")));
    }

    #[test]
    fn derived_handlers_are_independent() {
        let parent = handler().with_attrs(&[Attr::new("P", "p")]);
        let before = parent.format(&Record::new(Severity::INFO, "m"));

        let threads: Vec<_> = (0..4)
            .map(|i| {
                let parent = parent.clone();
                std::thread::spawn(move || {
                    let child = parent
                        .with_group(&format!("G{}", i))
                        .with_attrs(&[Attr::new("C", i as i64)]);
                    child.format(&Record::new(Severity::INFO, "m"))
                })
            })
            .collect();
        for (i, thread) in threads.into_iter().enumerate() {
            let buf = thread.join().unwrap();
            let fields = parse_fields(&buf);
            assert!(fields.contains(&(format!("G{}_C", i), i.to_string().into_bytes())));
            assert!(fields.contains(&("P".to_string(), b"p".to_vec())));
        }
        assert_eq!(parent.format(&Record::new(Severity::INFO, "m")), before);
    }

    #[test]
    fn hooks_via_options() {
        let h = Handler::with_transport(
            Options::builder()
                .level(Severity::DEBUG)
                .identifier("handler-test")
                .replace_group(|g| g.to_uppercase())
                .replace_attr(|_, a| match a.value {
                    Value::Str(ref s) if s == "drop me" => Attr::empty(),
                    _ => Attr {
                        key: a.key.to_uppercase(),
                        value: a.value,
                    },
                })
                .build(),
            Captured::default(),
        )
        .with_group("http");
        h.handle(&Record::new(Severity::DEBUG, "m").add_attrs([
            Attr::new("method", "GET"),
            Attr::new("noise", "drop me"),
        ]))
        .unwrap();
        let kv = h.transport().last();
        assert_eq!(kv["HTTP_METHOD"], "GET");
        assert!(!kv.contains_key("HTTP_NOISE"));
        assert_eq!(kv["PRIORITY"], "7");
    }

    #[test]
    fn real_socket_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.sock");
        let daemon = std::os::unix::net::UnixDatagram::bind(&path).unwrap();
        let h = Handler::new(
            Options::builder()
                .socket_path(&path)
                .identifier("handler-test")
                .build(),
        )
        .unwrap();
        h.handle(&Record::new(Severity::ERROR, "boom")).unwrap();
        let mut buf = vec![0u8; 4096];
        let n = daemon.recv(&mut buf).unwrap();
        assert_eq!(
            &buf[..n],
            b"MESSAGE=boom\nPRIORITY=3\nSYSLOG_IDENTIFIER=handler-test\n"
        );
    }
}
