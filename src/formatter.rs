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

//! Journal message formatting
//! ==========================
//!
//! # Introduction
//!
//! [`JournalFormatter`] turns a [`Record`] into a journal message: a buffer of fields in the
//! [native protocol] encoding (see [`crate::kv`]). The fixed fields come first, in this order:
//!
//! [native protocol]: https://systemd.io/JOURNAL_NATIVE_PROTOCOL/
//!
//! 1. `MESSAGE`
//! 2. `PRIORITY`
//! 3. `CODE_FILE`, `CODE_FUNC` & `CODE_LINE`, if the record has a code location
//! 4. `SYSLOG_TIMESTAMP` (microseconds since the epoch), if the record has a timestamp
//! 5. `SYSLOG_IDENTIFIER`
//!
//! followed by whatever attributes have been pre-formatted into the [`Context`], followed by the
//! record's own attributes.
//!
//! # Attributes
//!
//! Attributes form a tree (a [`Value::Group`] holds more attributes); the journal wants a flat
//! list of fields. Groups are flattened by prefixing their members' keys with the group's name
//! and an underscore, so that `HTTP` containing `METHOD` comes out as `HTTP_METHOD`. A group with
//! an empty name adds no prefix; a group with no members produces nothing at all.
//!
//! The journal only accepts field names matching `^[A-Z_][A-Z0-9_]*$`. This module does _not_
//! enforce that; instead it offers two hooks, [`ReplaceAttr`] & [`ReplaceGroup`], by which the
//! caller can rewrite keys (and values) on their way out (see [`crate::sanitize`] for ready-made
//! ones). [`ReplaceAttr`] is called on every non-group attribute, after lazy values have been
//! resolved and before empty attributes are discarded, so it can both see everything and drop
//! anything (by returning [`Attr::empty`]). It is given the path of enclosing group names, as
//! already transformed by [`ReplaceGroup`].

use crate::{
    byte_utils::program_name,
    kv::append_kv,
    record::{Attr, Record, Value},
};

use std::{borrow::Cow, sync::Arc};

/// Hook invoked on each non-group attribute before it is written.
pub type ReplaceAttr = dyn Fn(&[String], Attr) -> Attr + Send + Sync;

/// Hook invoked on each group name before it is used as a prefix.
pub type ReplaceGroup = dyn Fn(&str) -> String + Send + Sync;

/// State accumulated by [`Handler::with_attrs`] & [`Handler::with_group`].
///
/// Every derivation produces a fresh [`Context`]; the one it was derived from is never touched.
///
/// [`Handler::with_attrs`]: crate::handler::Handler::with_attrs
/// [`Handler::with_group`]: crate::handler::Handler::with_group
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Context {
    groups: Vec<String>,
    prefix: String,
    preformatted: Vec<u8>,
}

impl Context {
    /// The (transformed) names of the groups opened so far, outermost first
    pub fn groups(&self) -> &[String] {
        &self.groups
    }
    /// The key prefix implied by [`Context::groups`]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
    /// Fields already encoded on behalf of every record formatted in this context
    pub fn preformatted(&self) -> &[u8] {
        &self.preformatted
    }
}

/// A formatter that produces journal native protocol messages.
#[derive(Clone)]
pub struct JournalFormatter {
    replace_attr: Option<Arc<ReplaceAttr>>,
    replace_group: Option<Arc<ReplaceGroup>>,
    identifier: Vec<u8>,
}

impl std::default::Default for JournalFormatter {
    fn default() -> Self {
        JournalFormatter {
            replace_attr: None,
            replace_group: None,
            identifier: program_name(),
        }
    }
}

impl std::fmt::Debug for JournalFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalFormatter")
            .field("replace_attr", &self.replace_attr.is_some())
            .field("replace_group", &self.replace_group.is_some())
            .field("identifier", &String::from_utf8_lossy(&self.identifier))
            .finish()
    }
}

pub struct JournalFormatterBuilder {
    imp: JournalFormatter,
}

impl JournalFormatterBuilder {
    pub fn replace_attr<F>(mut self, f: F) -> Self
    where
        F: Fn(&[String], Attr) -> Attr + Send + Sync + 'static,
    {
        self.imp.replace_attr = Some(Arc::new(f));
        self
    }
    pub fn replace_group<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.imp.replace_group = Some(Arc::new(f));
        self
    }
    /// Override the `SYSLOG_IDENTIFIER` field (the program's base name, by default)
    pub fn identifier<I: Into<Vec<u8>>>(mut self, identifier: I) -> Self {
        self.imp.identifier = identifier.into();
        self
    }
    pub fn build(self) -> JournalFormatter {
        self.imp
    }
}

impl JournalFormatter {
    pub fn builder() -> JournalFormatterBuilder {
        JournalFormatterBuilder {
            imp: JournalFormatter::default(),
        }
    }

    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    /// Encode `record` in `ctx`; the returned buffer is ready to be handed to a
    /// [`Transport`](crate::transport::Transport).
    pub fn format(&self, record: &Record, ctx: &Context) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1024);
        append_kv(&mut buf, "MESSAGE", record.message.as_bytes());
        append_kv(&mut buf, "PRIORITY", record.severity.priority().as_wire());
        if let Some(loc) = &record.code_location {
            append_kv(&mut buf, "CODE_FILE", loc.file.as_bytes());
            append_kv(&mut buf, "CODE_FUNC", loc.function.as_bytes());
            append_kv(&mut buf, "CODE_LINE", loc.line.to_string().as_bytes());
        }
        if let Some(timestamp) = &record.timestamp {
            append_kv(
                &mut buf,
                "SYSLOG_TIMESTAMP",
                timestamp.timestamp_micros().to_string().as_bytes(),
            );
        }
        append_kv(&mut buf, "SYSLOG_IDENTIFIER", &self.identifier);

        buf.extend_from_slice(&ctx.preformatted);

        let mut groups = ctx.groups.clone();
        for attr in &record.attrs {
            self.append_attr(&mut buf, &mut groups, &ctx.prefix, attr);
        }
        buf
    }

    /// Flatten `attr` into `buf`, prefixing keys with `prefix`. `groups` is the path of group
    /// names corresponding to `prefix`; it's restored to its original state on return.
    pub fn append_attr(
        &self,
        buf: &mut Vec<u8>,
        groups: &mut Vec<String>,
        prefix: &str,
        attr: &Attr,
    ) {
        let mut attr = Cow::Borrowed(attr);
        if let Value::Lazy(_) = attr.value {
            attr = Cow::Owned(Attr {
                key: attr.key.clone(),
                value: attr.value.clone().resolve(),
            });
        }

        if let Some(rep) = &self.replace_attr {
            if !attr.value.is_group() {
                let mut replaced = rep(&groups[..], attr.into_owned());
                // The hook is free to hand back another lazy value.
                replaced.value = replaced.value.resolve();
                attr = Cow::Owned(replaced);
            }
        }

        if attr.is_empty() {
            return;
        }

        match &attr.value {
            Value::Group(members) => {
                if members.is_empty() {
                    return;
                }
                if attr.key.is_empty() {
                    for member in members {
                        self.append_attr(buf, groups, prefix, member);
                    }
                } else {
                    let name = self.group_name(&attr.key);
                    let prefix = format!("{}{}_", prefix, name);
                    groups.push(name);
                    for member in members {
                        self.append_attr(buf, groups, &prefix, member);
                    }
                    groups.pop();
                }
            }
            // The journal has no use for a field named by the prefix alone (or by nothing).
            _ if attr.key.is_empty() => (),
            Value::Duration(d) => append_kv(
                buf,
                &format!("{}{}", prefix, attr.key),
                d.as_micros().to_string().as_bytes(),
            ),
            Value::Time(t) => append_kv(
                buf,
                &format!("{}{}", prefix, attr.key),
                t.timestamp_micros().to_string().as_bytes(),
            ),
            Value::Bytes(b) => append_kv(buf, &format!("{}{}", prefix, attr.key), b),
            value => append_kv(
                buf,
                &format!("{}{}", prefix, attr.key),
                value.to_string().as_bytes(),
            ),
        }
    }

    /// Derive a new [`Context`] from `ctx` with `attrs` pre-formatted; `ctx` is left as-is.
    pub fn with_attrs(&self, ctx: &Context, attrs: &[Attr]) -> Context {
        let mut derived = ctx.clone();
        for attr in attrs {
            self.append_attr(
                &mut derived.preformatted,
                &mut derived.groups,
                &ctx.prefix,
                attr,
            );
        }
        derived
    }

    /// Derive a new [`Context`] from `ctx` in which subsequent attributes belong to group
    /// `name`. An empty `name` yields a copy of `ctx`.
    pub fn with_group(&self, ctx: &Context, name: &str) -> Context {
        if name.is_empty() {
            return ctx.clone();
        }
        let name = self.group_name(name);
        let mut derived = ctx.clone();
        derived.prefix = format!("{}{}_", ctx.prefix, name);
        derived.groups.push(name);
        derived
    }

    fn group_name(&self, name: &str) -> String {
        match &self.replace_group {
            Some(rep) => rep(name),
            None => name.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{
        kv::parse_fields,
        priority::Severity,
        record::{CodeLocation, Value},
    };

    use chrono::prelude::*;

    use std::{sync::Mutex, time::Duration};

    fn formatter() -> JournalFormatter {
        JournalFormatter::builder().identifier("unit-test").build()
    }

    fn fields_of(f: &JournalFormatter, ctx: &Context, attrs: Vec<Attr>) -> Vec<(String, String)> {
        let mut buf = Vec::new();
        let mut groups = ctx.groups().to_vec();
        for attr in &attrs {
            f.append_attr(&mut buf, &mut groups, ctx.prefix(), attr);
        }
        parse_fields(&buf)
            .into_iter()
            .map(|(k, v)| (k, String::from_utf8(v).unwrap()))
            .collect()
    }

    fn kv(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn fixed_fields() {
        let f = formatter();
        let record = Record::new(Severity::WARN, "Hello, world!")
            .with_code_location(CodeLocation {
                file: "src/main.rs".to_string(),
                function: "main".to_string(),
                line: 42,
            })
            .with_timestamp(Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap());
        let buf = f.format(&record, &Context::default());
        assert_eq!(
            std::str::from_utf8(&buf).unwrap(),
            "MESSAGE=Hello, world!\n\
             PRIORITY=4\n\
             CODE_FILE=src/main.rs\n\
             CODE_FUNC=main\n\
             CODE_LINE=42\n\
             SYSLOG_TIMESTAMP=1700000000123456\n\
             SYSLOG_IDENTIFIER=unit-test\n"
        );

        // No timestamp, no code location => neither field
        let buf = f.format(&Record::new(Severity::INFO, "bare"), &Context::default());
        assert_eq!(
            std::str::from_utf8(&buf).unwrap(),
            "MESSAGE=bare\nPRIORITY=6\nSYSLOG_IDENTIFIER=unit-test\n"
        );
    }

    #[test]
    fn multi_line_message() {
        let f = formatter();
        let buf = f.format(
            &Record::new(Severity::ERROR, "first\nsecond"),
            &Context::default(),
        );
        let fields = parse_fields(&buf);
        assert_eq!(fields[0], ("MESSAGE".to_string(), b"first\nsecond".to_vec()));
        assert_eq!(fields[1], ("PRIORITY".to_string(), b"3".to_vec()));
        assert!(buf.starts_with(b"MESSAGE\n"));
    }

    #[test]
    fn scalars() {
        let f = formatter();
        let ctx = Context::default();
        let at = Utc.timestamp_opt(1, 500_000).unwrap();
        assert_eq!(
            fields_of(
                &f,
                &ctx,
                vec![
                    Attr::new("STR", "value"),
                    Attr::new("INT", -7i64),
                    Attr::new("UINT", 7u64),
                    Attr::new("FLAG", true),
                    Attr::new("FLOAT", 1.5f64),
                    Attr::new("ELAPSED", Duration::from_millis(1500)),
                    Attr::new("AT", at),
                    Attr::new("NOTHING", Value::Empty),
                ]
            ),
            vec![
                kv("STR", "value"),
                kv("INT", "-7"),
                kv("UINT", "7"),
                kv("FLAG", "true"),
                kv("FLOAT", "1.5"),
                kv("ELAPSED", "1500000"),
                kv("AT", "1000500"),
                kv("NOTHING", ""),
            ]
        );
    }

    #[test]
    fn dropped_attrs() {
        let f = formatter();
        let ctx = Context::default();
        assert!(fields_of(&f, &ctx, vec![Attr::empty()]).is_empty());
        assert!(fields_of(&f, &ctx, vec![Attr::new("", "orphan")]).is_empty());
        assert!(fields_of(&f, &ctx, vec![Attr::group("NAMED", vec![])]).is_empty());
        assert!(fields_of(&f, &ctx, vec![Attr::group("", vec![])]).is_empty());
        // A group of nothing but empty groups is still nothing
        assert!(fields_of(
            &f,
            &ctx,
            vec![Attr::group("OUTER", vec![Attr::group("INNER", vec![])])]
        )
        .is_empty());
    }

    #[test]
    fn groups() {
        let f = formatter();
        let ctx = Context::default();
        assert_eq!(
            fields_of(
                &f,
                &ctx,
                vec![Attr::group(
                    "HTTP",
                    vec![Attr::group("", vec![Attr::new("METHOD", "PUT")])]
                )]
            ),
            vec![kv("HTTP_METHOD", "PUT")]
        );
        assert_eq!(
            fields_of(
                &f,
                &ctx,
                vec![
                    Attr::group(
                        "REQ",
                        vec![
                            Attr::new("ID", 1i64),
                            Attr::group("USER", vec![Attr::new("NAME", "alice")]),
                            Attr::new("OK", false),
                        ]
                    ),
                    Attr::new("AFTER", "x"),
                ]
            ),
            vec![
                kv("REQ_ID", "1"),
                kv("REQ_USER_NAME", "alice"),
                kv("REQ_OK", "false"),
                kv("AFTER", "x"),
            ]
        );
    }

    #[test]
    fn lazy_values() {
        let f = formatter();
        let attrs = vec![
            Attr::new("LAZY", Value::lazy(|| Value::from("computed"))),
            Attr::new(
                "LAZY_GROUP",
                Value::lazy(|| Value::from(vec![Attr::new("A", 1i64)])),
            ),
        ];
        assert_eq!(
            fields_of(&f, &Context::default(), attrs),
            vec![kv("LAZY", "computed"), kv("LAZY_GROUP_A", "1")]
        );
    }

    #[test]
    fn hooks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let f = JournalFormatter::builder()
            .identifier("unit-test")
            .replace_group(|name| name.to_uppercase())
            .replace_attr(move |groups, attr| {
                seen2
                    .lock()
                    .unwrap()
                    .push((groups.to_vec(), attr.key.clone()));
                if attr.key == "secret" {
                    Attr::empty()
                } else {
                    Attr {
                        key: attr.key.to_uppercase(),
                        value: attr.value,
                    }
                }
            })
            .build();
        let ctx = f.with_group(&Context::default(), "svc");
        assert_eq!(
            fields_of(
                &f,
                &ctx,
                vec![Attr::group(
                    "req",
                    vec![Attr::new("id", 1i64), Attr::new("secret", "hunter2")]
                )]
            ),
            vec![kv("SVC_REQ_ID", "1")]
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (vec!["SVC".to_string(), "REQ".to_string()], "id".to_string()),
                (
                    vec!["SVC".to_string(), "REQ".to_string()],
                    "secret".to_string()
                ),
            ]
        );
    }

    #[test]
    fn contexts_are_copied_not_shared() {
        let f = formatter();
        let root = Context::default();
        let parent = f.with_attrs(&root, &[Attr::new("SHARED", "yes")]);
        let before = parent.clone();

        let a = f.with_attrs(&f.with_group(&parent, "A"), &[Attr::new("X", 1i64)]);
        let b = f.with_attrs(&parent, &[Attr::new("Y", 2i64)]);

        assert_eq!(parent, before);
        assert_eq!(root, Context::default());
        assert_eq!(a.preformatted(), b"SHARED=yes\nA_X=1\n");
        assert_eq!(b.preformatted(), b"SHARED=yes\nY=2\n");
        assert_eq!(f.with_group(&parent, ""), parent);

        let buf = f.format(&Record::new(Severity::INFO, "m").add_attr(Attr::new("Z", 3i64)), &a);
        assert!(buf.ends_with(b"SYSLOG_IDENTIFIER=unit-test\nSHARED=yes\nA_X=1\nA_Z=3\n"));
    }
}
