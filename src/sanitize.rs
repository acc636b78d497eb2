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

//! Ready-made hooks for coercing attribute keys & group names into journal field names.
//!
//! journald only accepts field names made up of upper-case ASCII letters, digits & underscores,
//! not beginning with a digit, and at most 64 bytes long. Names beginning with an underscore are
//! reserved for fields the daemon itself attaches ("trusted" fields) & are silently discarded when
//! they come from a client. See [`systemd.journal-fields(7)`].
//!
//! The formatter doesn't enforce any of this; install [`replace_attr`] & [`replace_group`] via
//! [`OptionsBuilder`](crate::handler::OptionsBuilder) if your keys aren't already in that form
//! (the [`Layer`](crate::layer::Layer) does so by default, since `tracing` field names
//! conventionally aren't).
//!
//! [`systemd.journal-fields(7)`]: https://www.freedesktop.org/software/systemd/man/latest/systemd.journal-fields.html

use crate::record::Attr;

/// The longest field name journald will accept.
pub const MAX_FIELD_NAME: usize = 64;

/// Map `name` into the journal's field-name alphabet.
///
/// Letters are upper-cased & anything else outside `[A-Z0-9_]` becomes `_`. Leading underscores are
/// removed, a leading digit gets an `X` prepended, and the result is truncated to
/// [`MAX_FIELD_NAME`]. A name with nothing usable in it comes back empty.
pub fn field_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' => c.to_ascii_uppercase(),
            'A'..='Z' | '0'..='9' | '_' => c,
            _ => '_',
        })
        .skip_while(|c| *c == '_')
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'X');
    }
    // Everything's ASCII by now, so any byte offset is a char boundary.
    out.truncate(MAX_FIELD_NAME);
    out
}

/// A [`ReplaceAttr`](crate::formatter::ReplaceAttr) hook that applies [`field_name`] to each key.
pub fn replace_attr(_groups: &[String], attr: Attr) -> Attr {
    Attr {
        key: field_name(&attr.key),
        value: attr.value,
    }
}

/// A [`ReplaceGroup`](crate::formatter::ReplaceGroup) hook that applies [`field_name`] to each group
/// name.
pub fn replace_group(name: &str) -> String {
    field_name(name)
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{
        formatter::{Context, JournalFormatter},
        kv::parse_fields,
        priority::Severity,
        record::Record,
    };

    #[test]
    fn field_names() {
        assert_eq!(field_name("USER_ID"), "USER_ID");
        assert_eq!(field_name("user.id"), "USER_ID");
        assert_eq!(field_name("http-status"), "HTTP_STATUS");
        assert_eq!(field_name("_hidden"), "HIDDEN");
        assert_eq!(field_name("__x"), "X");
        assert_eq!(field_name("3xx"), "X3XX");
        assert_eq!(field_name("größe"), "GR__E");
        assert_eq!(field_name("___"), "");
        assert_eq!(field_name(""), "");
        assert_eq!(field_name(&"a".repeat(100)).len(), MAX_FIELD_NAME);
    }

    #[test]
    fn as_hooks() {
        let f = JournalFormatter::builder()
            .identifier("sanitize-test")
            .replace_attr(replace_attr)
            .replace_group(replace_group)
            .build();
        let ctx = f.with_group(&Context::default(), "http.request");
        let record = Record::new(Severity::INFO, "m").add_attrs([
            Attr::new("method", "GET"),
            Attr::new("_pid", 1i64),
            Attr::new("...", "nothing left of the key"),
        ]);
        let fields = parse_fields(&f.format(&record, &ctx));
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "MESSAGE",
                "PRIORITY",
                "SYSLOG_IDENTIFIER",
                "HTTP_REQUEST_METHOD",
                "HTTP_REQUEST_PID"
            ]
        );
    }
}
