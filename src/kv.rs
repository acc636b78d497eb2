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

//! The journal's [native protocol] field encoding.
//!
//! A journal message is a sequence of fields, each in one of two forms:
//!
//! ```text
//! KEY=value\n
//! KEY\n<64-bit little-endian length><value>
//! ```
//!
//! The first is used whenever the value contains no line feed; the second when it does. There is
//! no other escaping: values are arbitrary bytes (NULs included).
//!
//! [native protocol]: https://systemd.io/JOURNAL_NATIVE_PROTOCOL/

use bytes::BufMut;

/// Append one field to `buf`.
pub fn append_kv(buf: &mut Vec<u8>, key: &str, value: &[u8]) {
    buf.put_slice(key.as_bytes());
    if value.contains(&b'\n') {
        buf.put_u8(b'\n');
        buf.put_u64_le(value.len() as u64);
        buf.put_slice(value);
    } else {
        buf.put_u8(b'=');
        buf.put_slice(value);
        buf.put_u8(b'\n');
    }
}

/// Split an encoded message back into its fields; test-only, since reading the journal is not
/// this crate's business.
#[cfg(test)]
pub(crate) fn parse_fields(mut buf: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut fields = Vec::new();
    while !buf.is_empty() {
        let end = buf
            .iter()
            .position(|b| *b == b'=' || *b == b'\n')
            .expect("unterminated key");
        let key = String::from_utf8(buf[..end].to_vec()).expect("non-UTF-8 key");
        if buf[end] == b'=' {
            let rest = &buf[end + 1..];
            let nl = rest.iter().position(|b| *b == b'\n').expect("unterminated value");
            fields.push((key, rest[..nl].to_vec()));
            buf = &rest[nl + 1..];
        } else {
            let rest = &buf[end + 1..];
            let mut len = [0u8; 8];
            len.copy_from_slice(&rest[..8]);
            let len = u64::from_le_bytes(len) as usize;
            fields.push((key, rest[8..8 + len].to_vec()));
            buf = &rest[8 + len..];
        }
    }
    fields
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn inline_form() {
        let mut buf = Vec::new();
        append_kv(&mut buf, "MESSAGE", b"Hello, world!");
        assert_eq!(buf, b"MESSAGE=Hello, world!\n");

        // Splitting on the first '=' and dropping the trailing newline gets the value back,
        // even when the value itself contains '='s.
        let mut buf = Vec::new();
        append_kv(&mut buf, "EQUATION", b"a=b=c");
        let text = std::str::from_utf8(&buf).unwrap();
        let (key, value) = text.split_once('=').unwrap();
        assert_eq!(key, "EQUATION");
        assert_eq!(value.strip_suffix('\n').unwrap(), "a=b=c");
    }

    #[test]
    fn binary_form() {
        let mut buf = Vec::new();
        append_kv(&mut buf, "MESSAGE", b"line one\nline two");
        let mut golden = Vec::from(&b"MESSAGE\n"[..]);
        golden.extend_from_slice(&17u64.to_le_bytes());
        golden.extend_from_slice(b"line one\nline two");
        assert_eq!(buf, golden);
        // No trailing delimiter in this form
        assert_eq!(buf.last(), Some(&b'o'));
    }

    #[test]
    fn arbitrary_bytes() {
        let mut buf = Vec::new();
        let value: &[u8] = b"\0nul\xffand\nnewline\n";
        append_kv(&mut buf, "BLOB", value);
        append_kv(&mut buf, "EMPTY", b"");
        append_kv(&mut buf, "NUL", b"\0");
        assert_eq!(
            parse_fields(&buf),
            vec![
                ("BLOB".to_string(), value.to_vec()),
                ("EMPTY".to_string(), vec![]),
                ("NUL".to_string(), vec![0]),
            ]
        );
    }
}
