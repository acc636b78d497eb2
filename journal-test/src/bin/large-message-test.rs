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

//! Send an entry too large for a single datagram, forcing it through a sealed memfd. Check with
//! `journalctl -t journal-test -o verbose`.

use tracing_journal::{
    handler::{Handler, Options},
    priority::Severity,
    record::{Attr, Record},
};

pub fn main() {
    let handler = Handler::new(Options::builder().identifier("journal-test").build()).unwrap();
    handler.transport().set_send_buffer_size(64 * 1024).unwrap();

    let payload = "0123456789abcdef".repeat(64 * 1024);
    handler
        .handle(
            &Record::new(Severity::NOTICE, "A 1MiB field follows")
                .add_attr(Attr::new("PAYLOAD", payload))
                .add_attr(Attr::new("MULTI_LINE", "line one\nline two")),
        )
        .unwrap();
}
