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

//! Send [`tracing`] events at each level to the local journal. Check with `journalctl -t
//! journal-test -o verbose`.

use tracing::{debug, error, info, info_span, trace, warn};
use tracing_journal::layer::{default_options, Layer};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

pub fn main() {
    let layer = Layer::new(default_options().identifier("journal-test").build())
        .unwrap()
        .with_span_groups(true);
    let subscriber = Registry::default().with(layer);
    let _guard = tracing::subscriber::set_default(subscriber);

    let span = info_span!("request", id = 1u64, path = "/index.html");
    let _span = span.enter();

    trace!(answer = 42u64, "你好, journal.");
    debug!(answer = 42u64, "你好, journal.");
    info!(answer = 42u64, "你好, journal.");
    warn!(answer = 42u64, "你好, journal.");
    error!(answer = 42u64, "你好, journal.");
}
