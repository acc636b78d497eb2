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

//! Minimum-level policies.
//!
//! A [`Handler`](crate::handler::Handler) drops any record below the level reported by its
//! [`Leveler`]. A bare [`Severity`] is a fixed threshold; [`LevelVar`] is an adjustable one that
//! also implements the service side of systemd's [`RestartMode=debug`]: if the service manager
//! set `DEBUG_INVOCATION` in our environment, the threshold drops to [`Severity::DEBUG`].
//!
//! [`RestartMode=debug`]: https://www.freedesktop.org/software/systemd/man/latest/systemd.service.html#RestartMode=

use crate::priority::Severity;

use std::sync::{
    atomic::{AtomicI32, Ordering},
    Once, OnceLock,
};

/// The environment variable systemd sets when a unit is restarted in debug mode.
pub const DEBUG_INVOCATION: &str = "DEBUG_INVOCATION";

/// Supplies the minimum enabled [`Severity`].
pub trait Leveler: Send + Sync {
    fn level(&self) -> Severity;
}

impl Leveler for Severity {
    fn level(&self) -> Severity {
        *self
    }
}

/// Whether `DEBUG_INVOCATION` is set (to anything non-empty). The environment is consulted on the
/// first call only.
pub fn debug_invocation() -> bool {
    static DEBUG: OnceLock<bool> = OnceLock::new();
    *DEBUG.get_or_init(|| {
        std::env::var_os(DEBUG_INVOCATION).map_or(false, |val| !val.is_empty())
    })
}

/// An adjustable [`Leveler`], defaulting to [`Severity::INFO`].
///
/// On first use (be it [`Leveler::level`] or [`LevelVar::set`]) it checks for `DEBUG_INVOCATION`
/// and, if present, lowers itself to [`Severity::DEBUG`]. A later [`LevelVar::set`] wins.
pub struct LevelVar {
    level: AtomicI32,
    debug_checked: Once,
}

impl std::default::Default for LevelVar {
    fn default() -> Self {
        LevelVar::new(Severity::INFO)
    }
}

impl std::fmt::Debug for LevelVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LevelVar({})", Severity(self.level.load(Ordering::Relaxed)))
    }
}

impl LevelVar {
    pub fn new(level: Severity) -> LevelVar {
        LevelVar {
            level: AtomicI32::new(level.0),
            debug_checked: Once::new(),
        }
    }
    pub fn set(&self, level: Severity) {
        self.check_debug(debug_invocation);
        self.level.store(level.0, Ordering::Relaxed);
    }
    fn check_debug<F: FnOnce() -> bool>(&self, debug: F) {
        self.debug_checked.call_once(|| {
            if debug() {
                self.level.store(Severity::DEBUG.0, Ordering::Relaxed);
            }
        });
    }
}

impl Leveler for LevelVar {
    fn level(&self) -> Severity {
        self.check_debug(debug_invocation);
        Severity(self.level.load(Ordering::Relaxed))
    }
}
