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
//! Severities & journal priorities.
//!
//! [`Priority`] replicates the eight levels defined in `<syslog.h>`; it's what goes out on the
//! wire in the `PRIORITY=` field. [`Severity`] is the (open) scale on which records are logged:
//! it has eight well-known points, one per [`Priority`], but callers are free to log at any
//! value in between (or beyond). [`Severity::priority`] maps the latter onto the former.

type StdResult<T, E> = std::result::Result<T, E>;

/// The eight severity levels defined by RFC [5424] & documented in the `syslog()` manual [page].
/// The enumeration values duplicate the constants defined in `<syslog.h>`, which are also the
/// values the journal expects in its `PRIORITY` field.
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
/// [page]: https://man7.org/linux/man-pages/man3/syslog.3.html
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// system is unusable
    LOG_EMERG = 0,
    /// action must be take immediately
    LOG_ALERT = 1,
    /// critical conditions
    LOG_CRIT = 2,
    /// error conditions
    LOG_ERR = 3,
    /// warning conditions
    LOG_WARNING = 4,
    /// normal, but significant condition
    LOG_NOTICE = 5,
    /// informational message
    LOG_INFO = 6,
    /// debug-level message
    LOG_DEBUG = 7,
}

impl Priority {
    /// The decimal text the journal expects in `PRIORITY=`
    pub fn as_wire(&self) -> &'static [u8] {
        match self {
            Priority::LOG_EMERG => b"0",
            Priority::LOG_ALERT => b"1",
            Priority::LOG_CRIT => b"2",
            Priority::LOG_ERR => b"3",
            Priority::LOG_WARNING => b"4",
            Priority::LOG_NOTICE => b"5",
            Priority::LOG_INFO => b"6",
            Priority::LOG_DEBUG => b"7",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Priority::LOG_EMERG => "LOG_EMERG",
                Priority::LOG_ALERT => "LOG_ALERT",
                Priority::LOG_CRIT => "LOG_CRIT",
                Priority::LOG_ERR => "LOG_ERR",
                Priority::LOG_WARNING => "LOG_WARNING",
                Priority::LOG_NOTICE => "LOG_NOTICE",
                Priority::LOG_INFO => "LOG_INFO",
                Priority::LOG_DEBUG => "LOG_DEBUG",
            }
        )
    }
}

/// The severity at which a record is logged.
///
/// Larger is more severe. The eight associated constants line up with the eight [`Priority`]
/// values; the gaps between them (and the values above [`Severity::EMERGENCY`]) are available for
/// custom levels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Severity(pub i32);

impl Severity {
    pub const DEBUG: Severity = Severity(-4);
    pub const INFO: Severity = Severity(0);
    pub const NOTICE: Severity = Severity(1);
    pub const WARN: Severity = Severity(4);
    pub const ERROR: Severity = Severity(8);
    pub const CRITICAL: Severity = Severity(9);
    pub const ALERT: Severity = Severity(10);
    pub const EMERGENCY: Severity = Severity(11);

    /// Map this severity to a journal priority.
    ///
    /// The well-known severities map to their namesakes. Anything else maps to the nearest
    /// well-known severity at or below it, except that anything below [`Severity::DEBUG`] is
    /// treated as [`Severity::INFO`]. This function is total: custom levels are perfectly normal
    /// input.
    pub fn priority(&self) -> Priority {
        match self.0 {
            i32::MIN..=-5 => Priority::LOG_INFO,
            -4..=-1 => Priority::LOG_DEBUG,
            0 => Priority::LOG_INFO,
            1..=3 => Priority::LOG_NOTICE,
            4..=7 => Priority::LOG_WARNING,
            8 => Priority::LOG_ERR,
            9 => Priority::LOG_CRIT,
            10 => Priority::LOG_ALERT,
            11..=i32::MAX => Priority::LOG_EMERG,
        }
    }
}

impl std::default::Default for Severity {
    fn default() -> Self {
        Severity::INFO
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        let (name, base) = match self.0 {
            i32::MIN..=-1 => ("DEBUG", Severity::DEBUG),
            0 => ("INFO", Severity::INFO),
            1..=3 => ("NOTICE", Severity::NOTICE),
            4..=7 => ("WARN", Severity::WARN),
            8 => ("ERROR", Severity::ERROR),
            9 => ("CRITICAL", Severity::CRITICAL),
            10 => ("ALERT", Severity::ALERT),
            11..=i32::MAX => ("EMERGENCY", Severity::EMERGENCY),
        };
        match self.0 - base.0 {
            0 => write!(f, "{}", name),
            delta => write!(f, "{}{:+}", name, delta),
        }
    }
}

impl std::convert::From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::DEBUG,
            tracing::Level::INFO => Severity::INFO,
            tracing::Level::WARN => Severity::WARN,
            tracing::Level::ERROR => Severity::ERROR,
        }
    }
}

#[cfg(test)]
mod severity_priority_tests {
    use super::*;

    #[test]
    fn well_known_levels() {
        assert_eq!(Severity::DEBUG.priority(), Priority::LOG_DEBUG);
        assert_eq!(Severity::INFO.priority(), Priority::LOG_INFO);
        assert_eq!(Severity::NOTICE.priority(), Priority::LOG_NOTICE);
        assert_eq!(Severity::WARN.priority(), Priority::LOG_WARNING);
        assert_eq!(Severity::ERROR.priority(), Priority::LOG_ERR);
        assert_eq!(Severity::CRITICAL.priority(), Priority::LOG_CRIT);
        assert_eq!(Severity::ALERT.priority(), Priority::LOG_ALERT);
        assert_eq!(Severity::EMERGENCY.priority(), Priority::LOG_EMERG);
        assert_eq!(Priority::LOG_INFO as u8, 6);
        assert_eq!(Priority::LOG_EMERG.as_wire(), b"0");
        assert_eq!(Priority::LOG_DEBUG.as_wire(), b"7");
    }

    #[test]
    fn custom_levels() {
        // Round down to the nearest well-known level...
        assert_eq!(Severity(-2).priority(), Priority::LOG_DEBUG);
        assert_eq!(Severity(2).priority(), Priority::LOG_NOTICE);
        assert_eq!(Severity(6).priority(), Priority::LOG_WARNING);
        assert_eq!(Severity(42).priority(), Priority::LOG_EMERG);
        // and default to "info" below the bottom of the scale.
        assert_eq!(Severity(-5).priority(), Priority::LOG_INFO);
        assert_eq!(Severity(i32::MIN).priority(), Priority::LOG_INFO);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Severity::WARN), "WARN");
        assert_eq!(format!("{}", Severity(2)), "NOTICE+1");
        assert_eq!(format!("{}", Severity(-6)), "DEBUG-2");
        assert_eq!(format!("{}", Priority::LOG_CRIT), "LOG_CRIT");
        assert_eq!(Severity::from(tracing::Level::TRACE), Severity::DEBUG);
        assert_eq!(Severity::from(tracing::Level::WARN), Severity::WARN);
    }
}
