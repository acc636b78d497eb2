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
//! [tracing-journal](crate) errors

use backtrace::Backtrace;

/// [tracing-journal](crate) error type
///
/// [tracing-journal](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of
/// a straightforward enumeration with a few match arms chosen on the basis what the caller will
/// need to repond.
///
/// Note that there is no variant for "the journal isn't there": a missing daemon is not an error
/// as far as this crate is concerned; the message is quietly dropped.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// Failed to create or configure the datagram socket
    Socket {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Failed to create, or write to, the file used to spill an over-sized message
    TempFile {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Failed to seal a memfd before handing it to the daemon
    Seal {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl Error {
    pub(crate) fn socket<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
        Error::Socket {
            source: Box::new(err),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn temp_file<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
        Error::TempFile {
            source: Box::new(err),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn seal<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
        Error::Seal {
            source: Box::new(err),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn transport<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
        Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        }
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Socket { source, .. } => {
                write!(f, "While setting-up the journal socket, got {}", source)
            }
            Error::TempFile { source, .. } => write!(
                f,
                "While spilling an over-sized message to a temporary file, got {}",
                source
            ),
            Error::Seal { source, .. } => {
                write!(f, "While sealing the spilled message, got {}", source)
            }
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            _ => write!(f, "Other tracing-journal error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Socket { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::TempFile { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::Seal { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::Transport { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            err => write!(f, "tracing-journal error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Socket { source, .. }
            | Error::TempFile { source, .. }
            | Error::Seal { source, .. }
            | Error::Transport { source, .. } => Some(source.as_ref()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
