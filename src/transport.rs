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

//! The journal transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well
//! as [`JournalSocket`], which speaks to journald over its native Unix datagram socket.
//!
//! # Examples
//!
//! To send messages to the journal at its usual address:
//!
//! ```rust
//! use tracing_journal::transport::JournalSocket;
//! let transpo = JournalSocket::try_default().unwrap();
//! ```
//!
//! Note that this succeeds whether or not journald is actually running; the socket is not
//! connected, and messages sent while the daemon is absent are simply dropped.
//!
//! # Atomicity
//!
//! Each message goes out in exactly one `sendto(2)` or `sendmsg(2)` call, so messages from
//! concurrent callers can't interleave, and no locking is required.

use crate::{
    error::{Error, Result},
    tempfd::spill,
};

use nix::{
    errno::Errno,
    sys::socket::{sendmsg, setsockopt, sockopt, ControlMessage, MsgFlags, UnixAddr},
};

use std::{
    fs::File,
    io,
    os::{
        fd::AsRawFd,
        unix::net::UnixDatagram,
    },
    path::{Path, PathBuf},
};

/// Where journald listens for native protocol messages.
pub const JOURNAL_SOCKET: &str = "/run/systemd/journal/socket";

/// We ask for a generous send buffer so that all but the largest messages go out in a single
/// datagram (the kernel may cap this at `net.core.wmem_max`).
const SNDBUF_SIZE: usize = 8 * 1024 * 1024;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Deliver one complete, encoded message.
    ///
    /// Implementations must either deliver `buf` in its entirety or not at all.
    fn send(&self, buf: &[u8]) -> Result<()>;
}

/// Sending journal messages via journald's Unix datagram socket.
#[derive(Debug)]
pub struct JournalSocket {
    socket: UnixDatagram,
    path: PathBuf,
    addr: UnixAddr,
}

impl JournalSocket {
    /// Construct a [`Transport`] implementation that will send datagrams to `path`.
    ///
    /// The socket is neither bound nor connected, so this succeeds even if nothing is listening at
    /// `path` (yet).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<JournalSocket> {
        let path = path.as_ref().to_path_buf();
        let addr = UnixAddr::new(&path).map_err(Error::socket)?;
        let socket = UnixDatagram::unbound().map_err(Error::socket)?;
        socket.set_nonblocking(true).map_err(Error::socket)?;
        setsockopt(&socket, sockopt::SndBuf, &SNDBUF_SIZE).map_err(Error::socket)?;
        Ok(JournalSocket { socket, path, addr })
    }
    /// Construct a [`Transport`] implementation that will send datagrams to journald at
    /// `/run/systemd/journal/socket`
    pub fn try_default() -> Result<JournalSocket> {
        JournalSocket::new(JOURNAL_SOCKET)
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    /// Adjust the socket's send buffer; this bounds the largest message that can be sent without
    /// spilling it to a file.
    pub fn set_send_buffer_size(&self, size: usize) -> Result<()> {
        setsockopt(&self.socket, sockopt::SndBuf, &size).map_err(Error::socket)
    }
    /// Send an empty datagram carrying `file`'s descriptor as `SCM_RIGHTS` ancillary data.
    fn send_fd(&self, file: &File) -> Result<()> {
        let fds = [file.as_raw_fd()];
        let cmsgs = [ControlMessage::ScmRights(&fds)];
        match sendmsg(
            self.socket.as_raw_fd(),
            &[],
            &cmsgs,
            MsgFlags::empty(),
            Some(&self.addr),
        ) {
            Ok(_) => Ok(()),
            Err(Errno::ENOENT) => {
                tracing::trace!("{:?} disappeared; dropping the message", self.path);
                Ok(())
            }
            Err(err) => Err(Error::transport(err)),
        }
    }
}

/// Would this error go away if the message were smaller?
fn is_too_large(err: &io::Error) -> bool {
    err.raw_os_error() == Some(Errno::ENOBUFS as i32)
        || err.raw_os_error() == Some(Errno::EMSGSIZE as i32)
}

impl Transport for JournalSocket {
    fn send(&self, buf: &[u8]) -> Result<()> {
        match self.socket.send_to(buf, &self.path) {
            Ok(_) => Ok(()),
            // No journal? No problem-- logging must never take the application down.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::trace!("No socket at {:?}; dropping the message", self.path);
                Ok(())
            }
            Err(err) if is_too_large(&err) => {
                tracing::debug!(
                    "{}-byte message won't fit in a datagram ({}); sending it as a file",
                    buf.len(),
                    err
                );
                // `file` is closed when it goes out of scope, but by then the daemon holds its own
                // reference to it.
                let file = spill(buf)?;
                self.send_fd(&file)
            }
            Err(err) => Err(Error::transport(err)),
        }
    }
}
