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

//! Spilling over-sized messages to an anonymous file.
//!
//! When a message won't fit in a single datagram, the journal protocol lets us write it to a file
//! and send the daemon a descriptor for that file instead. The file should be anonymous (so that
//! nothing else can find it, and it disappears once both sides close it) & sealed (so that we
//! can't change it out from under the daemon).
//!
//! [`spill`] prefers a [memfd], which is both. Failing that (pre-3.17 kernels, non-Linux hosts) it
//! falls back to an unlinked file in `/dev/shm`, and then in the system temporary directory.
//! Sealing such files will generally fail, which is fine: having no name, they're already out of
//! anyone else's reach.
//!
//! [memfd]: https://man7.org/linux/man-pages/man2/memfd_create.2.html

use crate::error::{Error, Result};

use std::{fs::File, io::Write};

/// Preferred directory for the fallback file: a tmpfs on most Linux systems.
const SHM_DIR: &str = "/dev/shm";

/// Write `buf` to a fresh anonymous file & return it, sealed where that's possible.
///
/// The returned [`File`]'s offset is at the end of the data; the receiver is expected to read from
/// offset zero (as journald does).
pub fn spill(buf: &[u8]) -> Result<File> {
    if let Some(mut file) = memfd() {
        file.write_all(buf).map_err(Error::temp_file)?;
        // This is our only guarantee that the contents can't change between now & the time the
        // daemon reads them, so a failure here is fatal.
        seal(&file).map_err(Error::seal)?;
        return Ok(file);
    }

    let mut file = anonymous_file()?;
    file.write_all(buf).map_err(Error::temp_file)?;
    if let Err(err) = seal(&file) {
        tracing::trace!("Not sealing the fallback file: {}", err);
    }
    Ok(file)
}

#[cfg(target_os = "linux")]
fn memfd() -> Option<File> {
    use nix::sys::memfd::{memfd_create, MemFdCreateFlag};
    match memfd_create(
        c"journal-export",
        MemFdCreateFlag::MFD_ALLOW_SEALING | MemFdCreateFlag::MFD_CLOEXEC,
    ) {
        Ok(fd) => Some(File::from(fd)),
        Err(err) => {
            tracing::debug!("memfd_create failed ({}); falling back to a temp file", err);
            None
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn memfd() -> Option<File> {
    None
}

/// Forbid any further writes to, or resizing of, `file` (and forbid lifting that restriction).
#[cfg(target_os = "linux")]
fn seal(file: &File) -> nix::Result<()> {
    use nix::fcntl::{fcntl, FcntlArg, SealFlag};
    use std::os::fd::AsRawFd;
    fcntl(
        file.as_raw_fd(),
        FcntlArg::F_ADD_SEALS(
            SealFlag::F_SEAL_SEAL
                | SealFlag::F_SEAL_SHRINK
                | SealFlag::F_SEAL_GROW
                | SealFlag::F_SEAL_WRITE,
        ),
    )
    .map(|_| ())
}

#[cfg(not(target_os = "linux"))]
fn seal(_file: &File) -> nix::Result<()> {
    Err(nix::errno::Errno::ENOSYS)
}

/// An already-unlinked file in `/dev/shm`, or in the system temp directory if that's unavailable.
fn anonymous_file() -> Result<File> {
    tempfile::tempfile_in(SHM_DIR)
        .or_else(|err| {
            tracing::trace!(
                "No anonymous file in {} ({}); trying {:?}",
                SHM_DIR,
                err,
                std::env::temp_dir()
            );
            tempfile::tempfile()
        })
        .map_err(Error::temp_file)
}
