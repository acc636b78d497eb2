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

use std::{ffi::OsStr, path::Path};

/// Produce a [`Vec`] of bytes from an [`OsStr`].
pub fn bytes_from_os_str(s: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    s.as_bytes().to_vec()
}

/// The base name of the running program: the last path component of `argv[0]`, falling back to
/// that of [`std::env::current_exe`], and finally to "-".
pub fn program_name() -> Vec<u8> {
    std::env::args_os()
        .next()
        .and_then(|arg0| Path::new(&arg0).file_name().map(bytes_from_os_str))
        .or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|pbuf| pbuf.file_name().map(bytes_from_os_str))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| b"-".to_vec())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn program_name_is_a_base_name() {
        let name = program_name();
        assert!(!name.is_empty());
        assert!(!name.contains(&b'/'));
    }
}
