// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Setting a TCP socket's initial congestion-control algorithm
//! (`--cong`), the one piece of raw sockopt plumbing both the sender and
//! receiver CLIs need. `socket2` does not expose `TCP_CONGESTION` as a
//! named method, so this mirrors [`crate::telemetry`]'s `libc::getsockopt`
//! use with the `setsockopt` counterpart.

#[cfg(target_os = "linux")]
mod linux {
    use std::ffi::CString;
    use std::os::unix::io::RawFd;

    const TCP_CONGESTION: libc::c_int = 13;

    /// Sets `fd`'s congestion-control algorithm by name (e.g. `"cubic"`,
    /// `"bbr"`, `"astraea"`). The algorithm's kernel module must already be
    /// loaded; an unknown name surfaces as an `io::Error`.
    pub fn set_congestion(fd: RawFd, name: &str) -> std::io::Result<()> {
        let cname = CString::new(name).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "congestion name contains a NUL byte")
        })?;
        // SAFETY: `cname`'s bytes (including the NUL terminator) are valid
        // for `cname.as_bytes_with_nul().len()`, which is exactly what we
        // tell `setsockopt` to read.
        let rc = unsafe {
            libc::setsockopt(
                fd,
                libc::IPPROTO_TCP,
                TCP_CONGESTION,
                cname.as_ptr() as *const libc::c_void,
                cname.as_bytes_with_nul().len() as libc::socklen_t,
            )
        };
        if rc == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux::set_congestion;

#[cfg(not(target_os = "linux"))]
pub fn set_congestion(_fd: std::os::raw::c_int, _name: &str) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "setting TCP_CONGESTION is only supported on linux",
    ))
}
