use std::os::fd::RawFd;

use bitflags::bitflags;

use crate::{NetError, Result};

bitflags! {
    /// Readiness flags, mirroring `ESL_POLL_READ`/`WRITE`/`ERROR`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PollFlags: i16 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const ERROR = 1 << 2;
    }
}

impl PollFlags {
    fn to_poll_events(self) -> libc::c_short {
        let mut events = 0;
        if self.contains(Self::READ) {
            events |= libc::POLLIN;
        }
        if self.contains(Self::WRITE) {
            events |= libc::POLLOUT;
        }
        events as libc::c_short
    }

    fn from_revents(revents: libc::c_short) -> Self {
        let mut out = Self::empty();
        if revents as i32 & libc::POLLIN != 0 {
            out |= Self::READ;
        }
        if revents as i32 & libc::POLLOUT != 0 {
            out |= Self::WRITE;
        }
        if revents as i32 & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
            out |= Self::ERROR;
        }
        out
    }
}

/// Blocks on `fd` for up to `ms` milliseconds (`0` returns immediately,
/// negative blocks forever) waiting for any of `flags` to become
/// ready, returning the flags that actually fired (empty on timeout).
pub fn wait_sock(fd: RawFd, ms: i32, flags: PollFlags) -> Result<PollFlags> {
    let mut pfd = libc::pollfd { fd, events: flags.to_poll_events(), revents: 0 };

    let rc = unsafe { libc::poll(&mut pfd, 1, ms) };
    if rc < 0 {
        return Err(NetError::Io(std::io::Error::last_os_error()));
    }
    if rc == 0 {
        return Ok(PollFlags::empty());
    }
    Ok(PollFlags::from_revents(pfd.revents))
}
