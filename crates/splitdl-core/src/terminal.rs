//! Terminal capability detection for the progress line.

use std::io::IsTerminal;

/// Width assumed when it cannot be queried.
pub const DEFAULT_WIDTH: usize = 80;

pub fn stdout_is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Columns of the terminal attached to stdout, if any.
#[cfg(unix)]
pub fn stdout_width() -> Option<usize> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let r = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    if r == 0 && ws.ws_col > 0 {
        Some(ws.ws_col as usize)
    } else {
        None
    }
}

#[cfg(not(unix))]
pub fn stdout_width() -> Option<usize> {
    None
}
