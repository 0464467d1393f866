// src/watch/state.rs

use std::fmt;

/// Where the background poll loop currently is.
///
/// `Idle -> Polling -> Reading -> Delivering -> Polling ...`, and `Closed`
/// once a close request has been observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Polling,
    Reading,
    Delivering,
    Closed,
}

impl WatchState {
    pub fn is_closed(self) -> bool {
        self == WatchState::Closed
    }
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchState::Idle => "idle",
            WatchState::Polling => "polling",
            WatchState::Reading => "reading",
            WatchState::Delivering => "delivering",
            WatchState::Closed => "closed",
        };
        f.write_str(s)
    }
}
