//! Screen routing with a one-shot payload handed to the next screen.
//!
//! The payload only lives in memory. It is not part of the path and is gone
//! once the receiving screen took it.

use super::image::ImageHandle;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Home,
    Filter,
    Output,
}

impl Screen {
    pub fn path(self) -> &'static str {
        match self {
            Screen::Home => "/",
            Screen::Filter => "/filter",
            Screen::Output => "/output",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "/" | "" => Ok(Screen::Home),
            "/filter" => Ok(Screen::Filter),
            "/output" => Ok(Screen::Output),
            other => Err(format!("unknown screen `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationState {
    Image(ImageHandle),
    /// Sent by "back": the receiving screen starts from scratch.
    Reset,
}

#[derive(Debug, Default)]
pub struct Navigator {
    current: Screen,
    pending: Option<NavigationState>,
}

impl Navigator {
    pub fn current(&self) -> Screen {
        self.current
    }

    /// Any payload the previous screen did not take is dropped.
    pub fn navigate(&mut self, screen: Screen, state: Option<NavigationState>) {
        log::debug!("navigate {} -> {}", self.current, screen);
        self.current = screen;
        self.pending = state;
    }

    pub fn take_state(&mut self) -> Option<NavigationState> {
        self.pending.take()
    }
}
