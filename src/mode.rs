//! The assembled/scattered mode flag.
//!
//! The scene owns one [`ModeController`] and reads it once per frame, passing
//! the resulting [`Mode`] by value to every component. Toggling happens
//! between frames, so all components always agree on the mode.

/// Which formation components are heading toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Tree formation.
    #[default]
    Assembled,
    /// Scatter formation.
    Scattered,
}

impl Mode {
    #[inline]
    pub fn is_assembled(self) -> bool {
        matches!(self, Mode::Assembled)
    }

    /// The other mode.
    pub fn flipped(self) -> Self {
        match self {
            Mode::Assembled => Mode::Scattered,
            Mode::Scattered => Mode::Assembled,
        }
    }

    /// Pick between two values by mode.
    #[inline]
    pub fn select<T>(self, assembled: T, scattered: T) -> T {
        match self {
            Mode::Assembled => assembled,
            Mode::Scattered => scattered,
        }
    }
}

impl From<bool> for Mode {
    /// `true` is assembled.
    fn from(assembled: bool) -> Self {
        if assembled {
            Mode::Assembled
        } else {
            Mode::Scattered
        }
    }
}

/// Holds the single mode flag.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: Mode,
    toggles: u64,
}

impl ModeController {
    /// Start in the given mode.
    pub fn new(mode: Mode) -> Self {
        Self { mode, toggles: 0 }
    }

    /// Flip the mode and return the new value.
    pub fn toggle(&mut self) -> Mode {
        self.mode = self.mode.flipped();
        self.toggles += 1;
        log::info!("mode -> {:?} (toggle #{})", self.mode, self.toggles);
        self.mode
    }

    #[inline]
    pub fn current(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn is_assembled(&self) -> bool {
        self.mode.is_assembled()
    }

    /// Number of toggles since construction.
    pub fn toggle_count(&self) -> u64 {
        self.toggles
    }
}
