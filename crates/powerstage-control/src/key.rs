//! Start/stop key debouncer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Key debounce settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KeyConfig {
    /// Ticks the key must be held before the latch toggles (150 ms).
    pub press_ticks: u16,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self { press_ticks: 30 }
    }
}

/// Turns a raw key level into a may-run latch.
///
/// Holding the key for more than `press_ticks` ticks toggles the latch.
/// Holding it longer toggles again every `press_ticks + 1` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyToggle {
    config: KeyConfig,
    held: u16,
    latched: bool,
}

impl KeyToggle {
    /// Creates a released key with the latch off.
    #[must_use]
    pub const fn new(config: KeyConfig) -> Self {
        Self {
            config,
            held: 0,
            latched: false,
        }
    }

    /// Feeds one tick of key level and returns the latch.
    pub fn update(&mut self, pressed: bool) -> bool {
        if pressed {
            self.held = self.held.saturating_add(1);
            if self.held > self.config.press_ticks {
                self.held = 0;
                self.latched = !self.latched;
            }
        } else {
            self.held = 0;
        }
        self.latched
    }

    /// Current latch.
    #[must_use]
    pub const fn is_latched(&self) -> bool {
        self.latched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_after_31_held_ticks() {
        let mut key = KeyToggle::new(KeyConfig::default());
        for _ in 0..30 {
            assert!(!key.update(true));
        }
        assert!(key.update(true));
        assert!(key.update(false));
    }

    #[test]
    fn release_restarts_the_count() {
        let mut key = KeyToggle::new(KeyConfig::default());
        for _ in 0..20 {
            key.update(true);
        }
        key.update(false);
        for _ in 0..30 {
            key.update(true);
        }
        assert!(!key.is_latched());
    }
}
