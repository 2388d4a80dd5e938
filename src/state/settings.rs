//! User-adjustable configuration

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const MIN_SESSIONS_BEFORE_LONG_BREAK: u32 = 1;
pub const MAX_SESSIONS_BEFORE_LONG_BREAK: u32 = 10;
pub const DEFAULT_SESSIONS_BEFORE_LONG_BREAK: u32 = 4;

/// Long-break cadence and auto-progress switch.
///
/// `sessions_before_long_break` is only ever set through [`Settings::new`] or
/// [`Settings::apply`], so it always lies in `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    sessions_before_long_break: u32,
    auto_progress: bool,
}

/// Requested configuration change, as sent by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub sessions_before_long_break: u32,
    pub auto_progress: bool,
}

impl Settings {
    pub fn new(sessions_before_long_break: u32, auto_progress: bool) -> Result<Self, EngineError> {
        validate_sessions(sessions_before_long_break)?;
        Ok(Self {
            sessions_before_long_break,
            auto_progress,
        })
    }

    /// Build settings from persisted values, falling back to the default
    /// cadence when the stored one is out of range
    pub fn from_persisted(sessions_before_long_break: u32, auto_progress: bool) -> Self {
        Self::new(sessions_before_long_break, auto_progress).unwrap_or_else(|_| {
            tracing::warn!(
                "Stored sessionsBeforeLongBreak={} is out of range, using {}",
                sessions_before_long_break,
                DEFAULT_SESSIONS_BEFORE_LONG_BREAK
            );
            Self {
                sessions_before_long_break: DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
                auto_progress,
            }
        })
    }

    /// Validate and apply an update. On error `self` is left untouched.
    pub fn apply(&mut self, update: SettingsUpdate) -> Result<(), EngineError> {
        *self = Self::new(update.sessions_before_long_break, update.auto_progress)?;
        Ok(())
    }

    pub fn sessions_before_long_break(&self) -> u32 {
        self.sessions_before_long_break
    }

    pub fn auto_progress(&self) -> bool {
        self.auto_progress
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sessions_before_long_break: DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
            auto_progress: false,
        }
    }
}

pub fn validate_sessions(value: u32) -> Result<(), EngineError> {
    if (MIN_SESSIONS_BEFORE_LONG_BREAK..=MAX_SESSIONS_BEFORE_LONG_BREAK).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidSessionsBeforeLongBreak { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert!(Settings::new(1, false).is_ok());
        assert!(Settings::new(10, false).is_ok());
        assert!(Settings::new(0, false).is_err());
        assert!(Settings::new(11, false).is_err());
    }

    #[test]
    fn rejected_update_keeps_previous_values() {
        let mut settings = Settings::new(6, true).unwrap();
        let err = settings
            .apply(SettingsUpdate {
                sessions_before_long_break: 11,
                auto_progress: false,
            })
            .unwrap_err();

        assert!(matches!(err, EngineError::InvalidSessionsBeforeLongBreak { value: 11 }));
        assert_eq!(settings.sessions_before_long_break(), 6);
        assert!(settings.auto_progress());
    }

    #[test]
    fn persisted_out_of_range_falls_back_to_default() {
        let settings = Settings::from_persisted(42, true);
        assert_eq!(settings.sessions_before_long_break(), 4);
        assert!(settings.auto_progress());
    }
}
