//! Settings: the feature-wide singleton record.

use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationError, ValidationErrors};

/// Feature-wide flags shared with the enforcement daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Verbose logging in the enforcement daemon.
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { debug: true }
    }
}

/// Settings as submitted, with unset fields left as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDraft {
    /// Raw flag value, `"1"`/`"0"` as stored or any spelling accepted by
    /// [`parse_flag`].
    pub debug: Option<String>,
}

impl SettingsDraft {
    /// Fill unset fields from [`Settings::default`].
    #[must_use]
    pub fn with_defaults(self) -> Self {
        Self {
            debug: Some(
                self.debug
                    .unwrap_or_else(|| format_flag(Settings::default().debug).to_string()),
            ),
        }
    }
}

impl From<Settings> for SettingsDraft {
    fn from(settings: Settings) -> Self {
        Self {
            debug: Some(format_flag(settings.debug).to_string()),
        }
    }
}

/// Check a settings candidate.
///
/// An unset flag takes its default.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidFormat`] for a flag value that is not
/// a recognised boolean spelling.
pub fn validate_settings(candidate: &SettingsDraft) -> Result<Settings, ValidationErrors> {
    let debug = match candidate.debug.as_deref() {
        None => Settings::default().debug,
        Some(raw) => parse_flag(raw).ok_or(ValidationError::InvalidFormat(Field::Debug))?,
    };
    Ok(Settings { debug })
}

/// Parse a stored boolean option.
///
/// Accepts `1/true/yes/on` and `0/false/no/off`.
#[must_use]
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Encode a boolean the way the configuration store expects it.
#[must_use]
pub fn format_flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_debug_enabled() {
        assert!(Settings::default().debug);
        assert_eq!(
            SettingsDraft::default().with_defaults().debug.as_deref(),
            Some("1")
        );
    }

    #[test]
    fn should_parse_flag_spellings() {
        for raw in ["1", "true", "yes", "on", " 1 "] {
            assert_eq!(parse_flag(raw), Some(true), "{raw}");
        }
        for raw in ["0", "false", "no", "off"] {
            assert_eq!(parse_flag(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn should_validate_explicit_flag() {
        let draft = SettingsDraft {
            debug: Some("0".to_string()),
        };
        assert_eq!(validate_settings(&draft).unwrap(), Settings { debug: false });
    }

    #[test]
    fn should_reject_unrecognised_flag() {
        let draft = SettingsDraft {
            debug: Some("2".to_string()),
        };
        let errors = validate_settings(&draft).unwrap_err();
        assert!(errors.contains(ValidationError::InvalidFormat(Field::Debug)));
    }

    #[test]
    fn should_roundtrip_settings_through_draft() {
        let settings = Settings { debug: false };
        assert_eq!(
            validate_settings(&SettingsDraft::from(settings)).unwrap(),
            settings
        );
    }
}
