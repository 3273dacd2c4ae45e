//! A rule is one access-control entry: who, on which days, and when.
//!
//! Submitted rows arrive as a [`RuleDraft`] of raw strings. A draft is
//! completed with [`apply_defaults`] and then turned into a typed [`Rule`]
//! by [`validate_rule`], which reports every violation at once.

mod address;
mod schedule;
mod weekday;

pub use address::{InvalidMacAddr, MacAddr};
pub use schedule::{InvalidTimeOfDay, TimeOfDay, TimeWindow};
pub use weekday::{UnknownWeekday, Weekday, WeekdaySet};

use std::fmt;
use std::net::Ipv4Addr;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationError, ValidationErrors};
use crate::id::RuleId;
use crate::time::LocalMoment;

/// Default start of the blocking window.
pub const DEFAULT_START: &str = "21:00";
/// Default end of the blocking window.
pub const DEFAULT_END: &str = "07:00";

/// A validated access-control rule.
///
/// Deserializing goes through [`validate_rule`], so a `Rule` read from JSON
/// holds the same invariants as one built by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleDraft")]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub enabled: bool,
    pub mac: Option<MacAddr>,
    pub ip: Option<Ipv4Addr>,
    pub days: WeekdaySet,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// What the status column shows for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    /// The rule is switched off.
    Disabled,
    /// The window is open right now.
    Active,
    /// Enabled, but outside its window.
    Idle,
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::Active => "active",
            Self::Idle => "idle",
        })
    }
}

impl Rule {
    /// Create a builder for constructing a [`Rule`].
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    #[must_use]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }

    /// Compute the status at a local wall-clock moment.
    ///
    /// The part of a midnight-spanning window after `00:00` belongs to the
    /// day the window started on.
    #[must_use]
    pub fn status_at(&self, moment: LocalMoment) -> RuleStatus {
        if !self.enabled {
            return RuleStatus::Disabled;
        }
        let day = Weekday::from(moment.weekday());
        let time = TimeOfDay::from_naive(moment.time());
        let window = self.window();
        let open = (self.days.contains(day) && window.covers_same_day(time))
            || (self.days.contains(day.previous()) && window.covers_carry_over(time));
        if open {
            RuleStatus::Active
        } else {
            RuleStatus::Idle
        }
    }
}

/// A possibly incomplete rule as submitted by a form or read from the
/// configuration store. Values are kept verbatim until validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleDraft {
    pub id: Option<RuleId>,
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub mac: Option<String>,
    pub ip: Option<String>,
    pub days: Option<Vec<String>>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RuleDraft {
    /// Fill unset fields with the defaults. See [`apply_defaults`].
    #[must_use]
    pub fn with_defaults(self) -> Self {
        apply_defaults(self)
    }
}

impl From<&Rule> for RuleDraft {
    fn from(rule: &Rule) -> Self {
        Self {
            id: Some(rule.id),
            name: Some(rule.name.clone()),
            enabled: Some(rule.enabled),
            mac: rule.mac.map(|mac| mac.to_string()),
            ip: rule.ip.map(|ip| ip.to_string()),
            days: Some(rule.days.tokens()),
            start: Some(rule.start.to_string()),
            end: Some(rule.end.to_string()),
        }
    }
}

impl TryFrom<RuleDraft> for Rule {
    type Error = ValidationErrors;

    fn try_from(draft: RuleDraft) -> Result<Self, Self::Error> {
        validate_rule(&draft)
    }
}

/// Complete a partial rule with the defaults of a freshly added row.
///
/// Unset fields get: a new id, `enabled = true`, `days = mon..fri`,
/// `start = 21:00`, `end = 07:00`. `name`, `mac` and `ip` have no default.
/// Fields that are already set are left untouched.
#[must_use]
pub fn apply_defaults(partial: RuleDraft) -> RuleDraft {
    RuleDraft {
        id: Some(partial.id.unwrap_or_default()),
        name: partial.name,
        enabled: Some(partial.enabled.unwrap_or(true)),
        mac: partial.mac,
        ip: partial.ip,
        days: Some(partial.days.unwrap_or_else(|| WeekdaySet::workdays().tokens())),
        start: Some(partial.start.unwrap_or_else(|| DEFAULT_START.to_string())),
        end: Some(partial.end.unwrap_or_else(|| DEFAULT_END.to_string())),
    }
}

/// Check every field of `candidate` and build the typed [`Rule`].
///
/// Violations are collected rather than short-circuited. Blank `mac`/`ip`
/// mean "not set". A window whose end precedes its start is valid and
/// runs past midnight. A candidate without an id gets a fresh one.
///
/// # Errors
///
/// Returns [`ValidationErrors`] listing each failing field:
/// [`ValidationError::EmptyField`] for a blank name, no days or an unset
/// time, and [`ValidationError::InvalidFormat`] for malformed addresses,
/// foreign weekday tokens or times outside `HH:MM`.
pub fn validate_rule(candidate: &RuleDraft) -> Result<Rule, ValidationErrors> {
    let mut errors = Vec::new();

    let name = candidate.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        errors.push(ValidationError::EmptyField(Field::Name));
    }

    let mac = match non_blank(candidate.mac.as_deref()) {
        None => None,
        Some(raw) => raw
            .parse::<MacAddr>()
            .map_err(|_| errors.push(ValidationError::InvalidFormat(Field::Mac)))
            .ok(),
    };

    let ip = match non_blank(candidate.ip.as_deref()) {
        None => None,
        Some(raw) => raw
            .parse::<Ipv4Addr>()
            .map_err(|_| errors.push(ValidationError::InvalidFormat(Field::Ip)))
            .ok(),
    };

    let days = parse_days(candidate.days.as_deref().unwrap_or_default(), &mut errors);
    let start = parse_time(candidate.start.as_deref(), Field::Start, &mut errors);
    let end = parse_time(candidate.end.as_deref(), Field::End, &mut errors);

    if let Some(errors) = ValidationErrors::from_vec(errors) {
        return Err(errors);
    }

    match (start, end) {
        (Some(start), Some(end)) => Ok(Rule {
            id: candidate.id.unwrap_or_default(),
            name: name.to_string(),
            enabled: candidate.enabled.unwrap_or(true),
            mac,
            ip,
            days,
            start,
            end,
        }),
        // a missing time always pushes an error above
        _ => Err(ValidationError::EmptyField(Field::Start).into()),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_days(raw: &[String], errors: &mut Vec<ValidationError>) -> WeekdaySet {
    let mut days = Vec::new();
    let mut foreign = false;
    for token in raw.iter().flat_map(|item| item.split_whitespace()) {
        match token.parse::<Weekday>() {
            Ok(day) => days.push(day),
            Err(_) => foreign = true,
        }
    }
    if foreign {
        errors.push(ValidationError::InvalidFormat(Field::Days));
    } else if days.is_empty() {
        errors.push(ValidationError::EmptyField(Field::Days));
    }
    days.into_iter().collect()
}

fn parse_time(
    raw: Option<&str>,
    field: Field,
    errors: &mut Vec<ValidationError>,
) -> Option<TimeOfDay> {
    match raw {
        None => {
            errors.push(ValidationError::EmptyField(field));
            None
        }
        Some(value) if value.trim().is_empty() => {
            errors.push(ValidationError::EmptyField(field));
            None
        }
        Some(value) => value
            .parse::<TimeOfDay>()
            .map_err(|_| errors.push(ValidationError::InvalidFormat(field)))
            .ok(),
    }
}

/// Step-by-step builder for [`Rule`].
///
/// Unset fields take the defaults of [`apply_defaults`].
#[derive(Debug, Default)]
pub struct RuleBuilder {
    draft: RuleDraft,
}

impl RuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.draft.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.draft.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.draft.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn mac(mut self, mac: impl Into<String>) -> Self {
        self.draft.mac = Some(mac.into());
        self
    }

    #[must_use]
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.draft.ip = Some(ip.into());
        self
    }

    #[must_use]
    pub fn days<I, S>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.draft.days = Some(days.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn window(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.draft.start = Some(start.into());
        self.draft.end = Some(end.into());
        self
    }

    /// Consume the builder, apply defaults, validate, and return a [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] when any field is invalid.
    pub fn build(self) -> Result<Rule, ValidationErrors> {
        validate_rule(&apply_defaults(self.draft))
    }
}
