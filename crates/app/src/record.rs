//! Mapping between domain records and configuration store sections.
//!
//! A rule is a `rule` section whose id is the rule id and whose options are
//! `name enabled mac ip days start end`. Unset targets are absent options,
//! never empty strings. Days are written space-separated and read back from
//! either that form or a list. Settings live in the `config` section.

use std::str::FromStr;

use parentctl_domain::error::{Field, ValidationError};
use parentctl_domain::id::RuleId;
use parentctl_domain::rule::{Rule, RuleDraft};
use parentctl_domain::settings::{Settings, SettingsDraft, format_flag, parse_flag};

use crate::ports::{ConfigSection, OptionValue};

/// A rule section read back from the store, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRule {
    pub id: RuleId,
    pub draft: RuleDraft,
    /// Problems found while decoding options that cannot be expressed in
    /// the draft, such as an unreadable flag.
    pub decode_errors: Vec<ValidationError>,
}

/// Decode a `rule` section.
///
/// Returns `None` when the section id is not a rule id, which happens for
/// records written by hand or by another tool.
#[must_use]
pub fn decode_rule(section: &ConfigSection) -> Option<StoredRule> {
    let id = RuleId::from_str(&section.id).ok()?;
    let mut decode_errors = Vec::new();

    let single = |name: &str| section.option(name).map(OptionValue::to_single);

    let enabled = match section.option(Field::Enabled.as_str()) {
        None => None,
        Some(value) => {
            let parsed = parse_flag(&value.to_single());
            if parsed.is_none() {
                decode_errors.push(ValidationError::InvalidFormat(Field::Enabled));
            }
            parsed
        }
    };

    let draft = RuleDraft {
        id: Some(id),
        name: single(Field::Name.as_str()),
        enabled,
        mac: single(Field::Mac.as_str()),
        ip: single(Field::Ip.as_str()),
        days: section.option(Field::Days.as_str()).map(OptionValue::to_list),
        start: single(Field::Start.as_str()),
        end: single(Field::End.as_str()),
    };

    Some(StoredRule {
        id,
        draft,
        decode_errors,
    })
}

/// The option writes that store `rule`. `None` means the option is unset.
#[must_use]
pub fn encode_rule(rule: &Rule) -> Vec<(Field, Option<OptionValue>)> {
    vec![
        (Field::Name, Some(rule.name.as_str().into())),
        (Field::Enabled, Some(format_flag(rule.enabled).into())),
        (Field::Mac, rule.mac.map(|mac| mac.to_string().into())),
        (Field::Ip, rule.ip.map(|ip| ip.to_string().into())),
        (Field::Days, Some(rule.days.to_string().into())),
        (Field::Start, Some(rule.start.to_string().into())),
        (Field::End, Some(rule.end.to_string().into())),
    ]
}

/// Decode the settings section, if present.
#[must_use]
pub fn decode_settings(section: Option<&ConfigSection>) -> SettingsDraft {
    SettingsDraft {
        debug: section
            .and_then(|s| s.option(Field::Debug.as_str()))
            .map(OptionValue::to_single),
    }
}

/// The option writes that store `settings`.
#[must_use]
pub fn encode_settings(settings: &Settings) -> Vec<(Field, OptionValue)> {
    vec![(Field::Debug, format_flag(settings.debug).into())]
}

/// Keep every field set in `incoming`, falling back to `stored` otherwise.
#[must_use]
pub fn merge_rule(stored: RuleDraft, incoming: RuleDraft) -> RuleDraft {
    RuleDraft {
        id: stored.id.or(incoming.id),
        name: incoming.name.or(stored.name),
        enabled: incoming.enabled.or(stored.enabled),
        mac: incoming.mac.or(stored.mac),
        ip: incoming.ip.or(stored.ip),
        days: incoming.days.or(stored.days),
        start: incoming.start.or(stored.start),
        end: incoming.end.or(stored.end),
    }
}
