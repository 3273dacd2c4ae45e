//! Host hints: directory-supplied MAC → name/IPv4 associations, used only
//! to suggest targets in the MAC and IP fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationError};
use crate::rule::Rule;

/// What the directory knows about one client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
}

/// Hints keyed by MAC address, iterated in key order.
pub type HostHints = BTreeMap<String, HostHint>;

/// One entry of a field's suggestion list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOption {
    /// Value written into the field when selected.
    pub value: String,
    /// Text shown next to the value.
    pub label: String,
}

impl TargetOption {
    fn new(value: &str, detail: &str) -> Self {
        Self {
            value: value.to_string(),
            label: format!("{value} ({detail})"),
        }
    }
}

/// Suggestions for the MAC and IP fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOptions {
    pub mac_options: Vec<TargetOption>,
    pub ip_options: Vec<TargetOption>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Project host hints into MAC and IP suggestion lists.
///
/// Every hint yields a MAC option labelled with its name, else its IPv4,
/// else nothing. Hints with an IPv4 also yield an IP option labelled with
/// the name, else the MAC. An empty hint set gives empty lists.
#[must_use]
pub fn suggest_targets(hints: &HostHints) -> TargetOptions {
    let mut options = TargetOptions::default();
    for (mac, hint) in hints {
        let name = present(hint.name.as_ref());
        let ipv4 = present(hint.ipv4.as_ref());

        options
            .mac_options
            .push(TargetOption::new(mac, name.or(ipv4).unwrap_or_default()));

        if let Some(ipv4) = ipv4 {
            options
                .ip_options
                .push(TargetOption::new(ipv4, name.unwrap_or(mac.as_str())));
        }
    }
    options
}

/// Soft warnings for rule targets that are not among the suggestions.
///
/// A field is only checked when its suggestion list is non-empty, so an
/// unreachable directory never produces warnings.
#[must_use]
pub fn check_options(rule: &Rule, options: &TargetOptions) -> Vec<ValidationError> {
    let mut warnings = Vec::new();
    if let Some(mac) = rule.mac {
        let mac = mac.to_string();
        if !options.mac_options.is_empty()
            && !options
                .mac_options
                .iter()
                .any(|opt| opt.value.eq_ignore_ascii_case(&mac))
        {
            warnings.push(ValidationError::UnknownOption(Field::Mac));
        }
    }
    if let Some(ip) = rule.ip {
        let ip = ip.to_string();
        if !options.ip_options.is_empty() && !options.ip_options.iter().any(|opt| opt.value == ip)
        {
            warnings.push(ValidationError::UnknownOption(Field::Ip));
        }
    }
    warnings
}
