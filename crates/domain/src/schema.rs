//! Form schema: an immutable, declarative description of the settings
//! form, consumed by a separate rendering layer.
//!
//! Schemas are plain values assembled with consuming builder methods; no
//! section object is mutated after it has been handed out.

use serde::{Deserialize, Serialize};

use crate::host_hint::{TargetOption, TargetOptions};
use crate::rule::{DEFAULT_END, DEFAULT_START, Weekday, WeekdaySet};
use crate::settings::{Settings, format_flag, parse_flag};

/// Configuration namespace holding every record of the feature.
pub const NAMESPACE: &str = "parentalcontrol";
/// Section type of rule records.
pub const RULE_SECTION: &str = "rule";
/// Section type of the settings singleton.
pub const SETTINGS_SECTION: &str = "parentalcontrol";
/// Section id of the settings singleton.
pub const SETTINGS_ID: &str = "config";
/// Name of the computed status column of the rule grid.
pub const STATUS_FIELD: &str = "status";

/// How a field is edited and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text, optionally with suggestions.
    Text,
    /// Boolean checkbox.
    Flag,
    /// Several values picked from a fixed option list.
    MultiSelect,
    /// Read-only value computed from other fields.
    ComputedDisplay,
}

/// A field value in its editing representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl FieldKind {
    /// Render `value` the way a field of this kind displays it.
    ///
    /// Flags become `1`/`0`, lists are space separated.
    #[must_use]
    pub fn format(self, value: &FieldValue) -> String {
        match (self, value) {
            (Self::Flag, FieldValue::Flag(flag)) => format_flag(*flag).to_string(),
            (Self::Flag, FieldValue::Text(raw)) => parse_flag(raw)
                .map_or_else(|| raw.clone(), |flag| format_flag(flag).to_string()),
            (_, FieldValue::Flag(flag)) => format_flag(*flag).to_string(),
            (_, FieldValue::Text(text)) => text.clone(),
            (_, FieldValue::List(items)) => items.join(" "),
        }
    }
}

/// Syntax check a renderer applies before submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Datatype {
    MacAddr,
    IpAddr,
    Time,
}

/// Whether and how a renderer shows a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Editable,
    /// Shown in the grid but never submitted.
    DisplayOnly,
    /// Kept out of the grid entirely.
    Hidden,
}

/// One selectable value with its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl From<TargetOption> for Choice {
    fn from(option: TargetOption) -> Self {
        Self {
            value: option.value,
            label: option.label,
        }
    }
}

/// Description of one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Choice>,
    /// A blank value is rejected instead of removing the option.
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Datatype>,
    pub visibility: Visibility,
}

impl FieldDescriptor {
    fn new(kind: FieldKind, name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            default: None,
            options: Vec::new(),
            required: false,
            placeholder: None,
            datatype: None,
            visibility: Visibility::Editable,
        }
    }

    #[must_use]
    pub fn text(name: &str, label: &str) -> Self {
        Self::new(FieldKind::Text, name, label)
    }

    #[must_use]
    pub fn flag(name: &str, label: &str) -> Self {
        Self::new(FieldKind::Flag, name, label)
    }

    #[must_use]
    pub fn multi_select(name: &str, label: &str) -> Self {
        Self::new(FieldKind::MultiSelect, name, label)
    }

    /// A computed, display-only field.
    #[must_use]
    pub fn computed(name: &str, label: &str) -> Self {
        Self::new(FieldKind::ComputedDisplay, name, label).visibility(Visibility::DisplayOnly)
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    #[must_use]
    pub fn datatype(mut self, datatype: Datatype) -> Self {
        self.datatype = Some(datatype);
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn choice(mut self, value: &str, label: &str) -> Self {
        self.options.push(Choice {
            value: value.to_string(),
            label: label.to_string(),
        });
        self
    }

    /// Replace the option list.
    #[must_use]
    pub fn choices(mut self, options: impl IntoIterator<Item = Choice>) -> Self {
        self.options = options.into_iter().collect();
        self
    }

    /// Render a value with this field's [`FieldKind::format`].
    #[must_use]
    pub fn format(&self, value: &FieldValue) -> String {
        self.kind.format(value)
    }
}

/// How the records of a section are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionLayout {
    /// One row per record, with add/remove controls when `add_remove`.
    Grid { add_remove: bool },
    /// A single record with a fixed id.
    Named { id: String },
}

/// Description of one form section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    pub section_type: String,
    pub title: String,
    pub layout: SectionLayout,
    pub fields: Vec<FieldDescriptor>,
}

impl SectionDescriptor {
    #[must_use]
    pub fn grid(section_type: &str, title: &str) -> Self {
        Self {
            section_type: section_type.to_string(),
            title: title.to_string(),
            layout: SectionLayout::Grid { add_remove: true },
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn named(section_type: &str, id: &str, title: &str) -> Self {
        Self {
            section_type: section_type.to_string(),
            title: title.to_string(),
            layout: SectionLayout::Named { id: id.to_string() },
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields a renderer shows, skipping hidden ones.
    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(|field| field.visibility != Visibility::Hidden)
    }

    /// Fields whose values are submitted back.
    pub fn editable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(|field| field.visibility == Visibility::Editable)
    }
}

/// The whole form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    pub namespace: String,
    pub title: String,
    pub description: String,
    pub sections: Vec<SectionDescriptor>,
}

impl FormSchema {
    /// Create a builder for a form over `namespace`.
    #[must_use]
    pub fn builder(namespace: &str) -> FormSchemaBuilder {
        FormSchemaBuilder {
            namespace: namespace.to_string(),
            title: String::new(),
            description: String::new(),
            sections: Vec::new(),
        }
    }

    #[must_use]
    pub fn section(&self, section_type: &str) -> Option<&SectionDescriptor> {
        self.sections
            .iter()
            .find(|section| section.section_type == section_type)
    }

    #[must_use]
    pub fn field(&self, section_type: &str, name: &str) -> Option<&FieldDescriptor> {
        self.section(section_type)?.find_field(name)
    }

    /// Return a copy whose rule MAC and IP fields suggest `targets`.
    ///
    /// Stored values are not touched; only the option lists change.
    #[must_use]
    pub fn with_target_options(mut self, targets: &TargetOptions) -> Self {
        for section in &mut self.sections {
            if section.section_type != RULE_SECTION {
                continue;
            }
            for field in &mut section.fields {
                let options = match field.name.as_str() {
                    "mac" => &targets.mac_options,
                    "ip" => &targets.ip_options,
                    _ => continue,
                };
                field.options = options.iter().cloned().map(Choice::from).collect();
            }
        }
        self
    }
}

/// Step-by-step builder for [`FormSchema`].
#[derive(Debug)]
pub struct FormSchemaBuilder {
    namespace: String,
    title: String,
    description: String,
    sections: Vec<SectionDescriptor>,
}

impl FormSchemaBuilder {
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn section(mut self, section: SectionDescriptor) -> Self {
        self.sections.push(section);
        self
    }

    #[must_use]
    pub fn build(self) -> FormSchema {
        FormSchema {
            namespace: self.namespace,
            title: self.title,
            description: self.description,
            sections: self.sections,
        }
    }
}

/// The parental control form: the rule grid, an informational notice and
/// the settings singleton.
///
/// `version` is shown in the form title.
#[must_use]
pub fn parental_control_schema(version: &str) -> FormSchema {
    let weekdays = Weekday::ALL
        .into_iter()
        .fold(FieldDescriptor::multi_select("days", "Weekdays"), |field, day| {
            field.choice(day.as_str(), day.as_str())
        })
        .default_value(FieldValue::List(WeekdaySet::workdays().tokens()))
        .required();

    let rules = SectionDescriptor::grid(RULE_SECTION, "Rules")
        .field(FieldDescriptor::text("name", "Name").required())
        .field(
            FieldDescriptor::flag("enabled", "Enabled")
                .default_value(FieldValue::Flag(true))
                .required(),
        )
        .field(FieldDescriptor::computed(STATUS_FIELD, "Status"))
        .field(FieldDescriptor::text("mac", "MAC Address").datatype(Datatype::MacAddr))
        .field(FieldDescriptor::text("ip", "IP Address").datatype(Datatype::IpAddr))
        .field(weekdays)
        .field(time_field("start", "Start", DEFAULT_START))
        .field(time_field("end", "End", DEFAULT_END));

    let info = SectionDescriptor::named("info", "_info", "Information").field(
        FieldDescriptor::computed("_notice", "").default_value(FieldValue::Text(
            "Rules are applied automatically when the configuration is saved".to_string(),
        )),
    );

    let settings = SectionDescriptor::named(SETTINGS_SECTION, SETTINGS_ID, "General settings")
        .field(
            FieldDescriptor::flag("debug", "Enable debugging")
                .default_value(FieldValue::Flag(Settings::default().debug))
                .required(),
        );

    FormSchema::builder(NAMESPACE)
        .title(format!("Parental Control {version}"))
        .description("Configure access rules by MAC/IP")
        .section(rules)
        .section(info)
        .section(settings)
        .build()
}

fn time_field(name: &str, label: &str, default: &str) -> FieldDescriptor {
    FieldDescriptor::text(name, label)
        .datatype(Datatype::Time)
        .placeholder("HH:MM")
        .default_value(FieldValue::Text(default.to_string()))
        .required()
}
