//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ParentalControlError`] via `From`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A form field that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Enabled,
    Mac,
    Ip,
    Days,
    Start,
    End,
    Debug,
}

impl Field {
    /// The option name used in the configuration store and the form schema.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Enabled => "enabled",
            Self::Mac => "mac",
            Self::Ip => "ip",
            Self::Days => "days",
            Self::Start => "start",
            Self::End => "end",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level problem found while validating a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("field `{0}` must not be empty")]
    EmptyField(Field),

    /// A field value does not match its expected syntax.
    #[error("field `{0}` has an invalid format")]
    InvalidFormat(Field),

    /// A selected value is not part of the field's suggestion list.
    ///
    /// Free-text values are allowed, so this is only ever a warning.
    #[error("field `{0}` is not one of the suggested values")]
    UnknownOption(Field),
}

impl ValidationError {
    /// The field the error refers to.
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            Self::EmptyField(field) | Self::InvalidFormat(field) | Self::UnknownOption(field) => {
                *field
            }
        }
    }

    /// Soft errors are reported to the caller but never block a commit.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::UnknownOption(_))
    }
}

/// Every hard violation found in one record, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Wrap the collected errors, returning `None` when there are none.
    #[must_use]
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// Borrow the individual errors.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Whether `error` is among the reported errors.
    #[must_use]
    pub fn contains(&self, error: ValidationError) -> bool {
        self.0.contains(&error)
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }

    /// Combine two lists, keeping field order.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self.0.sort_by_key(ValidationError::field);
        self
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            error.fmt(f)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

/// Validation failures of one row in a batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowErrors {
    /// Position of the rejected row in the submitted list.
    pub row: usize,
    pub errors: ValidationErrors,
}

/// A looked-up record does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Base error type for the whole workspace.
#[derive(Debug, thiserror::Error)]
pub enum ParentalControlError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{} submitted row(s) rejected", .0.len())]
    InvalidSubmission(Vec<RowErrors>),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("host hint lookup failed")]
    HostHints(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<ValidationError> for ParentalControlError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_field_names_as_store_options() {
        assert_eq!(Field::Mac.to_string(), "mac");
        assert_eq!(Field::Debug.to_string(), "debug");
    }

    #[test]
    fn should_flag_unknown_option_as_warning_only() {
        assert!(ValidationError::UnknownOption(Field::Ip).is_warning());
        assert!(!ValidationError::InvalidFormat(Field::Ip).is_warning());
        assert!(!ValidationError::EmptyField(Field::Name).is_warning());
    }

    #[test]
    fn should_return_none_when_no_errors_collected() {
        assert!(ValidationErrors::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn should_join_errors_in_display() {
        let errors = ValidationErrors::from_vec(vec![
            ValidationError::EmptyField(Field::Name),
            ValidationError::InvalidFormat(Field::Start),
        ])
        .unwrap();
        assert_eq!(
            errors.to_string(),
            "field `name` must not be empty; field `start` has an invalid format"
        );
    }

    #[test]
    fn should_keep_field_order_when_merging() {
        let decoded = ValidationErrors::from(ValidationError::InvalidFormat(Field::Enabled));
        let validated = ValidationErrors::from_vec(vec![
            ValidationError::EmptyField(Field::Name),
            ValidationError::InvalidFormat(Field::End),
        ])
        .unwrap();
        assert_eq!(
            decoded.merge(validated).into_inner(),
            vec![
                ValidationError::EmptyField(Field::Name),
                ValidationError::InvalidFormat(Field::Enabled),
                ValidationError::InvalidFormat(Field::End),
            ]
        );
    }

    #[test]
    fn should_serialize_error_with_kind_and_field() {
        let json = serde_json::to_value(ValidationError::InvalidFormat(Field::Days)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "invalid_format", "field": "days"})
        );
    }

    #[test]
    fn should_convert_single_validation_error_into_workspace_error() {
        let err: ParentalControlError = ValidationError::EmptyField(Field::Name).into();
        assert!(matches!(err, ParentalControlError::Validation(ref e) if e.errors().len() == 1));
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Rule",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Rule not found: abc");
    }
}
