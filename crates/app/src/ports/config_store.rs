//! Configuration store port: namespaced sections of named options with
//! staged changes and an explicit commit.

use std::collections::BTreeMap;
use std::future::Future;

use parentctl_domain::error::ParentalControlError;
use serde::{Deserialize, Serialize};

/// The value of one option: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Single(String),
    List(Vec<String>),
}

impl OptionValue {
    /// The value as a single string; lists are joined with spaces.
    #[must_use]
    pub fn to_single(&self) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::List(items) => items.join(" "),
        }
    }

    /// The value as a list; a single string is split on whitespace.
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Single(value) => value.split_whitespace().map(str::to_string).collect(),
            Self::List(items) => items.clone(),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// One record of a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSection {
    pub id: String,
    pub section_type: String,
    pub options: BTreeMap<String, OptionValue>,
}

impl ConfigSection {
    #[must_use]
    pub fn new(id: impl Into<String>, section_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            section_type: section_type.into(),
            options: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }
}

/// Persistent store of configuration sections.
///
/// Mutations are staged per namespace and only become visible to
/// [`load`](Self::load) after [`commit`](Self::commit). Concurrent writers
/// are resolved by the store, last writer wins.
pub trait ConfigStore {
    /// All committed sections of `namespace`, in creation order.
    fn load(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<Vec<ConfigSection>, ParentalControlError>> + Send;

    /// Read one option, staged changes included.
    fn get(
        &self,
        namespace: &str,
        section_id: &str,
        option: &str,
    ) -> impl Future<Output = Result<Option<OptionValue>, ParentalControlError>> + Send;

    /// Stage an option value, creating the section with `section_type` if
    /// it does not exist yet.
    fn set(
        &self,
        namespace: &str,
        section_type: &str,
        section_id: &str,
        option: &str,
        value: OptionValue,
    ) -> impl Future<Output = Result<(), ParentalControlError>> + Send;

    /// Stage the removal of one option.
    fn unset(
        &self,
        namespace: &str,
        section_id: &str,
        option: &str,
    ) -> impl Future<Output = Result<(), ParentalControlError>> + Send;

    /// Stage the removal of a whole section.
    fn remove(
        &self,
        namespace: &str,
        section_id: &str,
    ) -> impl Future<Output = Result<(), ParentalControlError>> + Send;

    /// Persist every staged change of `namespace` at once.
    fn commit(&self, namespace: &str)
    -> impl Future<Output = Result<(), ParentalControlError>> + Send;

    /// Drop every staged change of `namespace`.
    fn revert(&self, namespace: &str)
    -> impl Future<Output = Result<(), ParentalControlError>> + Send;
}
