//! `SQLite` implementation of [`ConfigStore`].
//!
//! Committed sections live in `config_sections` and `config_options`, with
//! option values stored as JSON. Changes are staged in memory per namespace
//! and written in a single transaction on commit.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use parentctl_app::ports::{ConfigSection, ConfigStore, OptionValue};
use parentctl_domain::error::ParentalControlError;

use crate::error::StorageError;

/// Wrapper for converting option rows into `(section_id, name, value)`.
struct OptionRow {
    section_id: String,
    name: String,
    value: OptionValue,
}

impl<'r> FromRow<'r, SqliteRow> for OptionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let section_id: String = row.try_get("section_id")?;
        let name: String = row.try_get("name")?;
        let raw: String = row.try_get("value")?;

        let value = serde_json::from_str(&raw).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self {
            section_id,
            name,
            value,
        })
    }
}

const SELECT_SECTIONS: &str =
    "SELECT id, section_type FROM config_sections WHERE namespace = ? ORDER BY position";
const SELECT_OPTIONS: &str =
    "SELECT section_id, name, value FROM config_options WHERE namespace = ? ORDER BY rowid";
const SELECT_OPTION: &str =
    "SELECT value FROM config_options WHERE namespace = ? AND section_id = ? AND name = ?";
const INSERT_SECTION: &str = "INSERT INTO config_sections (namespace, id, section_type, position) \
     SELECT ?, ?, ?, COALESCE(MAX(position), -1) + 1 FROM config_sections WHERE namespace = ? \
     ON CONFLICT (namespace, id) DO NOTHING";
const UPSERT_OPTION: &str = "INSERT INTO config_options (namespace, section_id, name, value) \
     VALUES (?, ?, ?, ?) \
     ON CONFLICT (namespace, section_id, name) DO UPDATE SET value = excluded.value";
const DELETE_OPTION: &str =
    "DELETE FROM config_options WHERE namespace = ? AND section_id = ? AND name = ?";
const DELETE_SECTION_OPTIONS: &str =
    "DELETE FROM config_options WHERE namespace = ? AND section_id = ?";
const DELETE_SECTION: &str = "DELETE FROM config_sections WHERE namespace = ? AND id = ?";

/// A mutation waiting for the next commit.
#[derive(Debug, Clone)]
enum Change {
    Set {
        section_type: String,
        section_id: String,
        option: String,
        value: OptionValue,
    },
    Unset {
        section_id: String,
        option: String,
    },
    Remove {
        section_id: String,
    },
}

impl Change {
    fn section_id(&self) -> &str {
        match self {
            Self::Set { section_id, .. }
            | Self::Unset { section_id, .. }
            | Self::Remove { section_id } => section_id,
        }
    }
}

/// `SQLite`-backed configuration store.
#[derive(Clone)]
pub struct SqliteConfigStore {
    pool: SqlitePool,
    staged: Arc<Mutex<HashMap<String, Vec<Change>>>>,
}

impl SqliteConfigStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            staged: Arc::default(),
        }
    }

    fn stage(&self, namespace: &str, change: Change) {
        let mut staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        staged.entry(namespace.to_string()).or_default().push(change);
    }

    fn staged_for(&self, namespace: &str) -> Vec<Change> {
        let staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        staged.get(namespace).cloned().unwrap_or_default()
    }

    /// Take every staged change of `namespace`.
    fn take_staged(&self, namespace: &str) -> Vec<Change> {
        let mut staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        staged.remove(namespace).unwrap_or_default()
    }

    /// Put back changes whose commit failed, ahead of anything staged since.
    fn restore_staged(&self, namespace: &str, mut changes: Vec<Change>) {
        let mut staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = staged.entry(namespace.to_string()).or_default();
        changes.append(entry);
        *entry = changes;
    }

    async fn apply(&self, namespace: &str, changes: &[Change]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        for change in changes {
            match change {
                Change::Set {
                    section_type,
                    section_id,
                    option,
                    value,
                } => {
                    sqlx::query(INSERT_SECTION)
                        .bind(namespace)
                        .bind(section_id)
                        .bind(section_type)
                        .bind(namespace)
                        .execute(&mut *tx)
                        .await?;
                    sqlx::query(UPSERT_OPTION)
                        .bind(namespace)
                        .bind(section_id)
                        .bind(option)
                        .bind(serde_json::to_string(value)?)
                        .execute(&mut *tx)
                        .await?;
                }
                Change::Unset { section_id, option } => {
                    sqlx::query(DELETE_OPTION)
                        .bind(namespace)
                        .bind(section_id)
                        .bind(option)
                        .execute(&mut *tx)
                        .await?;
                }
                Change::Remove { section_id } => {
                    sqlx::query(DELETE_SECTION_OPTIONS)
                        .bind(namespace)
                        .bind(section_id)
                        .execute(&mut *tx)
                        .await?;
                    sqlx::query(DELETE_SECTION)
                        .bind(namespace)
                        .bind(section_id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

impl ConfigStore for SqliteConfigStore {
    #[tracing::instrument(skip(self))]
    async fn load(&self, namespace: &str) -> Result<Vec<ConfigSection>, ParentalControlError> {
        let sections: Vec<(String, String)> = sqlx::query_as(SELECT_SECTIONS)
            .bind(namespace)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        let options: Vec<OptionRow> = sqlx::query_as(SELECT_OPTIONS)
            .bind(namespace)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let mut by_section: HashMap<String, BTreeMap<String, OptionValue>> = HashMap::new();
        for row in options {
            by_section
                .entry(row.section_id)
                .or_default()
                .insert(row.name, row.value);
        }

        Ok(sections
            .into_iter()
            .map(|(id, section_type)| ConfigSection {
                options: by_section.remove(&id).unwrap_or_default(),
                id,
                section_type,
            })
            .collect())
    }

    async fn get(
        &self,
        namespace: &str,
        section_id: &str,
        option: &str,
    ) -> Result<Option<OptionValue>, ParentalControlError> {
        let raw: Option<(String,)> = sqlx::query_as(SELECT_OPTION)
            .bind(namespace)
            .bind(section_id)
            .bind(option)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        let mut value = match raw {
            Some((raw,)) => Some(serde_json::from_str(&raw).map_err(StorageError::from)?),
            None => None,
        };

        for change in self.staged_for(namespace) {
            if change.section_id() != section_id {
                continue;
            }
            match change {
                Change::Set {
                    option: name,
                    value: staged,
                    ..
                } if name == option => value = Some(staged),
                Change::Unset { option: name, .. } if name == option => value = None,
                Change::Remove { .. } => value = None,
                _ => {}
            }
        }

        Ok(value)
    }

    async fn set(
        &self,
        namespace: &str,
        section_type: &str,
        section_id: &str,
        option: &str,
        value: OptionValue,
    ) -> Result<(), ParentalControlError> {
        self.stage(
            namespace,
            Change::Set {
                section_type: section_type.to_string(),
                section_id: section_id.to_string(),
                option: option.to_string(),
                value,
            },
        );
        Ok(())
    }

    async fn unset(
        &self,
        namespace: &str,
        section_id: &str,
        option: &str,
    ) -> Result<(), ParentalControlError> {
        self.stage(
            namespace,
            Change::Unset {
                section_id: section_id.to_string(),
                option: option.to_string(),
            },
        );
        Ok(())
    }

    async fn remove(&self, namespace: &str, section_id: &str) -> Result<(), ParentalControlError> {
        self.stage(
            namespace,
            Change::Remove {
                section_id: section_id.to_string(),
            },
        );
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn commit(&self, namespace: &str) -> Result<(), ParentalControlError> {
        let changes = self.take_staged(namespace);
        if changes.is_empty() {
            return Ok(());
        }

        if let Err(err) = self.apply(namespace, &changes).await {
            self.restore_staged(namespace, changes);
            return Err(err.into());
        }
        tracing::debug!(changes = changes.len(), "committed staged changes");
        Ok(())
    }

    async fn revert(&self, namespace: &str) -> Result<(), ParentalControlError> {
        let mut staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        staged.remove(namespace);
        Ok(())
    }
}
