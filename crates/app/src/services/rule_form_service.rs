//! Rule form service: loads the form, validates submissions and commits
//! them to the configuration store.

use parentctl_domain::error::{
    NotFoundError, ParentalControlError, RowErrors, ValidationError, ValidationErrors,
};
use parentctl_domain::host_hint::{TargetOptions, check_options, suggest_targets};
use parentctl_domain::id::RuleId;
use parentctl_domain::rule::{Rule, RuleDraft, RuleStatus, apply_defaults, validate_rule};
use parentctl_domain::schema::{
    FormSchema, NAMESPACE, RULE_SECTION, SETTINGS_ID, SETTINGS_SECTION, parental_control_schema,
};
use parentctl_domain::settings::{Settings, SettingsDraft, validate_settings};
use parentctl_domain::time::{LocalMoment, now_local};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::ports::{ConfigSection, ConfigStore, HostHintSource};
use crate::record::{
    StoredRule, decode_rule, decode_settings, encode_rule, encode_settings, merge_rule,
};

/// One row of the rule grid as shown to an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRow {
    pub id: RuleId,
    /// Stored values, verbatim.
    pub values: RuleDraft,
    /// `None` when the stored record does not validate.
    pub status: Option<RuleStatus>,
    /// Hard problems of a hand-edited record.
    pub errors: Vec<ValidationError>,
    /// Targets that are not among the current suggestions.
    pub warnings: Vec<ValidationError>,
}

/// Everything a renderer needs to draw the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormView {
    pub schema: FormSchema,
    pub rules: Vec<RuleRow>,
    pub settings: Settings,
}

/// A batch of edits from one form submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSubmission {
    /// Rows to create or overwrite. Rows without an id are new.
    pub rules: Vec<RuleDraft>,
    /// Rows deleted with the remove button.
    pub removed: Vec<RuleId>,
    pub settings: Option<SettingsDraft>,
}

/// The records as committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub rules: Vec<Rule>,
    pub settings: Option<Settings>,
}

/// Application service behind the parental control form.
///
/// Every call reads what it needs from the ports. Writes are serialized so
/// that one request never commits or reverts another's staged changes.
pub struct RuleFormService<S, H> {
    store: S,
    hints: H,
    version: String,
    write_lock: Mutex<()>,
}

impl<S: ConfigStore, H: HostHintSource> RuleFormService<S, H> {
    /// Create a new service over a configuration store and a host-hint
    /// directory.
    pub fn new(store: S, hints: H) -> Self {
        Self {
            store,
            hints,
            version: env!("CARGO_PKG_VERSION").to_string(),
            write_lock: Mutex::new(()),
        }
    }

    /// Override the version shown in the form title.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The form schema without target suggestions.
    #[must_use]
    pub fn schema(&self) -> FormSchema {
        parental_control_schema(&self.version)
    }

    /// Load the form: schema with suggestions, every rule row and the
    /// settings.
    ///
    /// Host hints are fetched once; when the directory fails the form is
    /// still returned, with empty suggestion lists.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the configuration store.
    #[tracing::instrument(skip(self))]
    pub async fn load_form(&self) -> Result<FormView, ParentalControlError> {
        self.load_form_at(now_local()).await
    }

    async fn load_form_at(&self, moment: LocalMoment) -> Result<FormView, ParentalControlError> {
        let sections = self.store.load(NAMESPACE).await?;
        let targets = self.target_options().await;

        let rules = stored_rules(&sections)
            .map(|stored| rule_row(stored, &targets, moment))
            .collect();
        let settings = settings_or_default(&sections);

        Ok(FormView {
            schema: self.schema().with_target_options(&targets),
            rules,
            settings,
        })
    }

    async fn target_options(&self) -> TargetOptions {
        match self.hints.host_hints().await {
            Ok(hints) => {
                tracing::debug!(count = hints.len(), "loaded host hints");
                suggest_targets(&hints)
            }
            Err(err) => {
                tracing::warn!(error = %err, "host hints unavailable, suggestions disabled");
                TargetOptions::default()
            }
        }
    }

    /// List every stored rule that validates.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the configuration store.
    #[tracing::instrument(skip(self))]
    pub async fn list_rules(&self) -> Result<Vec<Rule>, ParentalControlError> {
        let sections = self.store.load(NAMESPACE).await?;
        Ok(stored_rules(&sections)
            .filter_map(|stored| match validated(&stored) {
                Ok(rule) => Some(rule),
                Err(errors) => {
                    tracing::warn!(rule_id = %stored.id, %errors, "skipping invalid stored rule");
                    None
                }
            })
            .collect())
    }

    /// Look up a rule by id.
    ///
    /// # Errors
    ///
    /// Returns [`ParentalControlError::NotFound`] when no rule with `id`
    /// exists, [`ParentalControlError::Validation`] when the stored record
    /// is invalid, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn get_rule(&self, id: RuleId) -> Result<Rule, ParentalControlError> {
        let stored = self.find_rule(id).await?;
        Ok(validated(&stored)?)
    }

    /// Add a new rule. Unset fields take their defaults and a fresh id is
    /// always assigned.
    ///
    /// # Errors
    ///
    /// Returns [`ParentalControlError::Validation`] listing every invalid
    /// field, or a storage error.
    #[tracing::instrument(skip(self, draft))]
    pub async fn create_rule(&self, draft: RuleDraft) -> Result<Rule, ParentalControlError> {
        let rule = validate_rule(&apply_defaults(RuleDraft { id: None, ..draft }))?;
        self.persist(std::slice::from_ref(&rule), &[], None).await?;
        tracing::info!(rule_id = %rule.id, rule_name = %rule.name, "rule created");
        Ok(rule)
    }

    /// Change some fields of an existing rule.
    ///
    /// Fields left unset in `draft` keep their stored value; a blank
    /// `mac`/`ip` clears the target.
    ///
    /// # Errors
    ///
    /// Returns [`ParentalControlError::NotFound`] when no rule with `id`
    /// exists, [`ParentalControlError::Validation`] when the result is
    /// invalid, or a storage error.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update_rule(
        &self,
        id: RuleId,
        draft: RuleDraft,
    ) -> Result<Rule, ParentalControlError> {
        let stored = self.find_rule(id).await?;
        let merged = merge_rule(stored.draft, RuleDraft { id: Some(id), ..draft });
        let rule = validate_rule(&apply_defaults(merged))?;
        self.persist(std::slice::from_ref(&rule), &[], None).await?;
        tracing::info!(rule_id = %rule.id, "rule updated");
        Ok(rule)
    }

    /// Delete a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ParentalControlError::NotFound`] when no rule with `id`
    /// exists, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: RuleId) -> Result<(), ParentalControlError> {
        self.find_rule(id).await?;
        self.persist(&[], &[id], None).await?;
        tracing::info!(rule_id = %id, "rule deleted");
        Ok(())
    }

    /// Current settings, defaults when never saved.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the configuration store.
    pub async fn get_settings(&self) -> Result<Settings, ParentalControlError> {
        let sections = self.store.load(NAMESPACE).await?;
        Ok(settings_or_default(&sections))
    }

    /// Change the settings. Unset fields keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns [`ParentalControlError::Validation`] for an invalid flag, or
    /// a storage error.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update_settings(
        &self,
        draft: SettingsDraft,
    ) -> Result<Settings, ParentalControlError> {
        let current = self.get_settings().await?;
        let settings = validate_settings(&SettingsDraft {
            debug: draft.debug.or(SettingsDraft::from(current).debug),
        })?;
        self.persist(&[], &[], Some(&settings)).await?;
        tracing::info!(debug = settings.debug, "settings updated");
        Ok(settings)
    }

    /// Validate and commit a whole form submit.
    ///
    /// Every row is checked before anything is staged; when any row has a
    /// hard error nothing is written and all row errors are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ParentalControlError::InvalidSubmission`] with the errors of
    /// each rejected row, [`ParentalControlError::Validation`] for invalid
    /// settings, or a storage error (in which case staged changes are
    /// reverted).
    #[tracing::instrument(skip(self, submission), fields(rows = submission.rules.len(), removed = submission.removed.len()))]
    pub async fn submit(
        &self,
        submission: FormSubmission,
    ) -> Result<SubmitOutcome, ParentalControlError> {
        let mut rules = Vec::with_capacity(submission.rules.len());
        let mut rejected = Vec::new();
        for (row, draft) in submission.rules.into_iter().enumerate() {
            match validate_rule(&apply_defaults(draft)) {
                Ok(rule) => rules.push(rule),
                Err(errors) => rejected.push(RowErrors { row, errors }),
            }
        }

        let settings = submission
            .settings
            .map(|draft| validate_settings(&draft))
            .transpose();

        if !rejected.is_empty() {
            tracing::debug!(rejected = rejected.len(), "submission rejected");
            return Err(ParentalControlError::InvalidSubmission(rejected));
        }
        let settings = settings?;

        self.persist(&rules, &submission.removed, settings.as_ref())
            .await?;
        tracing::info!(rules = rules.len(), "form submitted");
        Ok(SubmitOutcome { rules, settings })
    }

    async fn find_rule(&self, id: RuleId) -> Result<StoredRule, ParentalControlError> {
        let sections = self.store.load(NAMESPACE).await?;
        stored_rules(&sections)
            .find(|stored| stored.id == id)
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Rule",
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// Stage the changes and commit them; revert when anything fails.
    async fn persist(
        &self,
        rules: &[Rule],
        removed: &[RuleId],
        settings: Option<&Settings>,
    ) -> Result<(), ParentalControlError> {
        let _guard = self.write_lock.lock().await;
        let result: Result<(), ParentalControlError> = async {
            for rule in rules {
                self.stage_rule(rule).await?;
            }
            for id in removed {
                self.store.remove(NAMESPACE, &id.to_string()).await?;
            }
            if let Some(settings) = settings {
                for (field, value) in encode_settings(settings) {
                    self.store
                        .set(NAMESPACE, SETTINGS_SECTION, SETTINGS_ID, field.as_str(), value)
                        .await?;
                }
            }
            self.store.commit(NAMESPACE).await
        }
        .await;

        if let Err(err) = &result {
            tracing::error!(error = %err, "commit failed, reverting staged changes");
            if let Err(revert_err) = self.store.revert(NAMESPACE).await {
                tracing::error!(error = %revert_err, "failed to revert staged changes");
            }
        }
        result
    }

    async fn stage_rule(&self, rule: &Rule) -> Result<(), ParentalControlError> {
        let id = rule.id.to_string();
        for (field, value) in encode_rule(rule) {
            match value {
                Some(value) => {
                    self.store
                        .set(NAMESPACE, RULE_SECTION, &id, field.as_str(), value)
                        .await?;
                }
                None => self.store.unset(NAMESPACE, &id, field.as_str()).await?,
            }
        }
        Ok(())
    }
}

fn stored_rules(sections: &[ConfigSection]) -> impl Iterator<Item = StoredRule> + '_ {
    sections
        .iter()
        .filter(|section| section.section_type == RULE_SECTION)
        .filter_map(|section| {
            let stored = decode_rule(section);
            if stored.is_none() {
                tracing::debug!(section_id = %section.id, "ignoring rule section with foreign id");
            }
            stored
        })
}

fn validated(stored: &StoredRule) -> Result<Rule, ValidationErrors> {
    let decode_errors = ValidationErrors::from_vec(stored.decode_errors.clone());
    match (validate_rule(&stored.draft), decode_errors) {
        (Ok(rule), None) => Ok(rule),
        (Ok(_), Some(errors)) | (Err(errors), None) => Err(errors),
        (Err(errors), Some(decode_errors)) => Err(decode_errors.merge(errors)),
    }
}

fn rule_row(stored: StoredRule, targets: &TargetOptions, moment: LocalMoment) -> RuleRow {
    match validated(&stored) {
        Ok(rule) => RuleRow {
            id: stored.id,
            status: Some(rule.status_at(moment)),
            warnings: check_options(&rule, targets),
            errors: Vec::new(),
            values: stored.draft,
        },
        Err(errors) => RuleRow {
            id: stored.id,
            status: None,
            warnings: Vec::new(),
            errors: errors.into_inner(),
            values: stored.draft,
        },
    }
}

fn settings_or_default(sections: &[ConfigSection]) -> Settings {
    let section = sections
        .iter()
        .find(|section| section.section_type == SETTINGS_SECTION && section.id == SETTINGS_ID);
    validate_settings(&decode_settings(section)).unwrap_or_else(|errors| {
        tracing::warn!(%errors, "stored settings are invalid, using defaults");
        Settings::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::OptionValue;
    use parentctl_domain::error::Field;
    use parentctl_domain::host_hint::{HostHint, HostHints};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    enum Change {
        Set {
            section_type: String,
            id: String,
            option: String,
            value: OptionValue,
        },
        Unset {
            id: String,
            option: String,
        },
        Remove {
            id: String,
        },
    }

    #[derive(Default)]
    struct InMemoryStore {
        committed: Mutex<Vec<ConfigSection>>,
        staged: Mutex<Vec<Change>>,
        fail_commit: bool,
        /// Fail only the next commit.
        fail_once: AtomicBool,
        /// Let other tasks run between staged writes.
        yield_on_set: bool,
    }

    impl InMemoryStore {
        fn failing_commit() -> Self {
            Self {
                fail_commit: true,
                ..Self::default()
            }
        }

        fn with_sections(sections: Vec<ConfigSection>) -> Self {
            Self {
                committed: Mutex::new(sections),
                ..Self::default()
            }
        }

        fn interleaving() -> Self {
            Self {
                fail_once: AtomicBool::new(true),
                yield_on_set: true,
                ..Self::default()
            }
        }

        fn staged_len(&self) -> usize {
            self.staged.lock().unwrap().len()
        }
    }

    fn apply(sections: &mut Vec<ConfigSection>, change: Change) {
        match change {
            Change::Set {
                section_type,
                id,
                option,
                value,
            } => {
                if !sections.iter().any(|s| s.id == id) {
                    sections.push(ConfigSection::new(id.clone(), section_type));
                }
                if let Some(section) = sections.iter_mut().find(|s| s.id == id) {
                    section.options.insert(option, value);
                }
            }
            Change::Unset { id, option } => {
                if let Some(section) = sections.iter_mut().find(|s| s.id == id) {
                    section.options.remove(&option);
                }
            }
            Change::Remove { id } => sections.retain(|s| s.id != id),
        }
    }

    impl ConfigStore for InMemoryStore {
        async fn load(&self, _namespace: &str) -> Result<Vec<ConfigSection>, ParentalControlError> {
            Ok(self.committed.lock().unwrap().clone())
        }

        async fn get(
            &self,
            _namespace: &str,
            section_id: &str,
            option: &str,
        ) -> Result<Option<OptionValue>, ParentalControlError> {
            Ok(self
                .committed
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == section_id)
                .and_then(|s| s.option(option).cloned()))
        }

        async fn set(
            &self,
            _namespace: &str,
            section_type: &str,
            section_id: &str,
            option: &str,
            value: OptionValue,
        ) -> Result<(), ParentalControlError> {
            if self.yield_on_set {
                tokio::task::yield_now().await;
            }
            self.staged.lock().unwrap().push(Change::Set {
                section_type: section_type.to_string(),
                id: section_id.to_string(),
                option: option.to_string(),
                value,
            });
            Ok(())
        }

        async fn unset(
            &self,
            _namespace: &str,
            section_id: &str,
            option: &str,
        ) -> Result<(), ParentalControlError> {
            self.staged.lock().unwrap().push(Change::Unset {
                id: section_id.to_string(),
                option: option.to_string(),
            });
            Ok(())
        }

        async fn remove(&self, _namespace: &str, section_id: &str) -> Result<(), ParentalControlError> {
            self.staged.lock().unwrap().push(Change::Remove {
                id: section_id.to_string(),
            });
            Ok(())
        }

        async fn commit(&self, _namespace: &str) -> Result<(), ParentalControlError> {
            if self.fail_commit || self.fail_once.swap(false, Ordering::SeqCst) {
                return Err(ParentalControlError::Storage(Box::new(std::io::Error::other(
                    "disk full",
                ))));
            }
            let changes: Vec<Change> = self.staged.lock().unwrap().drain(..).collect();
            let mut committed = self.committed.lock().unwrap();
            for change in changes {
                apply(&mut committed, change);
            }
            Ok(())
        }

        async fn revert(&self, _namespace: &str) -> Result<(), ParentalControlError> {
            self.staged.lock().unwrap().clear();
            Ok(())
        }
    }

    enum StubHints {
        Known(HostHints),
        Unreachable,
    }

    impl HostHintSource for StubHints {
        async fn host_hints(&self) -> Result<HostHints, ParentalControlError> {
            match self {
                Self::Known(hints) => Ok(hints.clone()),
                Self::Unreachable => Err(ParentalControlError::HostHints(Box::new(
                    std::io::Error::other("rpc timeout"),
                ))),
            }
        }
    }

    fn phone_hints() -> StubHints {
        StubHints::Known(HostHints::from([(
            "AA:BB:CC:DD:EE:FF".to_string(),
            HostHint {
                name: Some("phone".to_string()),
                ipv4: Some("192.168.1.5".to_string()),
            },
        )]))
    }

    fn make_service() -> RuleFormService<InMemoryStore, StubHints> {
        RuleFormService::new(InMemoryStore::default(), phone_hints()).with_version("test")
    }

    fn named(name: &str) -> RuleDraft {
        RuleDraft {
            name: Some(name.to_string()),
            ..RuleDraft::default()
        }
    }

    fn monday_evening() -> LocalMoment {
        // 2024-01-01 is a Monday
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_rule_with_defaults() {
        let svc = make_service();
        let rule = svc.create_rule(named("Tablet")).await.unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.start.to_string(), "21:00");

        let fetched = svc.get_rule(rule.id).await.unwrap();
        assert_eq!(fetched, rule);
    }

    #[tokio::test]
    async fn should_assign_fresh_id_on_create() {
        let svc = make_service();
        let requested = RuleId::new();
        let rule = svc
            .create_rule(RuleDraft {
                id: Some(requested),
                ..named("Tablet")
            })
            .await
            .unwrap();
        assert_ne!(rule.id, requested);
    }

    #[tokio::test]
    async fn should_reject_create_with_every_invalid_field() {
        let svc = make_service();
        let result = svc
            .create_rule(RuleDraft {
                mac: Some("00:11:22".to_string()),
                start: Some("25:00".to_string()),
                ..RuleDraft::default()
            })
            .await;
        let Err(ParentalControlError::Validation(errors)) = result else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.into_inner(),
            vec![
                ValidationError::EmptyField(Field::Name),
                ValidationError::InvalidFormat(Field::Mac),
                ValidationError::InvalidFormat(Field::Start),
            ]
        );
        assert!(svc.list_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_when_rule_missing() {
        let svc = make_service();
        let result = svc.get_rule(RuleId::new()).await;
        assert!(matches!(result, Err(ParentalControlError::NotFound(_))));
        let result = svc.delete_rule(RuleId::new()).await;
        assert!(matches!(result, Err(ParentalControlError::NotFound(_))));
        let result = svc.update_rule(RuleId::new(), named("x")).await;
        assert!(matches!(result, Err(ParentalControlError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_update_only_submitted_fields() {
        let svc = make_service();
        let rule = svc
            .create_rule(RuleDraft {
                mac: Some("00:11:22:33:44:55".to_string()),
                ..named("Tablet")
            })
            .await
            .unwrap();

        let updated = svc
            .update_rule(
                rule.id,
                RuleDraft {
                    enabled: Some(false),
                    ..RuleDraft::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.enabled);
        assert_eq!(updated.name, "Tablet");
        assert_eq!(updated.mac, rule.mac);
    }

    #[tokio::test]
    async fn should_clear_target_with_blank_value() {
        let svc = make_service();
        let rule = svc
            .create_rule(RuleDraft {
                mac: Some("00:11:22:33:44:55".to_string()),
                ..named("Tablet")
            })
            .await
            .unwrap();
        let updated = svc
            .update_rule(
                rule.id,
                RuleDraft {
                    mac: Some(String::new()),
                    ..RuleDraft::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.mac.is_none());

        let stored = svc.store.get(NAMESPACE, &rule.id.to_string(), "mac").await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn should_delete_rule() {
        let svc = make_service();
        let rule = svc.create_rule(named("Tablet")).await.unwrap();
        svc.delete_rule(rule.id).await.unwrap();
        assert!(matches!(
            svc.get_rule(rule.id).await,
            Err(ParentalControlError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_load_form_with_suggestions_and_rows() {
        let svc = make_service();
        let known = svc
            .create_rule(RuleDraft {
                mac: Some("aa:bb:cc:dd:ee:ff".to_string()),
                ..named("Phone")
            })
            .await
            .unwrap();
        let unknown = svc
            .create_rule(RuleDraft {
                ip: Some("192.168.1.77".to_string()),
                enabled: Some(false),
                ..named("Laptop")
            })
            .await
            .unwrap();

        let form = svc.load_form_at(monday_evening()).await.unwrap();
        assert_eq!(form.schema.title, "Parental Control test");
        let mac = form.schema.field(RULE_SECTION, "mac").unwrap();
        assert_eq!(mac.options[0].label, "AA:BB:CC:DD:EE:FF (phone)");

        assert_eq!(form.rules.len(), 2);
        let phone = form.rules.iter().find(|row| row.id == known.id).unwrap();
        assert_eq!(phone.status, Some(RuleStatus::Active));
        assert!(phone.warnings.is_empty());

        let laptop = form.rules.iter().find(|row| row.id == unknown.id).unwrap();
        assert_eq!(laptop.status, Some(RuleStatus::Disabled));
        assert_eq!(
            laptop.warnings,
            vec![ValidationError::UnknownOption(Field::Ip)]
        );
        assert!(form.settings.debug);
    }

    #[tokio::test]
    async fn should_render_form_with_empty_options_when_hints_fail() {
        let svc = RuleFormService::new(InMemoryStore::default(), StubHints::Unreachable);
        svc.create_rule(named("Tablet")).await.unwrap();

        let form = svc.load_form().await.unwrap();
        assert!(form.schema.field(RULE_SECTION, "mac").unwrap().options.is_empty());
        assert!(form.schema.field(RULE_SECTION, "ip").unwrap().options.is_empty());
        assert_eq!(form.rules.len(), 1);
    }

    #[tokio::test]
    async fn should_report_hand_edited_invalid_rows_without_failing() {
        let id = RuleId::new();
        let mut section = ConfigSection::new(id.to_string(), RULE_SECTION);
        section.options.insert("name".to_string(), "Broken".into());
        section.options.insert("enabled".to_string(), "perhaps".into());
        section.options.insert("days".to_string(), "mon funday".into());
        section.options.insert("start".to_string(), "21:00".into());
        section.options.insert("end".to_string(), "07:00".into());
        let foreign = ConfigSection::new("cfg0badid", RULE_SECTION);

        let svc = RuleFormService::new(
            InMemoryStore::with_sections(vec![section, foreign]),
            phone_hints(),
        );
        let form = svc.load_form().await.unwrap();
        assert_eq!(form.rules.len(), 1);
        assert_eq!(form.rules[0].status, None);
        assert_eq!(
            form.rules[0].errors,
            vec![
                ValidationError::InvalidFormat(Field::Enabled),
                ValidationError::InvalidFormat(Field::Days),
            ]
        );
        assert!(svc.list_rules().await.unwrap().is_empty());
        assert!(matches!(
            svc.get_rule(id).await,
            Err(ParentalControlError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn should_commit_valid_submission_as_one_batch() {
        let svc = make_service();
        let old = svc.create_rule(named("Old")).await.unwrap();

        let outcome = svc
            .submit(FormSubmission {
                rules: vec![
                    named("Tablet"),
                    RuleDraft {
                        days: Some(vec!["sat".to_string(), "sun".to_string()]),
                        start: Some("23:30".to_string()),
                        end: Some("06:00".to_string()),
                        ..named("Console")
                    },
                ],
                removed: vec![old.id],
                settings: Some(SettingsDraft {
                    debug: Some("0".to_string()),
                }),
            })
            .await
            .unwrap();

        assert_eq!(outcome.rules.len(), 2);
        assert_eq!(outcome.settings, Some(Settings { debug: false }));
        let names: Vec<String> = svc
            .list_rules()
            .await
            .unwrap()
            .into_iter()
            .map(|rule| rule.name)
            .collect();
        assert_eq!(names, vec!["Tablet", "Console"]);
        assert!(!svc.get_settings().await.unwrap().debug);
        assert_eq!(svc.store.staged_len(), 0);
    }

    #[tokio::test]
    async fn should_stage_nothing_when_any_row_is_invalid() {
        let svc = make_service();
        let result = svc
            .submit(FormSubmission {
                rules: vec![
                    named("Fine"),
                    RuleDraft {
                        days: Some(vec!["someday".to_string()]),
                        ..RuleDraft::default()
                    },
                ],
                ..FormSubmission::default()
            })
            .await;

        let Err(ParentalControlError::InvalidSubmission(rows)) = result else {
            panic!("expected rejected submission");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row, 1);
        assert_eq!(
            rows[0].errors.errors(),
            &[
                ValidationError::EmptyField(Field::Name),
                ValidationError::InvalidFormat(Field::Days),
            ]
        );
        assert_eq!(svc.store.staged_len(), 0);
        assert!(svc.list_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_revert_staged_changes_when_commit_fails() {
        let svc = RuleFormService::new(InMemoryStore::failing_commit(), phone_hints());
        let result = svc.create_rule(named("Tablet")).await;
        assert!(matches!(result, Err(ParentalControlError::Storage(_))));
        assert_eq!(svc.store.staged_len(), 0);
    }

    #[tokio::test]
    async fn should_not_lose_concurrent_writes_when_another_commit_fails() {
        let svc = RuleFormService::new(InMemoryStore::interleaving(), phone_hints());

        let (first, second) = tokio::join!(
            svc.create_rule(named("Tablet")),
            svc.create_rule(named("Console")),
        );

        let (saved, failed) = match (first, second) {
            (Ok(rule), Err(err)) | (Err(err), Ok(rule)) => (rule, err),
            other => panic!("expected exactly one failed commit, got {other:?}"),
        };
        assert!(matches!(failed, ParentalControlError::Storage(_)));
        assert_eq!(svc.get_rule(saved.id).await.unwrap(), saved);
        assert_eq!(svc.list_rules().await.unwrap(), vec![saved]);
        assert_eq!(svc.store.staged_len(), 0);
    }

    #[tokio::test]
    async fn should_default_settings_until_saved() {
        let svc = make_service();
        assert!(svc.get_settings().await.unwrap().debug);

        let saved = svc
            .update_settings(SettingsDraft {
                debug: Some("off".to_string()),
            })
            .await
            .unwrap();
        assert!(!saved.debug);
        assert_eq!(
            svc.store.get(NAMESPACE, SETTINGS_ID, "debug").await.unwrap(),
            Some(OptionValue::from("0"))
        );
    }

    #[tokio::test]
    async fn should_keep_settings_when_update_leaves_flag_unset() {
        let svc = make_service();
        svc.update_settings(SettingsDraft {
            debug: Some("0".to_string()),
        })
        .await
        .unwrap();
        let settings = svc.update_settings(SettingsDraft::default()).await.unwrap();
        assert!(!settings.debug);
    }

    #[tokio::test]
    async fn should_reject_invalid_settings_flag() {
        let svc = make_service();
        let result = svc
            .update_settings(SettingsDraft {
                debug: Some("sometimes".to_string()),
            })
            .await;
        assert!(matches!(result, Err(ParentalControlError::Validation(_))));
    }
}
