//! The wizard aggregate: one flow instance with its record, navigation and
//! submission phase.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::{Result, WizardError};
use crate::fee::DoctorDirectory;
use crate::field::{FieldStore, FieldValue, FieldValues};
use crate::flows::{FlowKind, WizardMode};
use crate::navigation::{CompletionPolicy, Navigator, Transition};
use crate::payload::PayloadContext;
use crate::step::StepCatalog;
use crate::submission::{ApiFailure, CreatedEntity, Notification, SubmissionRequest};
use crate::validation::{FieldErrors, RuleSet, StepValidation, StepValidator};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum WizardPhase {
    Editing,
    Submitting,
    Confirmed {
        #[serde(rename = "entityId")]
        entity_id: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Wizard {
    kind: FlowKind,
    mode: WizardMode,
    catalog: StepCatalog,
    rules: RuleSet,
    store: FieldStore,
    navigator: Navigator,
    policy: CompletionPolicy,
    phase: WizardPhase,
    precondition: Option<String>,
    entity_id: Option<String>,
    directory: Option<DoctorDirectory>,
    today: NaiveDate,
}

impl Wizard {
    /// New create-mode wizard. Flows that need a precondition must go
    /// through [`Wizard::with_precondition`].
    pub fn create(kind: FlowKind) -> Result<Self> {
        if let Some(name) = kind.precondition() {
            return Err(WizardError::MissingPrecondition(name));
        }
        Self::build(kind, WizardMode::Create)
    }

    pub fn with_precondition(kind: FlowKind, precondition: impl Into<String>) -> Result<Self> {
        let precondition = precondition.into();
        if precondition.trim().is_empty() {
            return Err(WizardError::MissingPrecondition(
                kind.precondition().unwrap_or("precondition"),
            ));
        }
        let mut wizard = Self::build(kind, WizardMode::Create)?;
        wizard.precondition = Some(precondition.trim().to_string());
        Ok(wizard)
    }

    /// Edit-mode wizard seeded from a persisted entity. Every step starts
    /// out completed.
    pub fn edit(kind: FlowKind, entity_id: impl Into<String>, entity: &Value) -> Result<Self> {
        if !kind.supports_edit() {
            return Err(WizardError::EditUnsupported(kind));
        }
        if !entity.is_object() {
            return Err(WizardError::InvalidEntity(format!(
                "{} must be a JSON object",
                kind.entity()
            )));
        }

        let mut wizard = Self::build(kind, WizardMode::Edit)?;
        for (key, value) in kind.seed(entity)? {
            wizard.store.set_field(key, value)?;
        }
        wizard.navigator = Navigator::resumed(&wizard.catalog);
        wizard.entity_id = Some(entity_id.into());
        Ok(wizard)
    }

    fn build(kind: FlowKind, mode: WizardMode) -> Result<Self> {
        let catalog = kind.catalog()?;
        let rules = kind.rules(mode);
        rules.check_against(&catalog)?;
        let store = FieldStore::new(catalog.schema());
        let navigator = Navigator::new(&catalog);

        tracing::debug!(flow = %kind, ?mode, steps = catalog.len(), "Wizard created");
        Ok(Self {
            kind,
            mode,
            catalog,
            rules,
            store,
            navigator,
            policy: CompletionPolicy::default(),
            phase: WizardPhase::Editing,
            precondition: None,
            entity_id: None,
            directory: None,
            today: Local::now().date_naive(),
        })
    }

    pub fn with_policy(mut self, policy: CompletionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pin the reference date used by date rules.
    pub fn with_reference_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn attach_directory(&mut self, directory: DoctorDirectory) {
        self.directory = Some(directory);
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    pub fn current_step(&self) -> &'static str {
        self.navigator.current()
    }

    pub fn completed_steps(&self) -> &BTreeSet<&'static str> {
        self.navigator.completed()
    }

    pub fn values(&self) -> &FieldValues {
        self.store.values()
    }

    pub fn errors(&self) -> &FieldErrors {
        self.store.errors()
    }

    pub fn precondition(&self) -> Option<&str> {
        self.precondition.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn directory(&self) -> Option<&DoctorDirectory> {
        self.directory.as_ref()
    }

    /// Id of the entity created by a confirmed submission.
    pub fn confirmed_id(&self) -> Option<&str> {
        match &self.phase {
            WizardPhase::Confirmed { entity_id } => entity_id.as_deref(),
            _ => None,
        }
    }

    pub fn set_field(&mut self, key: &str, value: FieldValue) -> Result<()> {
        self.ensure_editing()?;
        let changed = self.store.set_field(key, value)?;
        self.after_edit(key, changed);
        Ok(())
    }

    pub fn set_field_list(&mut self, key: &str, items: Vec<String>) -> Result<()> {
        self.ensure_editing()?;
        let changed = self.store.set_field_list(key, items)?;
        self.after_edit(key, changed);
        Ok(())
    }

    pub fn add_list_item(&mut self, key: &str, item: &str) -> Result<()> {
        self.ensure_editing()?;
        let changed = self.store.add_list_item(key, item)?;
        self.after_edit(key, changed);
        Ok(())
    }

    pub fn remove_list_item(&mut self, key: &str, index: usize) -> Result<()> {
        self.ensure_editing()?;
        let changed = self.store.remove_list_item(key, index)?;
        self.after_edit(key, changed);
        Ok(())
    }

    fn after_edit(&mut self, key: &str, changed: bool) {
        if !changed || self.mode != WizardMode::Create || self.policy != CompletionPolicy::PruneOnEdit {
            return;
        }
        if let Some(owner) = self.catalog.owner_of(key)
            && self.navigator.is_completed(owner)
        {
            self.navigator.prune_from(&self.catalog, owner);
            tracing::debug!(field = key, step = owner, "Completion pruned after edit");
        }
    }

    /// Validate a step without touching the stored errors.
    pub fn validate_step(&self, step_id: &str) -> Result<StepValidation> {
        StepValidator::new(&self.catalog, &self.rules, self.today)
            .validate_step(step_id, self.store.values())
    }

    pub fn advance(&mut self) -> Result<Transition> {
        self.ensure_editing()?;
        let from = self.navigator.current();
        let validator = StepValidator::new(&self.catalog, &self.rules, self.today);
        let transition = self
            .navigator
            .advance(&self.catalog, &validator, self.store.values())?;

        let errors = match &transition {
            Transition::Rejected { errors, .. } => errors.clone(),
            _ => FieldErrors::new(),
        };
        let fields = self.catalog.resolve(from)?.fields;
        self.store.record_errors(fields, &errors);
        Ok(transition)
    }

    pub fn retreat(&mut self) -> Result<Transition> {
        self.ensure_editing()?;
        Ok(self.navigator.retreat(&self.catalog))
    }

    pub fn jump(&mut self, target: &str) -> Result<Transition> {
        self.ensure_editing()?;
        let target = self.catalog.resolve(target)?.id;
        let from = self.navigator.current();

        // Forward by one in create mode is an advance and records errors.
        if self.mode == WizardMode::Create
            && !self.navigator.is_completed(target)
            && self.catalog.next_step_id(from) == Some(target)
        {
            return self.advance();
        }

        let validator = StepValidator::new(&self.catalog, &self.rules, self.today);
        self.navigator.jump(
            &self.catalog,
            &validator,
            self.store.values(),
            self.mode,
            target,
        )
    }

    /// Fee for the selected doctor and appointment type, recomputed on every
    /// read.
    pub fn displayed_fee(&self) -> Option<f64> {
        if self.kind != FlowKind::AppointmentBooking {
            return None;
        }
        let values = self.store.values();
        self.directory
            .as_ref()?
            .fee_for(values.text("doctorId"), values.text("appointmentType"))
    }

    pub fn payload(&self) -> Value {
        let context = PayloadContext {
            mode: self.mode,
            precondition: self.precondition.as_deref(),
            fee: self.displayed_fee(),
        };
        self.kind.to_payload(self.store.values(), &context)
    }

    /// Revalidate every step and enter the in-flight phase.
    ///
    /// On a failing step the wizard moves there, records its errors and
    /// stays in `Editing`.
    pub fn begin_submission(&mut self) -> Result<SubmissionRequest> {
        self.ensure_editing()?;
        let last = self.catalog.last().id;
        if self.navigator.current() != last {
            return Err(WizardError::NotReadyToSubmit);
        }

        let validator = StepValidator::new(&self.catalog, &self.rules, self.today);
        if let Some((step, validation)) = validator.first_invalid(self.store.values())? {
            let fields = self.catalog.resolve(step)?.fields;
            self.store.record_errors(fields, &validation.errors);
            if self.mode == WizardMode::Create {
                self.navigator.prune_from(&self.catalog, step);
            }
            self.navigator.move_to(step);
            tracing::debug!(flow = %self.kind, step, "Submission blocked by invalid step");
            return Err(WizardError::StepInvalid {
                step: step.to_string(),
                count: validation.errors.len(),
            });
        }

        self.navigator.mark_completed(last);
        let request = SubmissionRequest {
            kind: self.kind,
            mode: self.mode,
            entity_id: self.entity_id.clone(),
            payload: self.payload(),
        };
        self.phase = WizardPhase::Submitting;
        tracing::info!(flow = %self.kind, mode = ?self.mode, "Submission started");
        Ok(request)
    }

    /// Settle the in-flight submission. A failure only returns the phase to
    /// `Editing`.
    pub fn finish_submission(
        &mut self,
        result: &std::result::Result<CreatedEntity, ApiFailure>,
    ) -> Notification {
        match result {
            Ok(created) => {
                let entity_id = created.id.clone().or_else(|| self.entity_id.clone());
                tracing::info!(flow = %self.kind, entity_id = ?entity_id, "Submission confirmed");
                self.phase = WizardPhase::Confirmed { entity_id };
                Notification::success(self.kind.success_message(self.mode))
            }
            Err(failure) => {
                tracing::warn!(
                    flow = %self.kind,
                    category = ?failure.category,
                    status = ?failure.status,
                    "Submission failed"
                );
                self.phase = WizardPhase::Editing;
                Notification::error(failure.user_message())
            }
        }
    }

    /// True once a new patient registration is confirmed and a booking
    /// wizard can follow it.
    pub fn offers_booking(&self) -> bool {
        self.kind == FlowKind::PatientRegistration
            && self.mode == WizardMode::Create
            && self.confirmed_id().is_some()
    }

    /// Booking wizard for the patient created by this one.
    pub fn follow_up_booking(&self) -> Result<Wizard> {
        let patient_id = self
            .confirmed_id()
            .filter(|_| self.offers_booking())
            .ok_or(WizardError::MissingPrecondition("patientId"))?;
        let mut booking = Wizard::with_precondition(FlowKind::AppointmentBooking, patient_id)?
            .with_policy(self.policy)
            .with_reference_date(self.today);
        if let Some(directory) = &self.directory {
            booking.attach_directory(directory.clone());
        }
        Ok(booking)
    }

    pub fn view(&self) -> WizardView<'_> {
        WizardView {
            flow: self.kind,
            mode: self.mode,
            phase: &self.phase,
            current_step: self.navigator.current(),
            completed_steps: self.navigator.completed(),
            steps: &self.catalog,
            values: self.store.values(),
            errors: self.store.errors(),
            fee: self.displayed_fee(),
            precondition: self.precondition.as_deref(),
            entity_id: self.entity_id.as_deref(),
            doctors: self.directory.as_ref(),
        }
    }

    fn ensure_editing(&self) -> Result<()> {
        match self.phase {
            WizardPhase::Editing => Ok(()),
            WizardPhase::Submitting => Err(WizardError::SubmissionInFlight),
            WizardPhase::Confirmed { .. } => Err(WizardError::AlreadyConfirmed),
        }
    }
}

/// Read model handed to the rendering layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView<'a> {
    pub flow: FlowKind,
    pub mode: WizardMode,
    pub phase: &'a WizardPhase,
    pub current_step: &'static str,
    pub completed_steps: &'a BTreeSet<&'static str>,
    pub steps: &'a StepCatalog,
    pub values: &'a FieldValues,
    pub errors: &'a FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precondition: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctors: Option<&'a DoctorDirectory>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fee::{DoctorSummary, FeeSchedule};
    use crate::submission::testing::{MockApi, RecordingNotifier};
    use crate::submission::{NotificationLevel, SubmissionGate, SubmissionOutcome};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn patient() -> Wizard {
        Wizard::create(FlowKind::PatientRegistration)
            .unwrap()
            .with_reference_date(today())
    }

    fn fill(wizard: &mut Wizard, fields: &[(&str, &str)]) {
        for (key, value) in fields {
            wizard.set_field(key, FieldValue::text(*value)).unwrap();
        }
    }

    fn fill_asha(wizard: &mut Wizard) {
        fill(
            wizard,
            &[
                ("firstName", "Asha"),
                ("lastName", "Rao"),
                ("dateOfBirth", "1990-01-01"),
                ("gender", "female"),
                ("email", "asha@example.com"),
                ("phone", "9876543210"),
                ("password", "Str0ng!pw"),
                ("confirmPassword", "Str0ng!pw"),
                ("registrationSource", "website"),
            ],
        );
    }

    fn walk_to_last(wizard: &mut Wizard) {
        for _ in 0..wizard.catalog().len() - 1 {
            assert!(matches!(wizard.advance().unwrap(), Transition::Moved { .. }));
        }
    }

    fn directory() -> DoctorDirectory {
        DoctorDirectory::new(vec![DoctorSummary {
            id: "d-1".into(),
            name: "Meera Iyer".into(),
            specialization: "Cardiology".into(),
            fees: FeeSchedule {
                consultation: 800.0,
                follow_up: Some(500.0),
                emergency: None,
            },
        }])
    }

    #[test]
    fn test_booking_requires_precondition() {
        let err = Wizard::create(FlowKind::AppointmentBooking).unwrap_err();
        assert!(matches!(err, WizardError::MissingPrecondition("patientId")));
        assert!(Wizard::with_precondition(FlowKind::AppointmentBooking, " ").is_err());
    }

    #[test]
    fn test_rejected_advance_records_errors_and_edit_clears_one() {
        let mut wizard = patient();
        let transition = wizard.advance().unwrap();
        assert!(matches!(transition, Transition::Rejected { step: "personal", .. }));
        assert_eq!(wizard.current_step(), "personal");
        assert!(wizard.errors().contains_key("firstName"));
        assert!(wizard.errors().contains_key("lastName"));

        wizard.set_field("firstName", FieldValue::text("Asha")).unwrap();
        assert!(!wizard.errors().contains_key("firstName"));
        assert!(wizard.errors().contains_key("lastName"));
    }

    #[test]
    fn test_confirm_mismatch_stays_on_security() {
        let mut wizard = patient();
        fill_asha(&mut wizard);
        fill(&mut wizard, &[("confirmPassword", "Str0ng!px")]);
        walk_to_last(&mut wizard);

        let transition = wizard.advance().unwrap();
        let Transition::Rejected { step, errors } = transition else {
            panic!("expected rejection");
        };
        assert_eq!(step, "security");
        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec!["confirmPassword"]);
        assert_eq!(wizard.current_step(), "security");
    }

    #[test]
    fn test_prune_on_edit_revokes_later_steps() {
        let mut wizard = patient();
        fill_asha(&mut wizard);
        walk_to_last(&mut wizard);
        assert_eq!(wizard.completed_steps().len(), 3);

        wizard.jump("personal").unwrap();
        wizard.set_field("lastName", FieldValue::text("Rao-Iyer")).unwrap();
        assert!(wizard.completed_steps().is_empty());

        // Retain keeps completion across edits.
        let mut retained = patient().with_policy(CompletionPolicy::Retain);
        fill_asha(&mut retained);
        walk_to_last(&mut retained);
        retained.jump("personal").unwrap();
        retained.set_field("lastName", FieldValue::text("Rao-Iyer")).unwrap();
        assert_eq!(retained.completed_steps().len(), 3);
    }

    #[test]
    fn test_jump_ahead_rejected_in_create_mode() {
        let mut wizard = patient();
        let err = wizard.jump("security").unwrap_err();
        assert!(matches!(err, WizardError::JumpRejected { .. }));
        assert!(matches!(wizard.jump("nowhere").unwrap_err(), WizardError::UnknownStep(_)));
    }

    #[test]
    fn test_edit_mode_seeds_and_jumps_freely() {
        let entity = json!({
            "personalInfo": {"firstName": "Asha", "lastName": "Rao", "dateOfBirth": "1990-01-01T00:00:00Z", "gender": "female"},
            "contactInfo": {"email": "asha@example.com", "phone": "9876543210"},
            "registrationSource": "website"
        });
        let mut wizard = Wizard::edit(FlowKind::PatientRegistration, "p-1", &entity)
            .unwrap()
            .with_reference_date(today());
        assert_eq!(wizard.completed_steps().len(), 4);
        assert_eq!(wizard.values().text("dateOfBirth"), "1990-01-01");

        wizard.jump("security").unwrap();
        assert_eq!(wizard.current_step(), "security");
        let request = wizard.begin_submission().unwrap();
        assert_eq!(request.entity_id.as_deref(), Some("p-1"));
        assert!(request.payload.get("authentication").is_none());

        wizard.finish_submission(&Ok(CreatedEntity {
            id: None,
            body: json!({}),
        }));
        assert_eq!(wizard.confirmed_id(), Some("p-1"));
        // Updating an existing patient does not lead into booking.
        assert!(!wizard.offers_booking());
        assert!(wizard.follow_up_booking().is_err());
    }

    #[test]
    fn test_edit_unsupported_flows() {
        let err = Wizard::edit(FlowKind::PasswordChange, "x", &json!({})).unwrap_err();
        assert!(matches!(err, WizardError::EditUnsupported(FlowKind::PasswordChange)));
    }

    #[test]
    fn test_begin_submission_moves_to_first_invalid_step() {
        let mut wizard = patient().with_policy(CompletionPolicy::Retain);
        fill_asha(&mut wizard);
        walk_to_last(&mut wizard);
        wizard.set_field("email", FieldValue::text("not-an-email")).unwrap();

        let err = wizard.begin_submission().unwrap_err();
        assert!(matches!(err, WizardError::StepInvalid { ref step, count: 1 } if step == "contact"));
        assert_eq!(wizard.current_step(), "contact");
        assert!(wizard.errors().contains_key("email"));
        assert_eq!(wizard.phase(), &WizardPhase::Editing);
    }

    #[test]
    fn test_begin_submission_requires_last_step() {
        let mut wizard = patient();
        assert!(matches!(wizard.begin_submission().unwrap_err(), WizardError::NotReadyToSubmit));
    }

    #[test]
    fn test_in_flight_refuses_edits_and_second_submit() {
        let mut wizard = patient();
        fill_asha(&mut wizard);
        walk_to_last(&mut wizard);
        wizard.begin_submission().unwrap();

        assert!(matches!(wizard.begin_submission().unwrap_err(), WizardError::SubmissionInFlight));
        assert!(matches!(
            wizard.set_field("firstName", FieldValue::text("X")).unwrap_err(),
            WizardError::SubmissionInFlight
        ));
        assert!(matches!(wizard.retreat().unwrap_err(), WizardError::SubmissionInFlight));
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_state() {
        let mut wizard = patient();
        fill_asha(&mut wizard);
        walk_to_last(&mut wizard);
        let before_values = wizard.values().clone();
        let before_completed = wizard.completed_steps().clone();

        let api = MockApi::failing(ApiFailure::from_status(409, Some("Email already registered".into())));
        let notifier = RecordingNotifier::default();
        let outcome = SubmissionGate::submit(&mut wizard, &api, &notifier).await.unwrap();

        assert!(matches!(outcome, SubmissionOutcome::Failed(_)));
        assert_eq!(wizard.phase(), &WizardPhase::Editing);
        assert_eq!(wizard.current_step(), "security");
        assert_eq!(wizard.values(), &before_values);
        // The last step is marked once it validated.
        assert!(wizard.completed_steps().is_superset(&before_completed));
        let seen = notifier.seen.lock().unwrap();
        assert_eq!(seen[0].level, NotificationLevel::Error);
        assert_eq!(seen[0].message, "Email already registered");
    }

    #[tokio::test]
    async fn test_successful_submission_confirms() {
        let mut wizard = patient();
        fill_asha(&mut wizard);
        walk_to_last(&mut wizard);

        let api = MockApi::default();
        let notifier = RecordingNotifier::default();
        let progress = SubmissionGate::advance(&mut wizard, &api, &notifier).await.unwrap();

        assert!(matches!(progress, crate::submission::Progress::Submitted(SubmissionOutcome::Confirmed(_))));
        assert_eq!(wizard.confirmed_id(), Some("patient-1"));
        assert_eq!(api.request_count(), 1);
        let request = api.requests.lock().unwrap()[0].clone();
        assert_eq!(request.payload["personalInfo"]["firstName"], "Asha");
        assert!(matches!(wizard.advance().unwrap_err(), WizardError::AlreadyConfirmed));
        assert_eq!(notifier.seen.lock().unwrap()[0].level, NotificationLevel::Success);
    }

    #[tokio::test]
    async fn test_booking_follows_confirmed_registration() {
        let mut wizard = patient();
        wizard.attach_directory(directory());
        assert!(wizard.follow_up_booking().is_err());
        assert!(!wizard.offers_booking());

        fill_asha(&mut wizard);
        walk_to_last(&mut wizard);
        SubmissionGate::submit(&mut wizard, &MockApi::default(), &RecordingNotifier::default())
            .await
            .unwrap();

        assert!(wizard.offers_booking());
        let mut booking = wizard.follow_up_booking().unwrap();
        assert_eq!(booking.precondition(), Some("patient-1"));
        assert!(!booking.offers_booking());
        fill(&mut booking, &[("doctorId", "d-1"), ("appointmentType", "consultation")]);
        assert_eq!(booking.displayed_fee(), Some(800.0));
        fill(&mut booking, &[("appointmentType", "follow-up")]);
        assert_eq!(booking.displayed_fee(), Some(500.0));
        assert_eq!(booking.payload()["patientId"], "patient-1");
        assert_eq!(booking.payload()["fee"], 500);
    }

    #[test]
    fn test_view_serializes_phase_and_steps() {
        let wizard = patient();
        let view = serde_json::to_value(wizard.view()).unwrap();
        assert_eq!(view["flow"], "patient-registration");
        assert_eq!(view["phase"]["state"], "editing");
        assert_eq!(view["currentStep"], "personal");
        assert_eq!(view["steps"][0]["id"], "personal");
        assert!(view.get("fee").is_none());

        let confirmed = serde_json::to_value(WizardPhase::Confirmed {
            entity_id: Some("p-1".into()),
        })
        .unwrap();
        assert_eq!(confirmed, json!({"state": "confirmed", "entityId": "p-1"}));
    }
}
