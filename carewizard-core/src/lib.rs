pub mod dashboard;
pub mod error;
pub mod fee;
pub mod field;
pub mod flows;
pub mod issue;
pub mod navigation;
pub mod payload;
pub mod step;
pub mod submission;
pub mod validation;
pub mod wizard;

pub use error::{Result, WizardError};
pub use fee::{AppointmentType, DoctorDirectory, DoctorSummary, FeeSchedule};
pub use field::{FieldKind, FieldSpec, FieldStore, FieldValue, FieldValues};
pub use flows::{FlowKind, WizardMode};
pub use issue::{Issue, IssueCode, IssueReport, IssueSeverity};
pub use navigation::{CompletionPolicy, Navigator, Transition};
pub use payload::PayloadContext;
pub use step::{DisplayMeta, StepCatalog, StepDescriptor};
pub use submission::{
    ApiFailure, ClinicApi, CreatedEntity, FailureCategory, Notification, NotificationLevel,
    Notifier, Progress, SubmissionGate, SubmissionOutcome, SubmissionRequest, TracingNotifier,
};
pub use validation::{FieldErrors, StepValidation, StepValidator};
pub use wizard::{Wizard, WizardPhase, WizardView};
