//! Business logic services.

#![allow(missing_docs)]

pub mod acceptance;
pub mod answer;
pub mod caller;
pub mod event_publisher;
pub mod moderation;
pub mod notification;
pub mod question;
pub mod tag;
pub mod user;
pub mod vote;

#[cfg(test)]
pub(crate) mod test_support;

pub use acceptance::AcceptanceService;
pub use answer::{AnswerInput, AnswerService};
pub use caller::Caller;
pub use event_publisher::{
    EventPublisher, EventPublisherService, NoOpEventPublisher, NotificationEvent,
};
pub use moderation::{ModerationAction, ModerationService, ReportWithReporter, SubmitReportInput};
pub use notification::NotificationService;
pub use question::{
    AnswerView, CreateQuestionInput, ListQuestionsInput, QuestionDetail, QuestionService,
    QuestionSummary, TaggedQuestion, UpdateQuestionInput, normalize_tags,
};
pub use tag::{TagInput, TagService};
pub use user::{SiteStats, UserProfile, UserService};
pub use vote::{VoteOutcome, VoteService, VoteValue};
