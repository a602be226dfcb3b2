//! Database repositories.

#![allow(missing_docs)]

mod answer;
mod notification;
mod question;
mod question_view;
mod report;
mod tag;
mod user;
mod vote;

pub use answer::AnswerRepository;
pub use notification::NotificationRepository;
pub use question::{QuestionFilter, QuestionRepository, QuestionSort, escape_like};
pub use question_view::QuestionViewRepository;
pub use report::ReportRepository;
pub use tag::{DEFAULT_TAG_COLOR, TagRepository, TagWithCount};
pub use user::UserRepository;
pub use vote::VoteRepository;
