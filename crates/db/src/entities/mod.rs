//! Database entities.

#![allow(missing_docs)]

pub mod answer;
pub mod notification;
pub mod question;
pub mod question_tag;
pub mod question_view;
pub mod report;
pub mod tag;
pub mod user;
pub mod vote;

pub use answer::Entity as Answer;
pub use notification::Entity as Notification;
pub use question::Entity as Question;
pub use question_tag::Entity as QuestionTag;
pub use question_view::Entity as QuestionView;
pub use report::Entity as Report;
pub use tag::Entity as Tag;
pub use user::Entity as User;
pub use vote::{Entity as Vote, TargetKind};
