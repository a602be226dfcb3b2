//! Voting and acceptance invariants against a real database.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p stackit-core --test ledger_invariants -- --ignored`

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use stackit_common::{AppError, config::QuestionsConfig};
use stackit_core::{
    AcceptanceService, AnswerService, Caller, NotificationService, QuestionService, VoteService,
    VoteValue,
};
use stackit_db::entities::{Answer, Question, TargetKind, Vote, answer, user::UserRole, vote};
use stackit_db::repositories::{
    AnswerRepository, NotificationRepository, QuestionRepository, QuestionViewRepository,
    TagRepository, UserRepository, VoteRepository,
};
use stackit_db::test_utils::TestDatabase;

fn vote_service(conn: &Arc<DatabaseConnection>) -> VoteService {
    VoteService::new(
        VoteRepository::new(Arc::clone(conn)),
        QuestionRepository::new(Arc::clone(conn)),
        AnswerRepository::new(Arc::clone(conn)),
    )
}

fn acceptance_service(conn: &Arc<DatabaseConnection>) -> AcceptanceService {
    AcceptanceService::new(
        QuestionRepository::new(Arc::clone(conn)),
        AnswerRepository::new(Arc::clone(conn)),
        NotificationService::new(NotificationRepository::new(Arc::clone(conn))),
    )
}

fn answer_service(conn: &Arc<DatabaseConnection>) -> AnswerService {
    AnswerService::new(
        AnswerRepository::new(Arc::clone(conn)),
        QuestionRepository::new(Arc::clone(conn)),
        VoteRepository::new(Arc::clone(conn)),
        NotificationService::new(NotificationRepository::new(Arc::clone(conn))),
    )
}

fn question_service(conn: &Arc<DatabaseConnection>) -> QuestionService {
    QuestionService::new(
        QuestionRepository::new(Arc::clone(conn)),
        AnswerRepository::new(Arc::clone(conn)),
        TagRepository::new(Arc::clone(conn)),
        VoteRepository::new(Arc::clone(conn)),
        QuestionViewRepository::new(Arc::clone(conn)),
        UserRepository::new(Arc::clone(conn)),
        QuestionsConfig::default(),
    )
}

async fn stored_sum(conn: &DatabaseConnection, target_id: &str) -> i32 {
    Vote::find()
        .filter(vote::Column::TargetId.eq(target_id))
        .all(conn)
        .await
        .unwrap()
        .iter()
        .map(|v| i32::from(v.value))
        .sum()
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_toggle_and_flip_keep_cached_total_consistent() {
    let db = TestDatabase::create_unique().await.unwrap();
    let author = db.seed_user("author", UserRole::User).await.unwrap();
    let voter = db.seed_user("voter", UserRole::User).await.unwrap();
    let question = db.seed_question(&author.id, "Toggle").await.unwrap();

    let conn = db.shared();
    let votes = vote_service(&conn);
    let caller = Caller::from(&voter);

    let up = votes
        .cast_vote(&caller, TargetKind::Question, &question.id, VoteValue::Up)
        .await
        .unwrap();
    assert_eq!((up.votes, up.user_vote), (1, Some(1)));

    let flipped = votes
        .cast_vote(&caller, TargetKind::Question, &question.id, VoteValue::Down)
        .await
        .unwrap();
    assert_eq!(flipped.votes - up.votes, -2);
    assert_eq!(flipped.user_vote, Some(-1));

    let rows = Vote::find()
        .filter(vote::Column::UserId.eq(voter.id.as_str()))
        .count(conn.as_ref())
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let cleared = votes
        .cast_vote(&caller, TargetKind::Question, &question.id, VoteValue::Down)
        .await
        .unwrap();
    assert_eq!((cleared.votes, cleared.user_vote), (0, None));

    let stored = Question::find_by_id(question.id.clone())
        .one(conn.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.votes, stored_sum(&conn, &question.id).await);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_self_vote_leaves_no_trace() {
    let db = TestDatabase::create_unique().await.unwrap();
    let author = db.seed_user("author", UserRole::User).await.unwrap();
    let question = db.seed_question(&author.id, "Self").await.unwrap();

    let conn = db.shared();
    let result = vote_service(&conn)
        .cast_vote(
            &Caller::from(&author),
            TargetKind::Question,
            &question.id,
            VoteValue::Up,
        )
        .await;

    assert!(matches!(result, Err(AppError::SelfVoteForbidden)));
    assert_eq!(Vote::find().count(conn.as_ref()).await.unwrap(), 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_voters_do_not_lose_updates() {
    let db = TestDatabase::create_unique().await.unwrap();
    let author = db.seed_user("author", UserRole::User).await.unwrap();
    let question = db.seed_question(&author.id, "Race").await.unwrap();

    let mut voters = Vec::new();
    for i in 0..8 {
        voters.push(db.seed_user(&format!("voter{i}"), UserRole::User).await.unwrap());
    }

    let conn = db.shared();
    let votes = vote_service(&conn);

    let handles: Vec<_> = voters
        .iter()
        .map(|voter| {
            let votes = votes.clone();
            let caller = Caller::from(voter);
            let target = question.id.clone();
            tokio::spawn(async move {
                votes
                    .cast_vote(&caller, TargetKind::Question, &target, VoteValue::Up)
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = Question::find_by_id(question.id.clone())
        .one(conn.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.votes, 8);
    assert_eq!(stored.votes, stored_sum(&conn, &question.id).await);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_accepting_second_answer_moves_acceptance() {
    let db = TestDatabase::create_unique().await.unwrap();
    let asker = db.seed_user("asker", UserRole::User).await.unwrap();
    let answerer = db.seed_user("answerer", UserRole::User).await.unwrap();
    let question = db.seed_question(&asker.id, "Scenario").await.unwrap();
    let a1 = db.seed_answer(&question.id, &answerer.id).await.unwrap();
    let a2 = db.seed_answer(&question.id, &answerer.id).await.unwrap();

    let conn = db.shared();
    let acceptance = acceptance_service(&conn);
    let caller = Caller::from(&asker);

    acceptance.accept_answer(&caller, &a1.id).await.unwrap();
    acceptance.accept_answer(&caller, &a2.id).await.unwrap();
    // Accepting again leaves the same state.
    acceptance.accept_answer(&caller, &a2.id).await.unwrap();

    let accepted: Vec<String> = Answer::find()
        .filter(answer::Column::QuestionId.eq(question.id.as_str()))
        .filter(answer::Column::IsAccepted.eq(true))
        .all(conn.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(accepted, vec![a2.id.clone()]);

    let stored = Question::find_by_id(question.id.clone())
        .one(conn.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.accepted_answer_id, Some(a2.id.clone()));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_forbidden_accept_changes_nothing() {
    let db = TestDatabase::create_unique().await.unwrap();
    let asker = db.seed_user("asker", UserRole::User).await.unwrap();
    let stranger = db.seed_user("stranger", UserRole::User).await.unwrap();
    let question = db.seed_question(&asker.id, "Forbidden").await.unwrap();
    let a1 = db.seed_answer(&question.id, &stranger.id).await.unwrap();

    let conn = db.shared();
    let result = acceptance_service(&conn)
        .accept_answer(&Caller::from(&stranger), &a1.id)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let stored = Question::find_by_id(question.id.clone())
        .one(conn.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.accepted_answer_id, None);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_accept_racing_answer_delete_never_deadlocks() {
    let db = TestDatabase::create_unique().await.unwrap();
    let asker = db.seed_user("asker", UserRole::User).await.unwrap();
    let answerer = db.seed_user("answerer", UserRole::User).await.unwrap();
    let question = db.seed_question(&asker.id, "Contended").await.unwrap();

    let conn = db.shared();
    let acceptance = acceptance_service(&conn);
    let answers = answer_service(&conn);
    let asker = Caller::from(&asker);
    let answerer = Caller::from(&answerer);

    for _ in 0..20 {
        let target = db.seed_answer(&question.id, &answerer.id).await.unwrap();

        let (accepted, deleted) = tokio::join!(
            acceptance.accept_answer(&asker, &target.id),
            answers.delete(&answerer, &target.id),
        );

        deleted.unwrap();
        assert!(
            matches!(accepted, Ok(()) | Err(AppError::AnswerNotFound(_))),
            "unexpected accept outcome: {accepted:?}"
        );

        let stored = Question::find_by_id(question.id.clone())
            .one(conn.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.accepted_answer_id, None);
        assert!(
            Answer::find_by_id(target.id.clone())
                .one(conn.as_ref())
                .await
                .unwrap()
                .is_none()
        );
    }

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_question_delete_racing_answer_vote_leaves_no_votes() {
    let db = TestDatabase::create_unique().await.unwrap();
    let asker = db.seed_user("asker", UserRole::User).await.unwrap();
    let answerer = db.seed_user("answerer", UserRole::User).await.unwrap();
    let voter = db.seed_user("voter", UserRole::User).await.unwrap();

    let conn = db.shared();
    let votes = vote_service(&conn);
    let questions = question_service(&conn);
    let asker = Caller::from(&asker);
    let voter = Caller::from(&voter);

    for i in 0..20 {
        let question = db.seed_question(&asker.id, &format!("Doomed {i}")).await.unwrap();
        let target = db.seed_answer(&question.id, &answerer.id).await.unwrap();

        let (voted, deleted) = tokio::join!(
            votes.cast_vote(&voter, TargetKind::Answer, &target.id, VoteValue::Up),
            questions.delete(&asker, &question.id),
        );

        deleted.unwrap();
        assert!(
            matches!(voted, Ok(_) | Err(AppError::AnswerNotFound(_))),
            "unexpected vote outcome: {voted:?}"
        );

        let left = Vote::find()
            .filter(vote::Column::TargetId.is_in([target.id.as_str(), question.id.as_str()]))
            .count(conn.as_ref())
            .await
            .unwrap();
        assert_eq!(left, 0);
    }

    db.drop_database().await.unwrap();
}
