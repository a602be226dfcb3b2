//! Question service.

use std::collections::{HashMap, HashSet};

use crate::services::caller::Caller;
use chrono::{Duration, Utc};
use sea_orm::Set;
use serde::Deserialize;
use stackit_common::{AppError, AppResult, IdGenerator, PageRequest, Paged, config::QuestionsConfig};
use stackit_db::{
    entities::{TargetKind, answer, question, tag, user},
    repositories::{
        AnswerRepository, QuestionFilter, QuestionRepository, QuestionSort, QuestionViewRepository,
        TagRepository, UserRepository, VoteRepository,
    },
};
use tracing::info;
use validator::Validate;

/// Longest accepted tag name.
const MAX_TAG_LENGTH: usize = 50;

/// Input for creating a question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for updating a question. Tags replace the current set.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for listing questions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuestionsInput {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub tag: Option<String>,
    #[serde(default)]
    pub sort: QuestionSort,
}

/// A question with its tags.
#[derive(Debug, Clone)]
pub struct TaggedQuestion {
    pub question: question::Model,
    pub tags: Vec<tag::Model>,
}

/// A row of the question list.
#[derive(Debug, Clone)]
pub struct QuestionSummary {
    pub question: question::Model,
    pub author: Option<user::Model>,
    pub tags: Vec<tag::Model>,
    pub user_vote: Option<i16>,
}

/// An answer as shown under its question.
#[derive(Debug, Clone)]
pub struct AnswerView {
    pub answer: answer::Model,
    pub author: Option<user::Model>,
    pub user_vote: Option<i16>,
    pub can_edit: bool,
}

/// Everything the question page shows.
#[derive(Debug, Clone)]
pub struct QuestionDetail {
    pub question: question::Model,
    pub author: Option<user::Model>,
    pub tags: Vec<tag::Model>,
    pub answers: Vec<AnswerView>,
    pub user_vote: Option<i16>,
    pub can_edit: bool,
}

/// Trim, lowercase and de-duplicate tag names, keeping first-seen order.
pub fn normalize_tags(raw: &[String], max_tags: usize) -> AppResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for name in raw {
        let name = name.trim().to_lowercase();
        if name.is_empty() || !seen.insert(name.clone()) {
            continue;
        }
        if name.chars().count() > MAX_TAG_LENGTH {
            return Err(AppError::Validation(format!(
                "Tag names must be at most {MAX_TAG_LENGTH} characters"
            )));
        }
        tags.push(name);
    }

    if tags.len() > max_tags {
        return Err(AppError::Validation(format!(
            "Maximum {max_tags} tags allowed"
        )));
    }

    Ok(tags)
}

/// Question service for business logic.
#[derive(Clone)]
pub struct QuestionService {
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    tag_repo: TagRepository,
    vote_repo: VoteRepository,
    view_repo: QuestionViewRepository,
    user_repo: UserRepository,
    settings: QuestionsConfig,
    id_gen: IdGenerator,
}

impl QuestionService {
    /// Create a new question service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
        tag_repo: TagRepository,
        vote_repo: VoteRepository,
        view_repo: QuestionViewRepository,
        user_repo: UserRepository,
        settings: QuestionsConfig,
    ) -> Self {
        Self {
            question_repo,
            answer_repo,
            tag_repo,
            vote_repo,
            view_repo,
            user_repo,
            settings,
            id_gen: IdGenerator::new(),
        }
    }

    /// Ask a question. The question, its tags and the links commit together.
    pub async fn create(
        &self,
        caller: &Caller,
        input: CreateQuestionInput,
    ) -> AppResult<TaggedQuestion> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let tag_names = normalize_tags(&input.tags, self.settings.max_tags)?;

        let txn = self.question_repo.begin().await?;

        let model = question::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(caller.id.clone()),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description),
            votes: Set(0),
            view_count: Set(0),
            answers_count: Set(0),
            accepted_answer_id: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let question = self.question_repo.insert(&txn, model).await?;

        let tags = self.attach_tags(&txn, &question.id, &tag_names).await?;

        stackit_db::commit(txn).await?;

        info!(question_id = %question.id, user_id = %caller.id, "Question created");
        Ok(TaggedQuestion { question, tags })
    }

    /// Edit a question's text and replace its tags. Owner or admin only.
    pub async fn update(
        &self,
        caller: &Caller,
        question_id: &str,
        input: UpdateQuestionInput,
    ) -> AppResult<TaggedQuestion> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let tag_names = normalize_tags(&input.tags, self.settings.max_tags)?;

        let txn = self.question_repo.begin().await?;

        let current = self
            .question_repo
            .lock_by_id(&txn, question_id)
            .await?
            .ok_or_else(|| AppError::QuestionNotFound(question_id.to_string()))?;

        if !caller.can_modify(&current.user_id) {
            return Err(AppError::Forbidden(
                "Not allowed to edit this question".to_string(),
            ));
        }

        let mut active: question::ActiveModel = current.into();
        active.title = Set(input.title.trim().to_string());
        active.description = Set(input.description);
        active.updated_at = Set(Some(Utc::now().into()));
        let question = self.question_repo.update(&txn, active).await?;

        self.tag_repo.unlink_all(&txn, question_id).await?;
        let tags = self.attach_tags(&txn, question_id, &tag_names).await?;

        stackit_db::commit(txn).await?;

        info!(question_id = %question_id, user_id = %caller.id, "Question updated");
        Ok(TaggedQuestion { question, tags })
    }

    async fn attach_tags(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        question_id: &str,
        names: &[String],
    ) -> AppResult<Vec<tag::Model>> {
        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            tags.push(self.tag_repo.get_or_create(txn, name).await?);
        }
        let ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();
        self.tag_repo.link(txn, question_id, &ids).await?;
        Ok(tags)
    }

    /// Delete a question with its answers and every vote on either. Owner or admin only.
    pub async fn delete(&self, caller: &Caller, question_id: &str) -> AppResult<()> {
        let txn = self.question_repo.begin().await?;

        let question = self
            .question_repo
            .lock_by_id(&txn, question_id)
            .await?
            .ok_or_else(|| AppError::QuestionNotFound(question_id.to_string()))?;

        if !caller.can_modify(&question.user_id) {
            return Err(AppError::Forbidden(
                "Not allowed to delete this question".to_string(),
            ));
        }

        let answer_ids = self.answer_repo.ids_by_question(&txn, question_id).await?;
        self.vote_repo
            .delete_for_targets(&txn, TargetKind::Answer, &answer_ids)
            .await?;
        self.vote_repo
            .delete_for_targets(&txn, TargetKind::Question, &[question_id.to_string()])
            .await?;
        self.question_repo.delete(&txn, question_id).await?;

        stackit_db::commit(txn).await?;

        info!(question_id = %question_id, deleted_by = %caller.id, "Question deleted");
        Ok(())
    }

    /// Count a view of the question.
    ///
    /// Anonymous views always count. A signed-in viewer counts at most once per
    /// de-duplication window and never on their own question.
    pub async fn record_view(&self, question_id: &str, viewer: Option<&Caller>) -> AppResult<()> {
        let question = self.question_repo.get_by_id(question_id).await?;

        let Some(viewer) = viewer else {
            return self.question_repo.increment_view_count(question_id).await;
        };

        let now = Utc::now();
        if viewer.id != question.user_id {
            let window = Duration::seconds(self.settings.view_dedup_window_secs);
            let recent = self
                .view_repo
                .find(&viewer.id, question_id)
                .await?
                .is_some_and(|view| now.signed_duration_since(view.viewed_at) < window);

            if !recent {
                self.question_repo.increment_view_count(question_id).await?;
            }
        }

        self.view_repo
            .upsert(&viewer.id, question_id, now.into())
            .await
    }

    /// Load a question with its author, tags, answers and the viewer's votes.
    pub async fn get(&self, question_id: &str, viewer: Option<&Caller>) -> AppResult<QuestionDetail> {
        let question = self.question_repo.get_by_id(question_id).await?;
        let author = self.user_repo.find_by_id(&question.user_id).await?;
        let tags = self
            .tag_repo
            .find_by_questions(&[question.id.clone()])
            .await?
            .remove(&question.id)
            .unwrap_or_default();

        let answers = self.answer_repo.find_by_question(question_id).await?;
        let author_ids: Vec<String> = answers
            .iter()
            .map(|a| a.user_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let (user_vote, answer_votes) = match viewer {
            Some(viewer) => {
                let question_vote = self
                    .vote_repo
                    .find_by_user_and_targets(&viewer.id, TargetKind::Question, &[question.id.clone()])
                    .await?
                    .first()
                    .map(|v| v.value);
                let answer_ids: Vec<String> = answers.iter().map(|a| a.id.clone()).collect();
                let answer_votes: HashMap<String, i16> = self
                    .vote_repo
                    .find_by_user_and_targets(&viewer.id, TargetKind::Answer, &answer_ids)
                    .await?
                    .into_iter()
                    .map(|v| (v.target_id, v.value))
                    .collect();
                (question_vote, answer_votes)
            }
            None => (None, HashMap::new()),
        };

        let answers = answers
            .into_iter()
            .map(|answer| AnswerView {
                author: authors.get(&answer.user_id).cloned(),
                user_vote: answer_votes.get(&answer.id).copied(),
                can_edit: viewer.is_some_and(|v| v.can_modify(&answer.user_id)),
                answer,
            })
            .collect();

        Ok(QuestionDetail {
            can_edit: viewer.is_some_and(|v| v.can_modify(&question.user_id)),
            question,
            author,
            tags,
            answers,
            user_vote,
        })
    }

    /// Search, filter, sort and paginate questions.
    pub async fn list(
        &self,
        input: ListQuestionsInput,
        viewer: Option<&Caller>,
    ) -> AppResult<Paged<QuestionSummary>> {
        let page = PageRequest::new(
            input.page,
            input.limit,
            self.settings.default_page_size,
            self.settings.max_page_size,
        );
        let filter = QuestionFilter {
            search: input.search,
            tag: input.tag,
            sort: input.sort,
        };

        let (questions, total) = self.question_repo.list(&filter, page).await?;

        let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        let author_ids: Vec<String> = questions
            .iter()
            .map(|q| q.user_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let mut tags = self.tag_repo.find_by_questions(&ids).await?;
        let votes: HashMap<String, i16> = match viewer {
            Some(viewer) => self
                .vote_repo
                .find_by_user_and_targets(&viewer.id, TargetKind::Question, &ids)
                .await?
                .into_iter()
                .map(|v| (v.target_id, v.value))
                .collect(),
            None => HashMap::new(),
        };

        let items = questions
            .into_iter()
            .map(|question| QuestionSummary {
                author: authors.get(&question.user_id).cloned(),
                tags: tags.remove(&question.id).unwrap_or_default(),
                user_vote: votes.get(&question.id).copied(),
                question,
            })
            .collect();

        Ok(Paged::new(items, page, total))
    }
}
