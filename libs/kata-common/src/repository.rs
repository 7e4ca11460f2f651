//! Storage abstraction over challenge documents.
//!
//! Two backends share one contract: [`crate::redis::RedisQuestionRepository`]
//! for deployments and [`InMemoryQuestionRepository`] for local runs and tests.
//! Both enforce "one daily challenge per date" at insert time and report a
//! lost race as [`RepositoryError::Conflict`].

use crate::types::{Question, QuestionLanguage, QuestionSummary};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("a daily challenge already exists for {date}")]
    Conflict { date: String },

    #[error("question {0} is not a daily challenge")]
    NotDaily(Uuid),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(_: PoisonError<T>) -> Self {
        RepositoryError::Poisoned
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Questions for a language/level pair, oldest first, without test cases
    async fn find_by_language_and_level(
        &self,
        language: QuestionLanguage,
        level: u8,
    ) -> RepositoryResult<Vec<QuestionSummary>>;

    /// Full record including test cases
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Question>>;

    async fn find_daily_by_date(&self, date: &str) -> RepositoryResult<Option<Question>>;

    /// Insert a daily challenge. Fails with `Conflict` when the date is taken;
    /// the losing record is not persisted.
    async fn insert_daily(&self, question: &Question) -> RepositoryResult<()>;

    /// Insert a regular (non-daily) question
    async fn insert(&self, question: &Question) -> RepositoryResult<()>;

    /// Remove every question, index and daily marker
    async fn clear(&self) -> RepositoryResult<()>;
}

pub(crate) fn daily_date(question: &Question) -> RepositoryResult<&str> {
    match (&question.challenge_date, question.is_daily_challenge) {
        (Some(date), true) => Ok(date.as_str()),
        _ => Err(RepositoryError::NotDaily(question.id)),
    }
}

#[derive(Default)]
struct MemoryState {
    questions: HashMap<Uuid, Question>,
    daily: HashMap<String, Uuid>,
}

/// Process-local repository. A single mutex guards both maps, so the
/// daily-date check and the insert happen atomically.
#[derive(Default)]
pub struct InMemoryQuestionRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.questions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn find_by_language_and_level(
        &self,
        language: QuestionLanguage,
        level: u8,
    ) -> RepositoryResult<Vec<QuestionSummary>> {
        let state = self.state.lock()?;
        let mut matches: Vec<&Question> = state
            .questions
            .values()
            .filter(|q| q.language == language && q.level == level)
            .collect();
        matches.sort_by_key(|q| q.created_at);

        Ok(matches
            .into_iter()
            .cloned()
            .map(QuestionSummary::from)
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Question>> {
        Ok(self.state.lock()?.questions.get(&id).cloned())
    }

    async fn find_daily_by_date(&self, date: &str) -> RepositoryResult<Option<Question>> {
        let state = self.state.lock()?;
        Ok(state
            .daily
            .get(date)
            .and_then(|id| state.questions.get(id))
            .cloned())
    }

    async fn insert_daily(&self, question: &Question) -> RepositoryResult<()> {
        let date = daily_date(question)?;
        let mut state = self.state.lock()?;

        if state.daily.contains_key(date) {
            return Err(RepositoryError::Conflict {
                date: date.to_string(),
            });
        }

        state.daily.insert(date.to_string(), question.id);
        state.questions.insert(question.id, question.clone());
        Ok(())
    }

    async fn insert(&self, question: &Question) -> RepositoryResult<()> {
        self.state
            .lock()?
            .questions
            .insert(question.id, question.clone());
        Ok(())
    }

    async fn clear(&self) -> RepositoryResult<()> {
        let mut state = self.state.lock()?;
        state.questions.clear();
        state.daily.clear();
        Ok(())
    }
}
