use crate::repository::{daily_date, QuestionRepository, RepositoryError, RepositoryResult};
use crate::types::{Question, QuestionLanguage, QuestionSummary};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, warn};
use uuid::Uuid;

/// Redis key layout - the only place key names are built, so the API and
/// the CLI always agree on where a question lives.

pub const KEY_PREFIX: &str = "kata";
pub const QUESTION_PREFIX: &str = "kata:question";
pub const INDEX_PREFIX: &str = "kata:index";
pub const DAILY_PREFIX: &str = "kata:daily";

/// Full question record (JSON)
pub fn question_key(id: &Uuid) -> String {
    format!("{}:{}", QUESTION_PREFIX, id)
}

/// Sorted set of question ids for a language/level, scored by creation time
pub fn index_key(language: QuestionLanguage, level: u8) -> String {
    format!("{}:{}:{}", INDEX_PREFIX, language, level)
}

/// Daily challenge marker holding the question id for a date
pub fn daily_key(date: &str) -> String {
    format!("{}:{}", DAILY_PREFIX, date)
}

/// Claim the date marker, then write record and index entry. Runs as one
/// script, so a losing or failed insert writes nothing.
/// KEYS: daily marker, question record, index. ARGV: id, payload, score.
const INSERT_DAILY_SCRIPT: &str = r#"
if not redis.call('SET', KEYS[1], ARGV[1], 'NX') then
    return 0
end
redis.call('SET', KEYS[2], ARGV[2])
redis.call('ZADD', KEYS[3], ARGV[3], ARGV[1])
return 1
"#;

pub struct RedisQuestionRepository {
    conn: ConnectionManager,
}

impl RedisQuestionRepository {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(redis_url: &str) -> RepositoryResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }

    async fn load(&self, id: &Uuid) -> RepositoryResult<Option<Question>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(question_key(id)).await?;
        payload
            .map(|data| serde_json::from_str(&data).map_err(RepositoryError::from))
            .transpose()
    }

    /// Write the record and its listing index entry in one transaction
    async fn store(&self, question: &Question) -> RepositoryResult<()> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(question)?;

        redis::pipe()
            .atomic()
            .set(question_key(&question.id), payload)
            .ignore()
            .zadd(
                index_key(question.language, question.level),
                question.id.to_string(),
                question.created_at.timestamp_millis(),
            )
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for RedisQuestionRepository {
    async fn find_by_language_and_level(
        &self,
        language: QuestionLanguage,
        level: u8,
    ) -> RepositoryResult<Vec<QuestionSummary>> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrange(index_key(language, level), 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = ids
            .iter()
            .filter_map(|id| match Uuid::parse_str(id) {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(question_id = %id, "Index holds an invalid question id");
                    None
                }
            })
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(question_key).collect();
        let payloads: Vec<Option<String>> =
            redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;

        let mut summaries = Vec::with_capacity(payloads.len());
        for (id, payload) in ids.iter().zip(payloads) {
            match payload {
                Some(data) => {
                    let question: Question = serde_json::from_str(&data)?;
                    summaries.push(QuestionSummary::from(question));
                }
                None => warn!(question_id = %id, "Index entry points at a missing question"),
            }
        }
        Ok(summaries)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Question>> {
        self.load(&id).await
    }

    async fn find_daily_by_date(&self, date: &str) -> RepositoryResult<Option<Question>> {
        let mut conn = self.conn.clone();
        let id: Option<String> = conn.get(daily_key(date)).await?;

        let Some(id) = id else {
            return Ok(None);
        };
        match Uuid::parse_str(&id) {
            Ok(id) => self.load(&id).await,
            Err(e) => {
                warn!(date, error = %e, "Daily marker holds an invalid question id");
                Ok(None)
            }
        }
    }

    async fn insert_daily(&self, question: &Question) -> RepositoryResult<()> {
        let date = daily_date(question)?;
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(question)?;

        let inserted: i32 = redis::Script::new(INSERT_DAILY_SCRIPT)
            .key(daily_key(date))
            .key(question_key(&question.id))
            .key(index_key(question.language, question.level))
            .arg(question.id.to_string())
            .arg(payload)
            .arg(question.created_at.timestamp_millis())
            .invoke_async(&mut conn)
            .await?;

        if inserted == 0 {
            debug!(date, question_id = %question.id, "Daily marker already taken");
            return Err(RepositoryError::Conflict {
                date: date.to_string(),
            });
        }
        Ok(())
    }

    async fn insert(&self, question: &Question) -> RepositoryResult<()> {
        self.store(question).await
    }

    async fn clear(&self) -> RepositoryResult<()> {
        let mut conn = self.conn.clone();
        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter = conn
                .scan_match::<_, String>(format!("{}:*", KEY_PREFIX))
                .await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        for chunk in keys.chunks(500) {
            let _: () = conn.del(chunk.to_vec()).await?;
        }
        debug!(removed = keys.len(), "Cleared question bank");
        Ok(())
    }
}
