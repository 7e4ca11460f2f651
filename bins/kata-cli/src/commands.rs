// CLI commands for managing the question bank
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use kata_common::config::Config;
use kata_common::redis::RedisQuestionRepository;
use kata_common::repository::QuestionRepository;
use kata_common::types::{Question, QuestionDraft};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

/// Connect to the Redis-backed question bank named by `REDIS_URL`
async fn connect() -> Result<RedisQuestionRepository> {
    let config = Config::from_env().context("Invalid configuration")?;
    debug!(redis_url = %config.redis_url, "Connecting to question bank");
    RedisQuestionRepository::connect(&config.redis_url)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", config.redis_url))
}

/// Parse and validate a seed file. Nothing is stored unless every entry is valid.
pub fn parse_seed(content: &str) -> Result<Vec<Question>> {
    let drafts: Vec<QuestionDraft> =
        serde_json::from_str(content).context("Failed to parse seed file")?;

    if drafts.is_empty() {
        bail!("Seed file contains no questions");
    }

    for (index, draft) in drafts.iter().enumerate() {
        if let Err(reason) = draft.validate() {
            bail!("Question #{} is invalid: {}", index + 1, reason);
        }
    }

    Ok(drafts.into_iter().map(QuestionDraft::into_question).collect())
}

/// Accept `YYYY-MM-DD` only, defaulting to today's UTC date
pub fn resolve_date(date: Option<&str>) -> Result<String> {
    match date {
        Some(raw) => {
            let parsed = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))?;
            Ok(parsed.format("%Y-%m-%d").to_string())
        }
        None => Ok(Utc::now().date_naive().format("%Y-%m-%d").to_string()),
    }
}

/// Seed questions from a JSON file
pub async fn seed(file: &str, clear_first: bool) -> Result<()> {
    let path = Path::new(file);
    println!("🌱 Seeding questions from {}", path.display());

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let questions = parse_seed(&content)?;

    let repo = connect().await?;
    if clear_first {
        println!("🗑️  Clearing existing questions...");
        repo.clear().await.context("Failed to clear question bank")?;
    }

    for question in &questions {
        repo.insert(question)
            .await
            .with_context(|| format!("Failed to insert '{}'", question.title))?;
        println!(
            "  ✓ {:<40} {:<7} level {}",
            question.title, question.language, question.level
        );
    }

    println!("✅ Seeded {} question(s)", questions.len());
    Ok(())
}

/// Remove every stored question
pub async fn clear(yes: bool) -> Result<()> {
    if !yes {
        print!("This removes every question and daily challenge. Continue? [y/N] ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("❌ Aborted");
            return Ok(());
        }
    }

    let repo = connect().await?;
    repo.clear().await.context("Failed to clear question bank")?;
    println!("✅ Question bank cleared");
    Ok(())
}

/// Print the daily challenge stored for a date
pub async fn show_daily(date: Option<&str>) -> Result<()> {
    let date = resolve_date(date)?;
    let repo = connect().await?;

    match repo.find_daily_by_date(&date).await? {
        Some(question) => {
            println!("📅 Daily challenge for {}\n", date);
            println!("{}", serde_json::to_string_pretty(&question)?);
        }
        None => {
            println!("No daily challenge stored for {}", date);
            println!("\n💡 One is generated on the first GET /api/questions/daily-challenge of the day");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kata_common::types::QuestionLanguage;

    const SEED: &str = r#"[
        {
            "language": "python",
            "level": 1,
            "difficulty": "easy",
            "title": "Reverse an Array",
            "description": "Write a function to reverse an array in-place.",
            "sampleInput": "[1,2,3]",
            "sampleOutput": "[3,2,1]",
            "testCases": [{ "input": "[1,2,3]", "expectedOutput": "[3,2,1]" }],
            "topic": "Arrays",
            "concepts": ["Two pointers"],
            "starterCode": { "python": "def reverse(arr):\n    pass" }
        }
    ]"#;

    #[test]
    fn test_parse_seed() {
        let questions = parse_seed(SEED).unwrap();
        assert_eq!(questions.len(), 1);

        let question = &questions[0];
        assert_eq!(question.language, QuestionLanguage::Python);
        assert!(!question.is_daily_challenge);
        assert_eq!(question.challenge_date, None);
        assert_eq!(question.test_cases[0].expected_output, "[3,2,1]");
    }

    #[test]
    fn test_parse_seed_rejects_invalid_entries() {
        let mut value: serde_json::Value = serde_json::from_str(SEED).unwrap();
        value[0]["level"] = serde_json::json!(7);
        let err = parse_seed(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("Question #1"));

        let mut value: serde_json::Value = serde_json::from_str(SEED).unwrap();
        value[0]["testCases"] = serde_json::json!([]);
        assert!(parse_seed(&value.to_string()).is_err());

        assert!(parse_seed("[]").is_err());
        assert!(parse_seed("{ not json").is_err());
    }

    #[test]
    fn test_bundled_seed_file_is_valid() {
        let content = include_str!("../../../data/questions.json");
        let questions = parse_seed(content).unwrap();
        assert!(questions.iter().all(|q| !q.test_cases.is_empty()));
    }

    #[test]
    fn test_resolve_date() {
        assert_eq!(resolve_date(Some("2026-10-17")).unwrap(), "2026-10-17");
        assert!(resolve_date(Some("17/10/2026")).is_err());
        assert!(resolve_date(Some("2026-02-30")).is_err());
        assert_eq!(resolve_date(None).unwrap().len(), 10);
    }
}
