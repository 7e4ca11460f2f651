use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;

/// Runtime languages a submission can be judged in.
///
/// Closed set: every variant must have a judge runtime id in `judge_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Java, Language::Cpp];

    /// Parse a caller-supplied language key. Keys match verbatim ("python", "java", "cpp").
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "python" => Some(Language::Python),
            "java" => Some(Language::Java),
            "cpp" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    /// Judge0 runtime identifier for this language
    pub fn judge_id(&self) -> u32 {
        match self {
            Language::Python => 71,
            Language::Java => 62,
            Language::Cpp => 54,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Language tag stored on a question. Daily challenges are tagged `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionLanguage {
    Python,
    Java,
    Cpp,
    All,
}

impl QuestionLanguage {
    pub fn from_key(key: &str) -> Option<Self> {
        if key == "all" {
            return Some(QuestionLanguage::All);
        }
        Language::from_key(key).map(Self::from)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionLanguage::Python => "python",
            QuestionLanguage::Java => "java",
            QuestionLanguage::Cpp => "cpp",
            QuestionLanguage::All => "all",
        }
    }
}

impl From<Language> for QuestionLanguage {
    fn from(language: Language) -> Self {
        match language {
            Language::Python => QuestionLanguage::Python,
            Language::Java => QuestionLanguage::Java,
            Language::Cpp => QuestionLanguage::Cpp,
        }
    }
}

impl fmt::Display for QuestionLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
    Expert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

/// A stored challenge. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub language: QuestionLanguage,
    pub level: u8,
    pub difficulty: Difficulty,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_output: Option<String>,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub starter_code: BTreeMap<Language, String>,
    #[serde(default)]
    pub is_daily_challenge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing view of a question. Carries no test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub id: Uuid,
    pub language: QuestionLanguage,
    pub level: u8,
    pub difficulty: Difficulty,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_output: Option<String>,
    pub topic: String,
    pub concepts: Vec<String>,
    pub starter_code: BTreeMap<Language, String>,
    pub is_daily_challenge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Question> for QuestionSummary {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            language: q.language,
            level: q.level,
            difficulty: q.difficulty,
            title: q.title,
            description: q.description,
            sample_input: q.sample_input,
            sample_output: q.sample_output,
            topic: q.topic,
            concepts: q.concepts,
            starter_code: q.starter_code,
            is_daily_challenge: q.is_daily_challenge,
            challenge_date: q.challenge_date,
            created_at: q.created_at,
        }
    }
}

/// Question as authored in a seed file: everything but identity and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub language: QuestionLanguage,
    pub level: u8,
    pub difficulty: Difficulty,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub sample_input: Option<String>,
    #[serde(default)]
    pub sample_output: Option<String>,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub starter_code: BTreeMap<Language, String>,
}

impl QuestionDraft {
    /// Check the fields storage relies on.
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.level) {
            return Err(format!(
                "level {} outside {}..={}",
                self.level, MIN_LEVEL, MAX_LEVEL
            ));
        }
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        if self.test_cases.is_empty() {
            return Err(format!("question '{}' has no test cases", self.title));
        }
        Ok(())
    }

    pub fn into_question(self) -> Question {
        Question {
            id: Uuid::new_v4(),
            language: self.language,
            level: self.level,
            difficulty: self.difficulty,
            title: self.title,
            description: self.description,
            sample_input: self.sample_input,
            sample_output: self.sample_output,
            test_cases: self.test_cases,
            topic: self.topic,
            concepts: self.concepts,
            starter_code: self.starter_code,
            is_daily_challenge: false,
            challenge_date: None,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of one test case within a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub input: String,
    pub expected: String,
    pub actual: Option<String>,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub all_passed: bool,
    pub results: Vec<TestResult>,
}
