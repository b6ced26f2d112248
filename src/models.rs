use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub emoji: String,
}

impl Subject {
    pub fn new(id: impl Into<String>, name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emoji: emoji.into(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.emoji, self.name)
    }
}

pub fn default_subjects() -> Vec<Subject> {
    vec![
        Subject::new("dsa", "DSA", "📚"),
        Subject::new("java", "Java", "☕"),
        Subject::new("webdev", "Web Dev", "🌐"),
        Subject::new("projects", "Projects", "🚀"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
}

impl Checkpoint {
    pub fn bullet_items(&self) -> Vec<&str> {
        self.description
            .lines()
            .map(|line| {
                line.trim()
                    .trim_start_matches(['-', '*', '•'])
                    .trim_start()
            })
            .filter(|line| !line.is_empty())
            .collect()
    }

    pub fn is_overdue(&self, today: &str) -> bool {
        !self.completed && self.date.as_str() < today
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheckpoint {
    pub title: String,
    pub description: String,
    pub date: String,
    pub priority: Priority,
}

impl NewCheckpoint {
    pub fn into_checkpoint(self, id: i64) -> Checkpoint {
        Checkpoint {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            priority: self.priority,
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub progress_percent: u32,
    pub overdue_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    MissingDate,
    InvalidDate(String),
    UnknownPriority(String),
    EmptySubjectName,
    EmptySubjectEmoji,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Please enter a title"),
            Self::MissingDate => write!(f, "Please select a date"),
            Self::InvalidDate(value) => {
                write!(f, "date must be formatted as YYYY-MM-DD: {value}")
            }
            Self::UnknownPriority(value) => {
                write!(f, "priority must be 'low', 'medium' or 'high': {value}")
            }
            Self::EmptySubjectName => write!(f, "Please enter a subject name"),
            Self::EmptySubjectEmoji => write!(f, "Please enter an emoji"),
        }
    }
}

impl Error for ValidationError {}

#[derive(Debug, Deserialize)]
pub struct SubjectRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub emoji: String,
}

impl SubjectRequest {
    pub fn validate(&self) -> Result<(String, String), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptySubjectName);
        }
        let emoji = self.emoji.trim();
        if emoji.is_empty() {
            return Err(ValidationError::EmptySubjectEmoji);
        }
        Ok((name.to_string(), emoji.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckpointRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub priority: Option<String>,
}

impl CheckpointRequest {
    pub fn validate(&self) -> Result<NewCheckpoint, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let date = validate_date(&self.date)?;
        let priority = match self.priority.as_deref().map(str::trim) {
            None | Some("") => Priority::default(),
            Some(value) => value.parse()?,
        };

        Ok(NewCheckpoint {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            date,
            priority,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckpointUpdate {
    #[serde(flatten)]
    pub fields: CheckpointRequest,
    #[serde(default)]
    pub completed: bool,
}

impl CheckpointUpdate {
    pub fn validate(&self, id: i64) -> Result<Checkpoint, ValidationError> {
        let mut checkpoint = self.fields.validate()?.into_checkpoint(id);
        checkpoint.completed = self.completed;
        Ok(checkpoint)
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub completed: bool,
}

fn validate_date(raw: &str) -> Result<String, ValidationError> {
    let date = raw.trim();
    if date.is_empty() {
        return Err(ValidationError::MissingDate);
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;
    Ok(date.to_string())
}
