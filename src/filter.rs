use crate::models::{Checkpoint, Priority};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityFilter {
    #[default]
    All,
    Low,
    Medium,
    High,
}

impl PriorityFilter {
    pub fn matches(self, priority: Priority) -> bool {
        match self {
            Self::All => true,
            Self::Low => priority == Priority::Low,
            Self::Medium => priority == Priority::Medium,
            Self::High => priority == Priority::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewFilter {
    Priority(PriorityFilter),
    Search(String),
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self::Priority(PriorityFilter::All)
    }
}

impl ViewFilter {
    /// A non-blank search term wins over the priority selection.
    pub fn from_query(query: &ViewQuery) -> Self {
        match query.q.as_deref() {
            Some(term) if !term.trim().is_empty() => Self::Search(term.to_string()),
            _ => Self::Priority(query.priority.unwrap_or_default()),
        }
    }

    pub fn apply(&self, checkpoints: &[Checkpoint]) -> Vec<Checkpoint> {
        match self {
            Self::Priority(filter) => filter_by_priority(checkpoints, *filter),
            Self::Search(term) => search(checkpoints, term),
        }
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::Priority(PriorityFilter::All) => "No checkpoints yet",
            Self::Priority(_) => "No checkpoints with this priority",
            Self::Search(_) => "No checkpoints found",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub tab: Option<String>,
    pub priority: Option<PriorityFilter>,
    pub q: Option<String>,
}

pub fn filter_by_priority(checkpoints: &[Checkpoint], filter: PriorityFilter) -> Vec<Checkpoint> {
    checkpoints
        .iter()
        .filter(|checkpoint| filter.matches(checkpoint.priority))
        .cloned()
        .collect()
}

pub fn search(checkpoints: &[Checkpoint], term: &str) -> Vec<Checkpoint> {
    let term = term.to_lowercase();
    checkpoints
        .iter()
        .filter(|checkpoint| {
            checkpoint.title.to_lowercase().contains(&term)
                || checkpoint.description.to_lowercase().contains(&term)
        })
        .cloned()
        .collect()
}
