use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Board column a task lives in. The declaration order is the column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Proposed,
    InProgress,
    Testing,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [Self::Proposed, Self::InProgress, Self::Testing, Self::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::InProgress => "in_progress",
            Self::Testing => "testing",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "proposed" => Some(Self::Proposed),
            "in_progress" => Some(Self::InProgress),
            "testing" => Some(Self::Testing),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    /// Like `from_str`, but unknown values are a validation error.
    pub fn parse(s: &str) -> Result<Self, BoardError> {
        Self::from_str(s).ok_or_else(|| BoardError::unknown_status(s))
    }

    /// Column heading used by the text renderer.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Proposed => "Proposed",
            Self::InProgress => "In Progress",
            Self::Testing => "Testing",
            Self::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self, BoardError> {
        Self::from_str(s).ok_or_else(|| {
            BoardError::validation(format!(
                "Unknown priority '{s}'. Expected one of: low, medium, high"
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    /// Past due and not finished. Dates compare at day granularity.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| due < today)
    }
}

/// Fields supplied by the add form or an import document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Only imports set this; the add form always starts in `proposed`.
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Client-side guard run before anything reaches the backend.
    pub fn validate(&self) -> Result<(), BoardError> {
        validate_title(&self.title)
    }

    pub fn initial_status(&self) -> TaskStatus {
        self.status.unwrap_or(TaskStatus::Proposed)
    }
}

pub fn validate_title(title: &str) -> Result<(), BoardError> {
    if title.trim().is_empty() {
        return Err(BoardError::validation("Task title must not be empty"));
    }
    Ok(())
}

/// Update of an optional column: keep the stored value, replace it, or null it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<T> FieldUpdate<T> {
    pub fn from_flags(value: Option<T>, clear: bool) -> Self {
        match (value, clear) {
            (_, true) => Self::Clear,
            (Some(v), false) => Self::Set(v),
            (None, false) => Self::Keep,
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Keep => current,
            Self::Set(v) => Some(v),
            Self::Clear => None,
        }
    }
}

/// Partial update sent to `TaskBackend::update_task`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: FieldUpdate<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignee: FieldUpdate<String>,
    pub due_date: FieldUpdate<NaiveDate>,
    pub image_url: FieldUpdate<String>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_keep()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assignee.is_keep()
            && self.due_date.is_keep()
            && self.image_url.is_keep()
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if let Some(ref title) = self.title {
            validate_title(title)?;
        }
        Ok(())
    }

    /// Apply this patch to a local copy. Timestamps are left to the backend.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.trim().to_string();
        }
        task.description = self.description.clone().apply(task.description.take());
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        task.assignee = self.assignee.clone().apply(task.assignee.take());
        task.due_date = self.due_date.clone().apply(task.due_date.take());
        task.image_url = self.image_url.clone().apply(task.image_url.take());
    }
}

pub fn parse_due_date(s: &str) -> Result<NaiveDate, BoardError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| BoardError::validation(format!("Invalid date '{s}'. Expected YYYY-MM-DD")))
}
