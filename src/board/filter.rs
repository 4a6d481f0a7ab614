//! Filter and search over the task collection.
//!
//! Everything here is pure: the same tasks, filter and `today` always give the
//! same columns. All active predicates are combined with AND.

use chrono::{Duration, NaiveDate};

use crate::error::BoardError;
use crate::models::{Priority, Task, TaskStatus};

/// Convenience predicate layered on top of the general filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuickFilter {
    #[default]
    All,
    Overdue,
    ThisWeek,
    Mine,
}

impl QuickFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Overdue => "overdue",
            Self::ThisWeek => "this-week",
            Self::Mine => "my",
        }
    }

    pub fn parse(s: &str) -> Result<Self, BoardError> {
        match s {
            "all" => Ok(Self::All),
            "overdue" => Ok(Self::Overdue),
            "this-week" | "thisWeek" => Ok(Self::ThisWeek),
            "my" | "mine" => Ok(Self::Mine),
            _ => Err(BoardError::validation(format!(
                "Unknown quick filter '{s}'. Expected one of: all, overdue, this-week, my"
            ))),
        }
    }
}

/// Optional ordering applied after filtering. Without one the collection order is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// High before medium before low.
    Priority,
    /// Earliest due date first, undated tasks last.
    Due,
    Created,
}

impl SortKey {
    pub fn parse(s: &str) -> Result<Self, BoardError> {
        match s {
            "priority" => Ok(Self::Priority),
            "due" => Ok(Self::Due),
            "created" => Ok(Self::Created),
            _ => Err(BoardError::validation(format!(
                "Unknown sort key '{s}'. Expected one of: priority, due, created"
            ))),
        }
    }
}

/// Current filter state of the board view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: String,
    /// `None` means all priorities.
    pub priority: Option<Priority>,
    /// `None` means all assignees.
    pub assignee: Option<String>,
    /// `None` means all statuses.
    pub status: Option<TaskStatus>,
    pub quick: QuickFilter,
    /// Identity the `my` quick filter compares against.
    pub current_user: Option<String>,
    pub sort: Option<SortKey>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_quick(mut self, quick: QuickFilter) -> Self {
        self.quick = quick;
        self
    }

    pub fn with_current_user(mut self, user: impl Into<String>) -> Self {
        self.current_user = Some(user.into());
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    /// True when the task passes every active predicate.
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        self.matches_search(task)
            && self.priority.map_or(true, |p| task.priority == p)
            && self
                .assignee
                .as_deref()
                .map_or(true, |a| task.assignee.as_deref() == Some(a))
            && self.status.map_or(true, |s| task.status == s)
            && self.matches_quick(task, today)
    }

    fn matches_search(&self, task: &Task) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        task.title.to_lowercase().contains(&needle)
            || task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    fn matches_quick(&self, task: &Task, today: NaiveDate) -> bool {
        match self.quick {
            QuickFilter::All => true,
            QuickFilter::Overdue => task.is_overdue(today),
            QuickFilter::ThisWeek => task
                .due_date
                .is_some_and(|due| due >= today && due <= today + Duration::days(7)),
            QuickFilter::Mine => match (&self.current_user, &task.assignee) {
                (Some(me), Some(assignee)) => me == assignee,
                _ => false,
            },
        }
    }

    /// Visible tasks across all columns.
    pub fn apply<'a>(&self, tasks: &'a [Task], today: NaiveDate) -> Vec<&'a Task> {
        let mut visible: Vec<&Task> = tasks.iter().filter(|t| self.matches(t, today)).collect();
        if let Some(key) = self.sort {
            sort_tasks(&mut visible, key);
        }
        visible
    }

    /// Visible tasks for a single column.
    pub fn column<'a>(&self, tasks: &'a [Task], status: TaskStatus, today: NaiveDate) -> Vec<&'a Task> {
        self.apply(tasks, today)
            .into_iter()
            .filter(|t| t.status == status)
            .collect()
    }

    /// All four columns in board order.
    pub fn partition<'a>(&self, tasks: &'a [Task], today: NaiveDate) -> Vec<Column<'a>> {
        let visible = self.apply(tasks, today);
        TaskStatus::ALL
            .iter()
            .map(|&status| Column {
                status,
                tasks: visible.iter().copied().filter(|t| t.status == status).collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

fn sort_tasks(tasks: &mut [&Task], key: SortKey) {
    match key {
        SortKey::Priority => tasks.sort_by(|a, b| b.priority.cmp(&a.priority)),
        SortKey::Due => tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
        SortKey::Created => tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
}

/// Number of overdue tasks, ignoring every other filter.
pub fn overdue_count(tasks: &[Task], today: NaiveDate) -> usize {
    tasks.iter().filter(|t| t.is_overdue(today)).count()
}
