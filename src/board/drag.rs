use tracing::debug;

use crate::models::{Task, TaskStatus};

/// The task being dragged, captured when the drag starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraggedTask {
    pub id: String,
    pub status: TaskStatus,
}

impl From<&Task> for DraggedTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            status: task.status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DraggedTask),
    DraggingOverColumn(DraggedTask, TaskStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Start(DraggedTask),
    EnterColumn(TaskStatus),
    LeaveColumn,
    Drop(TaskStatus),
    /// Cancelled drag, or released outside any column.
    End,
}

/// Status mutation requested by a drop onto a different column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub id: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

impl DragState {
    pub fn dragged(&self) -> Option<&DraggedTask> {
        match self {
            Self::Idle => None,
            Self::Dragging(task) | Self::DraggingOverColumn(task, _) => Some(task),
        }
    }

    pub fn target(&self) -> Option<TaskStatus> {
        match self {
            Self::DraggingOverColumn(_, column) => Some(*column),
            _ => None,
        }
    }

    /// Advance the machine. Returns the next state and, for an effective drop,
    /// the single status change to request.
    pub fn on(self, event: DragEvent) -> (DragState, Option<StatusChange>) {
        let (next, change) = match (self, event) {
            (_, DragEvent::Start(task)) => (Self::Dragging(task), None),
            (Self::Dragging(task) | Self::DraggingOverColumn(task, _), DragEvent::EnterColumn(column)) => {
                (Self::DraggingOverColumn(task, column), None)
            }
            (Self::DraggingOverColumn(task, _), DragEvent::LeaveColumn) => (Self::Dragging(task), None),
            (Self::Dragging(task) | Self::DraggingOverColumn(task, _), DragEvent::Drop(column)) => {
                let change = (column != task.status).then(|| StatusChange {
                    id: task.id,
                    from: task.status,
                    to: column,
                });
                (Self::Idle, change)
            }
            (_, DragEvent::End) => (Self::Idle, None),
            (state, _) => (state, None),
        };
        debug!(state = ?next, ?change, "drag transition");
        (next, change)
    }
}
