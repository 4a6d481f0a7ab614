use crate::models::{Task, TaskStatus};

/// In-memory copy of the task collection, in collection order.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

/// Pre-mutation copy of one task, used to undo an optimistic change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    task: Task,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Replace the task with the same id in place, or append it.
    pub fn upsert(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(index))
    }

    /// Set a task's status locally and return what is needed to undo it.
    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Option<Snapshot> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        let snapshot = Snapshot { task: task.clone() };
        task.status = status;
        Some(snapshot)
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.upsert(snapshot.task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            description: None,
            status,
            priority: Priority::Medium,
            assignee: None,
            due_date: None,
            image_url: None,
            created_at: "2024-01-01 00:00:00".into(),
            updated_at: "2024-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn set_status_then_restore_round_trips() {
        let mut store = TaskStore::new(vec![task("a", TaskStatus::Proposed), task("b", TaskStatus::Done)]);
        let snapshot = store.set_status("a", TaskStatus::Testing).unwrap();
        assert_eq!(store.get("a").unwrap().status, TaskStatus::Testing);
        store.restore(snapshot);
        assert_eq!(store.get("a").unwrap().status, TaskStatus::Proposed);
        assert_eq!(store.tasks()[0].id, "a");
    }

    #[test]
    fn set_status_on_missing_task_is_none() {
        let mut store = TaskStore::default();
        assert!(store.set_status("x", TaskStatus::Done).is_none());
    }

    #[test]
    fn upsert_replaces_in_place_and_appends_new() {
        let mut store = TaskStore::new(vec![task("a", TaskStatus::Proposed), task("b", TaskStatus::Proposed)]);
        store.upsert(task("a", TaskStatus::Done));
        store.upsert(task("c", TaskStatus::Proposed));
        let ids: Vec<_> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(store.get("a").unwrap().status, TaskStatus::Done);
        assert_eq!(store.remove("b").unwrap().id, "b");
        assert!(store.remove("b").is_none());
        assert_eq!(store.len(), 2);
    }
}
