use chrono::NaiveDate;

use crate::board::Column;
use crate::db::task_repo::TaskProgress;
use crate::models::Task;

fn short_id(id: &str) -> &str {
    &id[..std::cmp::min(8, id.len())]
}

fn task_line(t: &Task, today: NaiveDate) -> String {
    let mut line = format!("{} ({}) p={}", t.title, short_id(&t.id), t.priority.as_str());
    if let Some(ref assignee) = t.assignee {
        line.push_str(&format!(" @{assignee}"));
    }
    if let Some(due) = t.due_date {
        line.push_str(&format!(" due {due}"));
    }
    if t.is_overdue(today) {
        line.push_str(" [OVERDUE]");
    }
    line
}

pub fn print_task(t: &Task, today: NaiveDate) {
    println!("Task: {} ({})", t.title, t.id);
    if let Some(ref desc) = t.description {
        println!("  Description: {desc}");
    }
    println!("  Status: {}", t.status.as_str());
    println!("  Priority: {}", t.priority.as_str());
    if let Some(ref assignee) = t.assignee {
        println!("  Assignee: {assignee}");
    }
    if let Some(due) = t.due_date {
        let flag = if t.is_overdue(today) { " (overdue)" } else { "" };
        println!("  Due: {due}{flag}");
    }
    if let Some(ref url) = t.image_url {
        println!("  Image: {url}");
    }
    println!("  Created: {}", t.created_at);
    println!("  Updated: {}", t.updated_at);
}

pub fn print_task_list(tasks: &[&Task], today: NaiveDate) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        println!("  [{}] {}", t.status.as_str(), task_line(t, today));
    }
}

pub fn print_board(columns: &[Column<'_>], today: NaiveDate) {
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("== {} ({}) ==", column.status.label(), column.tasks.len());
        for t in &column.tasks {
            println!("  {}", task_line(t, today));
        }
    }
}

pub fn print_progress(p: &TaskProgress, overdue: usize) {
    println!("Progress: {:.1}% ({}/{})", p.percentage, p.done, p.total);
    println!(
        "  proposed={} in_progress={} testing={} done={} overdue={}",
        p.proposed, p.in_progress, p.testing, p.done, overdue
    );
}
