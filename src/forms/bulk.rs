use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{optional_date, FieldErrors, NON_FIELD};
use crate::models::choices::{TaskAssignee, TaskStatus};

#[derive(Debug, Default, Deserialize)]
pub struct BulkTaskInput {
    pub action: Option<String>,
    pub new_assignee: Option<String>,
    pub new_due_date: Option<String>,
    #[serde(default)]
    pub task_ids: Vec<Uuid>,
    /// Comma-separated ids, as posted by the task list page.
    pub selected_tasks: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    SetStatus(TaskStatus),
    ChangeAssignee(TaskAssignee),
    UpdateDueDate(NaiveDate),
}

#[derive(Debug, Clone)]
pub struct BulkTaskOperation {
    pub action: BulkAction,
    pub task_ids: Vec<Uuid>,
}

impl BulkTaskInput {
    pub fn validate(&self) -> Result<BulkTaskOperation, FieldErrors> {
        let mut errors = FieldErrors::new();

        let action = match self.action.as_deref().map(str::trim).unwrap_or("") {
            "" => {
                errors.add("action", "This field is required.");
                None
            }
            "complete" => Some(BulkAction::SetStatus(TaskStatus::Completed)),
            "in_progress" => Some(BulkAction::SetStatus(TaskStatus::InProgress)),
            "pending" => Some(BulkAction::SetStatus(TaskStatus::Pending)),
            "change_assignee" => {
                match self.new_assignee.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                    None => {
                        errors.add("new_assignee", "New assignee is required for this action.");
                        None
                    }
                    Some(v) => match TaskAssignee::parse(v) {
                        Some(assignee) => Some(BulkAction::ChangeAssignee(assignee)),
                        None => {
                            errors.add(
                                "new_assignee",
                                format!(
                                    "Select a valid choice. '{v}' is not one of: {}.",
                                    TaskAssignee::expected()
                                ),
                            );
                            None
                        }
                    },
                }
            }
            "update_due_date" => {
                match optional_date(&mut errors, "new_due_date", self.new_due_date.as_deref()) {
                    Some(date) => Some(BulkAction::UpdateDueDate(date)),
                    None => {
                        if !errors.has("new_due_date") {
                            errors.add("new_due_date", "New due date is required for this action.");
                        }
                        None
                    }
                }
            }
            other => {
                errors.add("action", format!("Select a valid choice. '{other}' is not available."));
                None
            }
        };

        let mut task_ids = self.task_ids.clone();
        if let Some(selected) = self.selected_tasks.as_deref() {
            for part in selected.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                match Uuid::parse_str(part) {
                    Ok(id) => task_ids.push(id),
                    Err(_) => {
                        errors.add(NON_FIELD, "Invalid task IDs format.");
                        break;
                    }
                }
            }
        }
        task_ids.sort();
        task_ids.dedup();
        if task_ids.is_empty() && !errors.has(NON_FIELD) {
            errors.add(NON_FIELD, "No tasks selected for bulk operation.");
        }

        match action {
            Some(action) => errors.into_result(BulkTaskOperation { action, task_ids }),
            None => Err(errors),
        }
    }
}
