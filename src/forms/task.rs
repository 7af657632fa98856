use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{choice, non_negative, optional_date, optional_text, required_text, FieldErrors};
use crate::models::choices::{TaskAssignee, TaskPriority, TaskStatus};

#[derive(Debug, Default, Deserialize)]
pub struct TaskInput {
    pub application_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub assigned_user_id: Option<Uuid>,
    pub due_date: Option<String>,
    pub estimated_hours: Option<i64>,
    pub actual_hours: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct TaskData {
    pub application_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub assignee: TaskAssignee,
    pub assigned_user_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
}

impl TaskInput {
    /// `is_new` enables the no-past-due-date rule, which only applies when a
    /// task is first created.
    pub fn validate(&self, today: NaiveDate, is_new: bool) -> Result<TaskData, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.application_id.is_none() {
            errors.add("application_id", "This field is required.");
        }
        let title = required_text(&mut errors, "title", self.title.as_deref(), Some(200));
        let description = optional_text(&mut errors, "description", self.description.as_deref(), None);
        let priority = choice(
            &mut errors,
            "priority",
            self.priority.as_deref(),
            TaskPriority::Medium,
            TaskPriority::parse,
            TaskPriority::expected,
        );
        let status = choice(
            &mut errors,
            "status",
            self.status.as_deref(),
            TaskStatus::Pending,
            TaskStatus::parse,
            TaskStatus::expected,
        );
        let assignee = choice(
            &mut errors,
            "assignee",
            self.assignee.as_deref(),
            TaskAssignee::Human,
            TaskAssignee::parse,
            TaskAssignee::expected,
        );

        let due_date = optional_date(&mut errors, "due_date", self.due_date.as_deref());
        if is_new && due_date.is_some_and(|due| due < today) {
            errors.add("due_date", "Due date cannot be in the past.");
        }

        let estimated_hours = non_negative(&mut errors, "estimated_hours", self.estimated_hours);
        let actual_hours = non_negative(&mut errors, "actual_hours", self.actual_hours);
        if let (Some(est), Some(actual)) = (estimated_hours, actual_hours) {
            if est > 0 && i64::from(actual) > i64::from(est) * 2 {
                errors.add(
                    "actual_hours",
                    "Actual hours significantly exceed estimate. Consider updating the estimate.",
                );
            }
        }

        match self.application_id {
            Some(application_id) => errors.into_result(TaskData {
                application_id,
                title,
                description,
                priority,
                status,
                assignee,
                assigned_user_id: self.assigned_user_id,
                due_date,
                estimated_hours,
                actual_hours,
            }),
            None => Err(errors),
        }
    }
}
