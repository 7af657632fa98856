use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{choice, required_date, required_text, FieldErrors, NON_FIELD};
use crate::models::choices::ProjectStatus;

#[derive(Debug, Default, Deserialize)]
pub struct ProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub target_date: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ProjectData {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
    pub owner_id: Option<Uuid>,
}

impl ProjectInput {
    pub fn validate(&self) -> Result<ProjectData, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = required_text(&mut errors, "name", self.name.as_deref(), Some(100));
        let description = required_text(&mut errors, "description", self.description.as_deref(), None);
        let status = choice(
            &mut errors,
            "status",
            self.status.as_deref(),
            ProjectStatus::Planning,
            ProjectStatus::parse,
            ProjectStatus::expected,
        );
        let start_date = required_date(&mut errors, "start_date", self.start_date.as_deref());
        let target_date = required_date(&mut errors, "target_date", self.target_date.as_deref());

        if let (Some(start), Some(target)) = (start_date, target_date) {
            if target <= start {
                errors.add(NON_FIELD, "Target date must be after the start date.");
            }
        }

        // Both dates are present whenever no error was recorded for them.
        match (start_date, target_date) {
            (Some(start_date), Some(target_date)) => errors.into_result(ProjectData {
                name,
                description,
                status,
                start_date,
                target_date,
                owner_id: self.owner_id,
            }),
            _ => Err(errors),
        }
    }
}
