use serde::Deserialize;
use uuid::Uuid;

use super::{choice, non_negative, optional_text, required_text, FieldErrors, TextList};
use crate::models::choices::{ApplicationComplexity, ApplicationStatus};
use crate::models::INITIAL_VERSION;

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationInput {
    pub project_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub complexity: Option<String>,
    pub status: Option<String>,
    pub estimated_weeks: Option<i64>,
    pub version: Option<String>,
    pub features: Option<TextList>,
    pub tech_stack: Option<TextList>,
}

#[derive(Debug, Clone)]
pub struct ApplicationData {
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub complexity: ApplicationComplexity,
    pub status: ApplicationStatus,
    pub estimated_weeks: i32,
    pub version: String,
    pub features: Vec<String>,
    pub tech_stack: Vec<String>,
}

impl ApplicationInput {
    pub fn validate(self) -> Result<ApplicationData, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.project_id.is_none() {
            errors.add("project_id", "This field is required.");
        }
        let name = required_text(&mut errors, "name", self.name.as_deref(), Some(100));
        let description = required_text(&mut errors, "description", self.description.as_deref(), None);
        let complexity = choice(
            &mut errors,
            "complexity",
            self.complexity.as_deref(),
            ApplicationComplexity::Medium,
            ApplicationComplexity::parse,
            ApplicationComplexity::expected,
        );
        let status = choice(
            &mut errors,
            "status",
            self.status.as_deref(),
            ApplicationStatus::Planning,
            ApplicationStatus::parse,
            ApplicationStatus::expected,
        );

        if self.estimated_weeks.is_none() {
            errors.add("estimated_weeks", "This field is required.");
        }
        let estimated_weeks = non_negative(&mut errors, "estimated_weeks", self.estimated_weeks);

        let mut version = optional_text(&mut errors, "version", self.version.as_deref(), Some(20));
        if version.is_empty() {
            version = INITIAL_VERSION.to_string();
        }

        let features = self.features.map(TextList::into_items).unwrap_or_default();
        let tech_stack = self.tech_stack.map(TextList::into_items).unwrap_or_default();

        match (self.project_id, estimated_weeks) {
            (Some(project_id), Some(estimated_weeks)) => errors.into_result(ApplicationData {
                project_id,
                name,
                description,
                complexity,
                status,
                estimated_weeks,
                version,
                features,
                tech_stack,
            }),
            _ => Err(errors),
        }
    }
}
