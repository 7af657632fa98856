use serde::Deserialize;
use uuid::Uuid;

use super::{choice, non_negative, required_choice, required_text, FieldErrors, NON_FIELD};
use crate::models::choices::{IntegrationComplexity, IntegrationStatus, IntegrationType};
use crate::models::Application;

#[derive(Debug, Default, Deserialize)]
pub struct IntegrationInput {
    pub from_app_id: Option<Uuid>,
    pub to_app_id: Option<Uuid>,
    pub integration_type: Option<String>,
    pub status: Option<String>,
    pub complexity: Option<String>,
    pub description: Option<String>,
    pub estimated_weeks: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct IntegrationData {
    pub from_app_id: Uuid,
    pub to_app_id: Uuid,
    pub integration_type: IntegrationType,
    pub status: IntegrationStatus,
    pub complexity: IntegrationComplexity,
    pub description: String,
    pub estimated_weeks: i32,
}

impl IntegrationInput {
    pub fn validate(&self) -> Result<IntegrationData, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.from_app_id.is_none() {
            errors.add("from_app_id", "This field is required.");
        }
        if self.to_app_id.is_none() {
            errors.add("to_app_id", "This field is required.");
        }
        if let (Some(from), Some(to)) = (self.from_app_id, self.to_app_id) {
            if from == to {
                errors.add("to_app_id", "Source and target applications cannot be the same.");
            }
        }

        let integration_type = required_choice(
            &mut errors,
            "integration_type",
            self.integration_type.as_deref(),
            IntegrationType::parse,
            IntegrationType::expected,
        );
        let status = choice(
            &mut errors,
            "status",
            self.status.as_deref(),
            IntegrationStatus::Planned,
            IntegrationStatus::parse,
            IntegrationStatus::expected,
        );
        let complexity = choice(
            &mut errors,
            "complexity",
            self.complexity.as_deref(),
            IntegrationComplexity::Medium,
            IntegrationComplexity::parse,
            IntegrationComplexity::expected,
        );
        let description = required_text(&mut errors, "description", self.description.as_deref(), None);

        if self.estimated_weeks.is_none() {
            errors.add("estimated_weeks", "This field is required.");
        }
        let estimated_weeks = non_negative(&mut errors, "estimated_weeks", self.estimated_weeks);

        match (self.from_app_id, self.to_app_id, integration_type, estimated_weeks) {
            (Some(from_app_id), Some(to_app_id), Some(integration_type), Some(estimated_weeks)) => {
                errors.into_result(IntegrationData {
                    from_app_id,
                    to_app_id,
                    integration_type,
                    status,
                    complexity,
                    description,
                    estimated_weeks,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Both ends of an integration have to live in the same project.
pub fn check_same_project(from: &Application, to: &Application) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if from.project_id != to.project_id {
        errors.add(NON_FIELD, "Can only integrate applications within the same project.");
    }
    errors.into_result(())
}
