use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{choice, optional_date, optional_text, required_text, FieldErrors};
use crate::models::choices::{DecisionImpact, DecisionStatus};

#[derive(Debug, Default, Deserialize)]
pub struct DecisionInput {
    pub project_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub rationale: Option<String>,
    pub status: Option<String>,
    pub impact: Option<String>,
    pub decided_date: Option<String>,
    pub decision_maker: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DecisionData {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub status: DecisionStatus,
    pub impact: DecisionImpact,
    pub decided_date: Option<NaiveDate>,
    pub decision_maker: String,
}

impl DecisionInput {
    pub fn validate(&self) -> Result<DecisionData, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.project_id.is_none() {
            errors.add("project_id", "This field is required.");
        }
        let title = required_text(&mut errors, "title", self.title.as_deref(), Some(200));
        let description = required_text(&mut errors, "description", self.description.as_deref(), None);
        let rationale = optional_text(&mut errors, "rationale", self.rationale.as_deref(), None);
        let status = choice(
            &mut errors,
            "status",
            self.status.as_deref(),
            DecisionStatus::Pending,
            DecisionStatus::parse,
            DecisionStatus::expected,
        );
        let impact = choice(
            &mut errors,
            "impact",
            self.impact.as_deref(),
            DecisionImpact::Medium,
            DecisionImpact::parse,
            DecisionImpact::expected,
        );
        let decided_date = optional_date(&mut errors, "decided_date", self.decided_date.as_deref());
        let decision_maker =
            optional_text(&mut errors, "decision_maker", self.decision_maker.as_deref(), Some(100));

        match self.project_id {
            Some(project_id) => errors.into_result(DecisionData {
                project_id,
                title,
                description,
                rationale,
                status,
                impact,
                decided_date,
                decision_maker,
            }),
            None => Err(errors),
        }
    }
}
