pub mod choices;

mod application;
mod artifact;
mod audit_event;
mod decision;
mod integration;
mod project;
mod refresh_token;
mod task;
mod user;

pub use application::Application;
pub use artifact::{next_version, Artifact, INITIAL_VERSION};
pub use audit_event::{AuditEvent, NewAuditEvent};
pub use decision::{Decision, PENDING_TOO_LONG_DAYS};
pub use integration::{Integration, HOURS_PER_WEEK};
pub use project::{completion_percentage, health_score, Project, ProjectSummary};
pub use refresh_token::RefreshToken;
pub use task::Task;
pub use user::User;
