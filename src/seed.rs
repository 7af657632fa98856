//! Sample data for demos and local development.

use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password;
use crate::db;
use crate::db::users::NewUser;
use crate::forms::application::ApplicationData;
use crate::forms::artifact::ArtifactData;
use crate::forms::decision::DecisionData;
use crate::forms::integration::IntegrationData;
use crate::forms::project::ProjectData;
use crate::forms::task::TaskData;
use crate::models::choices::{
    ApplicationComplexity, ApplicationStatus, ArtifactStatus, ArtifactType, DecisionImpact,
    DecisionStatus, IntegrationComplexity, IntegrationStatus, IntegrationType, ProjectStatus,
    TaskAssignee, TaskPriority, TaskStatus, UserRole,
};
use crate::models::User;

pub const SAMPLE_PROJECT: &str = "FamilyHub";

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
}

/// What a seed run created. Counts are zero when the sample project
/// already existed.
#[derive(Debug, Default, Clone)]
pub struct SeedReport {
    pub admin_created: bool,
    pub project_created: bool,
    pub project_id: Option<Uuid>,
    pub applications: usize,
    pub tasks: usize,
    pub artifacts: usize,
    pub decisions: usize,
    pub integrations: usize,
}

impl std::fmt::Display for SeedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.project_created {
            return write!(f, "Sample project '{SAMPLE_PROJECT}' already exists, nothing to do");
        }
        writeln!(f, "Created sample data:")?;
        writeln!(f, "- 1 Project: {SAMPLE_PROJECT}")?;
        writeln!(f, "- {} Applications", self.applications)?;
        writeln!(f, "- {} Tasks", self.tasks)?;
        writeln!(f, "- {} Artifacts", self.artifacts)?;
        writeln!(f, "- {} Decisions", self.decisions)?;
        write!(f, "- {} Integrations", self.integrations)
    }
}

struct SampleApp {
    name: &'static str,
    description: &'static str,
    complexity: ApplicationComplexity,
    status: ApplicationStatus,
    weeks: i32,
    features: &'static [&'static str],
    tech_stack: &'static [&'static str],
}

const APPS: &[SampleApp] = &[
    SampleApp {
        name: "Timesheet Tracker",
        description: "Employee time tracking and payroll calculation",
        complexity: ApplicationComplexity::Medium,
        status: ApplicationStatus::Development,
        weeks: 8,
        features: &["Time tracking", "Job management", "Payment calculation"],
        tech_stack: &["Rust", "PostgreSQL"],
    },
    SampleApp {
        name: "Daycare Invoice Tracker",
        description: "Track daycare payments and invoices",
        complexity: ApplicationComplexity::Simple,
        status: ApplicationStatus::Production,
        weeks: 4,
        features: &["Invoice tracking", "Payment history", "Reports"],
        tech_stack: &["Rust", "SQLite"],
    },
    SampleApp {
        name: "AutoCraftCV",
        description: "Automated CV generation and management",
        complexity: ApplicationComplexity::High,
        status: ApplicationStatus::Production,
        weeks: 12,
        features: &["CV generation", "Template management", "Export formats"],
        tech_stack: &["Rust", "PostgreSQL", "Askama"],
    },
    SampleApp {
        name: "Employment History",
        description: "Track employment history and career progression",
        complexity: ApplicationComplexity::Medium,
        status: ApplicationStatus::Planning,
        weeks: 6,
        features: &["Job history", "Career tracking", "Analytics"],
        tech_stack: &[],
    },
    SampleApp {
        name: "Household Budget",
        description: "Complete household budget management",
        complexity: ApplicationComplexity::High,
        status: ApplicationStatus::Planning,
        weeks: 10,
        features: &["Budget planning", "Expense tracking", "Financial reports"],
        tech_stack: &[],
    },
];

/// (application index, title, description, status, priority, days until due)
const TASKS: &[(usize, &str, &str, TaskStatus, TaskPriority, i64)] = &[
    (
        0,
        "Implement time entry validation",
        "Add validation to prevent overlapping time entries",
        TaskStatus::InProgress,
        TaskPriority::High,
        10,
    ),
    (
        0,
        "Create job management interface",
        "CRUD interface for managing job information",
        TaskStatus::Pending,
        TaskPriority::Medium,
        21,
    ),
    (
        1,
        "Deploy daycare app to production",
        "Configure production environment and deploy",
        TaskStatus::Completed,
        TaskPriority::High,
        -5,
    ),
    (
        2,
        "Design CV template system",
        "Create flexible template system for CV generation",
        TaskStatus::InProgress,
        TaskPriority::High,
        14,
    ),
    (
        3,
        "Plan database schema for employment history",
        "Design database models for tracking employment",
        TaskStatus::Pending,
        TaskPriority::Medium,
        30,
    ),
    (
        4,
        "Collect budget categories",
        "Gather the spending categories the household uses today",
        TaskStatus::Blocked,
        TaskPriority::Low,
        -3,
    ),
];

/// Create the admin account (unless it exists) and the sample project with
/// its applications, tasks, artifacts, decisions and integrations. Does
/// nothing to the project when one with the sample name already exists.
pub async fn run(pool: &PgPool, opts: &SeedOptions) -> Result<SeedReport, String> {
    let mut report = SeedReport::default();
    let today = Utc::now().date_naive();

    let admin = ensure_admin(pool, opts, &mut report).await?;

    if let Some(existing) = db::projects::find_by_name(pool, SAMPLE_PROJECT)
        .await
        .map_err(db_err)?
    {
        tracing::info!(project_id = %existing.id, "Sample project already present");
        report.project_id = Some(existing.id);
        return Ok(report);
    }

    // A failed run leaves no partial sample project behind
    let mut tx = pool.begin().await.map_err(db_err)?;

    let project = db::projects::create(
        &mut *tx,
        admin.id,
        &ProjectData {
            name: SAMPLE_PROJECT.to_string(),
            description: "Integrated family management platform combining several applications"
                .to_string(),
            status: ProjectStatus::Development,
            start_date: days_from(today, -30),
            target_date: days_from(today, 180),
            owner_id: Some(admin.id),
        },
    )
    .await
    .map_err(db_err)?;
    report.project_created = true;
    report.project_id = Some(project.id);

    let mut app_ids = Vec::with_capacity(APPS.len());
    for app in APPS {
        let created = db::applications::create(
            &mut *tx,
            &ApplicationData {
                project_id: project.id,
                name: app.name.to_string(),
                description: app.description.to_string(),
                complexity: app.complexity,
                status: app.status,
                estimated_weeks: app.weeks,
                version: "1.0".to_string(),
                features: to_strings(app.features),
                tech_stack: to_strings(app.tech_stack),
            },
        )
        .await
        .map_err(db_err)?;
        app_ids.push(created.id);
    }
    report.applications = app_ids.len();

    for &(app, title, description, status, priority, due_in) in TASKS {
        db::tasks::create(
            &mut *tx,
            &TaskData {
                application_id: app_ids[app],
                title: title.to_string(),
                description: description.to_string(),
                priority,
                status,
                assignee: TaskAssignee::Human,
                assigned_user_id: Some(admin.id),
                due_date: Some(days_from(today, due_in)),
                estimated_hours: Some(8),
                actual_hours: (status == TaskStatus::Completed).then_some(6),
            },
        )
        .await
        .map_err(db_err)?;
        report.tasks += 1;
    }

    let artifacts = [
        (
            "Timesheet Requirements Document",
            "Complete requirements specification for the timesheet application",
            ArtifactType::Requirements,
            "1.0",
        ),
        (
            "Database Schema Design",
            "ERD and database design documentation",
            ArtifactType::Architecture,
            "1.1",
        ),
    ];
    for (name, description, kind, version) in artifacts {
        db::artifacts::create(
            &mut *tx,
            Some(admin.id),
            version,
            &ArtifactData {
                application_id: Some(app_ids[0]),
                name: name.to_string(),
                artifact_type: Some(kind),
                description: description.to_string(),
                content: format!("# {name}\n\n{description}\n"),
                version: Some(version.to_string()),
                status: ArtifactStatus::Draft,
                increment_version: false,
            },
        )
        .await
        .map_err(db_err)?;
        report.artifacts += 1;
    }

    let decisions = [
        (
            "Standardise on one web framework",
            "Use the same framework for every application to share code and tooling.",
            DecisionStatus::Decided,
            DecisionImpact::High,
            "Tech Lead",
            Some(days_from(today, -14)),
        ),
        (
            "Shared UI component library",
            "Use one responsive component library across all applications.",
            DecisionStatus::Decided,
            DecisionImpact::Medium,
            "UI Team",
            Some(days_from(today, -7)),
        ),
        (
            "Single sign-on between applications",
            "Decide whether the applications share one login.",
            DecisionStatus::Pending,
            DecisionImpact::Critical,
            "",
            None,
        ),
    ];
    for (title, description, status, impact, maker, decided_date) in decisions {
        db::decisions::create(
            &mut *tx,
            &DecisionData {
                project_id: project.id,
                title: title.to_string(),
                description: description.to_string(),
                rationale: String::new(),
                status,
                impact,
                decided_date,
                decision_maker: maker.to_string(),
            },
        )
        .await
        .map_err(db_err)?;
        report.decisions += 1;
    }

    let integrations = [
        (
            0,
            1,
            IntegrationType::DataSharing,
            IntegrationComplexity::Medium,
            "Share user data between the timesheet and daycare applications",
            3,
        ),
        (
            2,
            3,
            IntegrationType::ApiIntegration,
            IntegrationComplexity::Simple,
            "Feed employment history into CV generation",
            2,
        ),
    ];
    for (from, to, kind, complexity, description, weeks) in integrations {
        db::integrations::create(
            &mut *tx,
            &IntegrationData {
                from_app_id: app_ids[from],
                to_app_id: app_ids[to],
                integration_type: kind,
                status: IntegrationStatus::Planned,
                complexity,
                description: description.to_string(),
                estimated_weeks: weeks,
            },
        )
        .await
        .map_err(db_err)?;
        report.integrations += 1;
    }

    tx.commit().await.map_err(db_err)?;
    tracing::info!(project_id = %project.id, "Sample data created");
    Ok(report)
}

async fn ensure_admin(
    pool: &PgPool,
    opts: &SeedOptions,
    report: &mut SeedReport,
) -> Result<User, String> {
    if let Some(user) = db::users::find_by_username(pool, &opts.admin_username)
        .await
        .map_err(db_err)?
    {
        return Ok(user);
    }

    let pw_hash = password::hash(&opts.admin_password)?;
    let user = db::users::create(
        pool,
        &NewUser {
            username: &opts.admin_username,
            email: &opts.admin_email.to_lowercase(),
            password_hash: &pw_hash,
            first_name: "",
            last_name: "",
            role: UserRole::Manager.as_str(),
            is_admin: true,
        },
    )
    .await
    .map_err(db_err)?;

    tracing::info!(username = %user.username, "Created admin user");
    report.admin_created = true;
    Ok(user)
}

fn days_from(today: NaiveDate, days: i64) -> NaiveDate {
    today + Duration::days(days)
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn db_err(e: sqlx::Error) -> String {
    format!("Database error: {e}")
}
