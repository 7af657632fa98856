use std::time::Duration as StdDuration;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use devtracker::db::{Page, MAX_PAGE};
use devtracker::export::{
    self, csv, json as json_export, xlsx, Cell, Dataset, ExportData, ExportFormat, RecordType,
};
use devtracker::forms::artifact::validate_upload;
use devtracker::forms::bulk::{BulkAction, BulkTaskInput};
use devtracker::forms::project::ProjectInput;
use devtracker::forms::task::TaskInput;
use devtracker::forms::{TextList, NON_FIELD};
use devtracker::models::choices::{TaskAssignee, TaskStatus};
use devtracker::models::{
    completion_percentage, health_score, next_version, Decision, Integration, Project, Task,
};
use devtracker::rate_limit::LoginRateLimiter;
use devtracker::storage::{self, FileStore, LocalFileStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn project(start: NaiveDate, target: NaiveDate) -> Project {
    Project {
        id: Uuid::now_v7(),
        name: "FamilyHub".to_string(),
        description: "Household apps".to_string(),
        status: "development".to_string(),
        start_date: start,
        target_date: target,
        owner_id: Uuid::now_v7(),
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
    }
}

fn task(status: &str, due: Option<NaiveDate>, est: Option<i32>, actual: Option<i32>) -> Task {
    Task {
        id: Uuid::now_v7(),
        application_id: Uuid::now_v7(),
        title: "Task".to_string(),
        description: String::new(),
        priority: "medium".to_string(),
        status: status.to_string(),
        assignee: "human".to_string(),
        assigned_user_id: None,
        due_date: due,
        estimated_hours: est,
        actual_hours: actual,
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
    }
}

// ── Derived properties ──────────────────────────────────────────

#[test]
fn completion_percentage_rounds_to_one_decimal() {
    assert_eq!(completion_percentage(0, 0), 0.0);
    assert_eq!(completion_percentage(1, 3), 33.3);
    assert_eq!(completion_percentage(2, 3), 66.7);
    assert_eq!(completion_percentage(4, 4), 100.0);
}

#[test]
fn project_schedule_figures() {
    let p = project(date(2024, 1, 1), date(2024, 3, 1));

    assert_eq!(p.days_remaining(date(2024, 2, 20)), 10);
    assert!(!p.is_overdue(date(2024, 3, 1)));
    assert!(p.is_overdue(date(2024, 3, 5)));
    assert_eq!(p.days_overdue(date(2024, 3, 5)), 4);
    assert_eq!(p.days_overdue(date(2024, 2, 5)), 0);
}

#[test]
fn health_score_weights_completion_and_pace() {
    let start = date(2024, 1, 1);
    let target = date(2024, 1, 11);

    // Half way through the schedule with half the work done: on pace
    assert_eq!(health_score(50.0, start, target, date(2024, 1, 6)), 70.0);
    // Before the start nothing is expected yet
    assert_eq!(health_score(0.0, start, target, date(2023, 12, 1)), 40.0);
    // Everything done
    assert_eq!(health_score(100.0, start, target, date(2024, 2, 1)), 100.0);
}

#[test]
fn task_overdue_only_while_open() {
    let today = date(2024, 6, 10);
    let due = Some(date(2024, 6, 1));

    assert!(task("pending", due, None, None).is_overdue(today));
    assert!(task("in-progress", due, None, None).is_overdue(today));
    assert!(!task("completed", due, None, None).is_overdue(today));
    assert!(!task("blocked", due, None, None).is_overdue(today));
    assert!(!task("pending", None, None, None).is_overdue(today));
    assert_eq!(task("pending", due, None, None).days_until_due(today), Some(-9));
}

#[test]
fn task_hours_variance_needs_both_figures() {
    assert_eq!(task("pending", None, Some(10), Some(14)).hours_variance(), Some(4));
    assert_eq!(task("pending", None, Some(10), None).hours_variance(), None);
    assert_eq!(task("pending", None, Some(0), Some(3)).hours_variance(), None);
}

#[test]
fn integration_estimate_scales_with_complexity() {
    let mut integration = Integration {
        id: Uuid::now_v7(),
        from_app_id: Uuid::now_v7(),
        to_app_id: Uuid::now_v7(),
        integration_type: "data-sharing".to_string(),
        status: "planned".to_string(),
        complexity: "simple".to_string(),
        description: "Sync".to_string(),
        estimated_weeks: 3,
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
    };
    assert_eq!(integration.estimated_hours(), 120);

    integration.complexity = "complex".to_string();
    assert_eq!(integration.complexity_multiplier(), 2.5);
    assert_eq!(integration.estimated_hours(), 300);
}

#[test]
fn decision_pending_too_long_after_thirty_days() {
    let decision = Decision {
        id: Uuid::now_v7(),
        project_id: Uuid::now_v7(),
        title: "Pick a database".to_string(),
        description: String::new(),
        rationale: String::new(),
        status: "pending".to_string(),
        impact: "high".to_string(),
        decided_date: None,
        decision_maker: String::new(),
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
    };

    assert_eq!(decision.days_since_creation(date(2024, 1, 31)), 30);
    assert!(!decision.is_pending_too_long(date(2024, 1, 31)));
    assert!(decision.is_pending_too_long(date(2024, 2, 1)));

    let decided = Decision {
        status: "decided".to_string(),
        ..decision
    };
    assert!(!decided.is_pending_too_long(date(2024, 6, 1)));
}

#[test]
fn artifact_version_bumps_minor() {
    assert_eq!(next_version("1.0"), "1.1");
    assert_eq!(next_version("2.9"), "2.10");
    assert_eq!(next_version(" 3.4 "), "3.5");
    assert_eq!(next_version("v1"), "1.1");
}

// ── Form validation ─────────────────────────────────────────────

#[test]
fn project_form_requires_ordered_dates() {
    let input = ProjectInput {
        name: Some("  Atlas  ".to_string()),
        description: Some("Maps".to_string()),
        status: None,
        start_date: Some("2024-05-01".to_string()),
        target_date: Some("2024-05-01".to_string()),
        owner_id: None,
    };
    let errors = input.validate().unwrap_err();
    assert!(errors.has(NON_FIELD));

    let input = ProjectInput {
        target_date: Some("2024-06-01".to_string()),
        ..input
    };
    let data = input.validate().unwrap();
    assert_eq!(data.name, "Atlas");
    assert_eq!(data.status.as_str(), "planning");
}

#[test]
fn project_form_rejects_bad_dates_and_long_names() {
    let input = ProjectInput {
        name: Some("x".repeat(101)),
        description: Some("d".to_string()),
        start_date: Some("01/02/2024".to_string()),
        target_date: Some("2024-13-01".to_string()),
        ..Default::default()
    };
    let errors = input.validate().unwrap_err();
    assert!(errors.has("name"));
    assert!(errors.has("start_date"));
    assert!(errors.has("target_date"));
}

#[test]
fn task_form_due_date_rule_applies_to_new_tasks() {
    let today = date(2024, 6, 10);
    let input = TaskInput {
        application_id: Some(Uuid::now_v7()),
        title: Some("Write docs".to_string()),
        due_date: Some("2024-06-01".to_string()),
        ..Default::default()
    };

    let errors = input.validate(today, true).unwrap_err();
    assert_eq!(errors.get("due_date").unwrap(), ["Due date cannot be in the past."]);

    let data = input.validate(today, false).unwrap();
    assert_eq!(data.status, TaskStatus::Pending);
    assert_eq!(data.assignee, TaskAssignee::Human);
}

#[test]
fn task_form_flags_runaway_hours() {
    let input = TaskInput {
        application_id: Some(Uuid::now_v7()),
        title: Some("Estimate".to_string()),
        estimated_hours: Some(4),
        actual_hours: Some(9),
        ..Default::default()
    };
    let errors = input.validate(date(2024, 1, 1), true).unwrap_err();
    assert!(errors.has("actual_hours"));

    let input = TaskInput {
        actual_hours: Some(8),
        ..input
    };
    assert!(input.validate(date(2024, 1, 1), true).is_ok());

    let input = TaskInput {
        estimated_hours: Some(-1),
        ..input
    };
    assert!(input.validate(date(2024, 1, 1), true).unwrap_err().has("estimated_hours"));
}

#[test]
fn task_form_accepts_huge_estimates() {
    let input = TaskInput {
        application_id: Some(Uuid::now_v7()),
        title: Some("Long haul".to_string()),
        estimated_hours: Some(2_000_000_000),
        actual_hours: Some(1),
        ..Default::default()
    };
    let data = input.validate(date(2024, 1, 1), true).unwrap();
    assert_eq!(data.estimated_hours, Some(2_000_000_000));

    let input = TaskInput {
        estimated_hours: Some(i64::from(i32::MAX)),
        actual_hours: Some(i64::from(i32::MAX)),
        ..input
    };
    assert!(input.validate(date(2024, 1, 1), true).is_ok());
}

#[test]
fn page_window_survives_extreme_page_numbers() {
    let page = Page::new(Some(i64::MAX), Some(100), 20);
    assert_eq!(page.limit, 100);
    assert_eq!(page.offset, (MAX_PAGE - 1) * 100);
    assert_eq!(page.number(), MAX_PAGE);

    let page = Page::new(Some(-5), Some(1_000), 20);
    assert_eq!(page.limit, 100);
    assert_eq!(page.offset, 0);

    let page = Page::new(Some(3), None, 20);
    assert_eq!(page.offset, 40);
}

#[test]
fn text_list_from_array_or_lines() {
    let list: TextList = serde_json::from_value(json!(["  a ", "", "b"])).unwrap();
    assert_eq!(list.into_items(), ["a", "b"]);

    let text: TextList = serde_json::from_value(json!("Rust\n\n  Axum \r\nSQL")).unwrap();
    assert_eq!(text.into_items(), ["Rust", "Axum", "SQL"]);
}

#[test]
fn bulk_form_actions() {
    let ids = vec![Uuid::now_v7(), Uuid::now_v7()];

    let op = BulkTaskInput {
        action: Some("complete".to_string()),
        task_ids: ids.clone(),
        ..Default::default()
    }
    .validate()
    .unwrap();
    assert_eq!(op.task_ids.len(), 2);
    assert!(matches!(op.action, BulkAction::SetStatus(TaskStatus::Completed)));

    let errors = BulkTaskInput {
        action: Some("update_due_date".to_string()),
        task_ids: ids.clone(),
        ..Default::default()
    }
    .validate()
    .unwrap_err();
    assert!(errors.has("new_due_date"));

    let errors = BulkTaskInput {
        action: Some("archive".to_string()),
        ..Default::default()
    }
    .validate()
    .unwrap_err();
    assert!(errors.has("action"));
    assert!(errors.has(NON_FIELD));

    let op = BulkTaskInput {
        action: Some("change_assignee".to_string()),
        new_assignee: Some("claude".to_string()),
        selected_tasks: Some(format!("{}, {}", ids[0], ids[0])),
        ..Default::default()
    }
    .validate()
    .unwrap();
    assert_eq!(op.task_ids, vec![ids[0]]);
    assert!(matches!(op.action, BulkAction::ChangeAssignee(TaskAssignee::Claude)));
}

#[test]
fn upload_checks_size_and_extension() {
    let max = 10 * 1024 * 1024;
    assert!(validate_upload("notes.MD", 100, max).is_ok());
    assert!(validate_upload("setup.exe", 100, max).unwrap_err().has("file"));
    assert!(validate_upload("big.pdf", max + 1, max).unwrap_err().has("file"));
    assert!(validate_upload("", 0, max).unwrap_err().has("file"));
}

// ── Export ──────────────────────────────────────────────────────

fn sample_export() -> ExportData {
    ExportData {
        timestamp: at(2024, 7, 4),
        project: None,
        datasets: vec![
            Dataset {
                kind: RecordType::Applications,
                columns: &["name", "version", "estimated_weeks", "features", "created_at"],
                rows: vec![
                    vec![
                        Cell::from("Api, v2"),
                        Cell::from("1.0"),
                        Cell::from(4_i64),
                        Cell::List(vec!["Login".to_string(), "Sync".to_string()]),
                        Cell::from(at(2024, 7, 1)),
                    ],
                    vec![
                        Cell::from("Say \"hi\""),
                        Cell::Null,
                        Cell::from(Some(2_i32)),
                        Cell::List(Vec::new()),
                        Cell::from(date(2024, 7, 2)),
                    ],
                ],
            },
            Dataset {
                kind: RecordType::Tasks,
                columns: &["title"],
                rows: Vec::new(),
            },
        ],
    }
}

#[test]
fn export_options_parse() {
    assert_eq!(ExportFormat::parse("excel"), Some(ExportFormat::Excel));
    assert_eq!(ExportFormat::parse("xlsx"), Some(ExportFormat::Excel));
    assert_eq!(ExportFormat::parse("yaml"), None);
    assert_eq!(ExportFormat::Excel.extension(), "xlsx");

    assert_eq!(export::parse_include(Vec::<&str>::new()).unwrap(), RecordType::ALL);
    assert_eq!(
        export::parse_include(["tasks", "tasks", "projects"]).unwrap(),
        [RecordType::Tasks, RecordType::Projects]
    );
    assert!(export::parse_include(["widgets"]).is_err());
}

#[test]
fn default_export_path_is_timestamped() {
    let path = export::default_path(
        std::path::Path::new("exports"),
        ExportFormat::Json,
        Utc.with_ymd_and_hms(2024, 7, 4, 9, 5, 3).unwrap(),
    );
    assert_eq!(path, std::path::Path::new("exports/devtracker_export_20240704_090503.json"));
}

#[test]
fn csv_escapes_per_rfc4180() {
    assert_eq!(csv::escape("plain"), "plain");
    assert_eq!(csv::escape("a,b"), "\"a,b\"");
    assert_eq!(csv::escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    assert_eq!(csv::escape("two\nlines"), "\"two\nlines\"");

    let data = sample_export();
    let bytes = csv::to_bytes(&data.datasets[0]);
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.split("\r\n").collect();
    assert_eq!(lines[0], "name,version,estimated_weeks,features,created_at");
    assert_eq!(lines[1], "\"Api, v2\",1.0,4,\"Login, Sync\",2024-07-01T12:00:00+00:00");
    assert_eq!(lines[2], "\"Say \"\"hi\"\"\",,2,,2024-07-02");
}

#[test]
fn json_export_layout() {
    let value = json_export::to_value(&sample_export());

    assert_eq!(value["export_info"]["format"], "json");
    assert_eq!(value["export_info"]["project"], "all");
    assert_eq!(value["export_info"]["include_types"], json!(["applications", "tasks"]));
    assert_eq!(value["data"]["tasks"], json!([]));

    let first = &value["data"]["applications"][0];
    assert_eq!(first["name"], "Api, v2");
    assert_eq!(first["estimated_weeks"], 4);
    assert_eq!(first["features"], json!(["Login", "Sync"]));
    assert_eq!(value["data"]["applications"][1]["version"], json!(null));
}

#[test]
fn write_files_per_format() {
    let dir = tempfile::tempdir().unwrap();
    let data = sample_export();

    let json_path = dir.path().join("nested/out.json");
    let written = export::write_files(&data, ExportFormat::Json, &json_path).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].records, 2);
    let parsed: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&json_path).unwrap()).unwrap();
    assert_eq!(parsed["data"]["applications"].as_array().unwrap().len(), 2);

    // Empty datasets produce no CSV file
    let written = export::write_files(&data, ExportFormat::Csv, &dir.path().join("out.csv")).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].path, dir.path().join("out_applications.csv"));
    assert!(!dir.path().join("out_tasks.csv").exists());

    let xlsx_path = dir.path().join("out.xlsx");
    export::write_files(&data, ExportFormat::Excel, &xlsx_path).unwrap();
    assert_eq!(&std::fs::read(&xlsx_path).unwrap()[..2], b"PK");
}

#[test]
fn spreadsheet_headers_are_title_cased() {
    assert_eq!(xlsx::column_title("start_date"), "Start Date");
    assert_eq!(xlsx::column_title("id"), "Id");
    assert!(!xlsx::to_bytes(&sample_export()).unwrap().is_empty());
}

// ── Storage ─────────────────────────────────────────────────────

#[test]
fn artifact_keys_cannot_climb_out_of_their_folder() {
    assert_eq!(
        storage::artifact_key("../x", "a/b", "..\\evil.md"),
        "artifacts/x/ab/evil.md"
    );
    assert_eq!(
        storage::artifact_key("Family Hub", "Web: App", "notes v2.txt"),
        "artifacts/Family_Hub/Web_App/notes_v2.txt"
    );
    assert_eq!(storage::artifact_key("..", "", "/"), "artifacts/unnamed/unnamed/unnamed");
}

#[test]
fn sanitized_names_are_safe_in_quoted_headers() {
    assert_eq!(storage::sanitize_segment("a\".md"), "a.md");
    assert_eq!(storage::sanitize_segment("line\r\nbreak.txt"), "linebreak.txt");
}

#[test]
fn download_content_type_follows_extension() {
    assert_eq!(storage::content_type_for("report.PDF"), "application/pdf");
    assert!(storage::content_type_for("notes.md").starts_with("text/markdown"));
    assert_eq!(storage::content_type_for("data.json"), "application/json");
    assert_eq!(storage::content_type_for("no_extension"), "application/octet-stream");
}

#[tokio::test]
async fn local_store_round_trip_and_rejects_escaping_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(dir.path());

    assert!(store.save("../x", Bytes::from_static(b"nope")).await.is_err());
    assert!(store.save("/etc/passwd", Bytes::from_static(b"nope")).await.is_err());
    assert!(store.save("", Bytes::from_static(b"nope")).await.is_err());
    assert!(store.load("artifacts/../../x").await.is_err());

    let key = storage::artifact_key("Hub", "Web", "notes.txt");
    store.save(&key, Bytes::from_static(b"hello")).await.unwrap();
    assert!(dir.path().join(&key).exists());
    assert_eq!(store.load(&key).await.unwrap().as_ref(), b"hello");

    store.delete(&key).await.unwrap();
    assert!(!dir.path().join(&key).exists());
    // Deleting a missing file is not an error
    store.delete(&key).await.unwrap();
}

// ── Login limiter ───────────────────────────────────────────────

#[test]
fn login_limiter_locks_after_max_failures() {
    let limiter = LoginRateLimiter::new(2, StdDuration::from_secs(60));
    assert!(limiter.is_empty());

    limiter.record_failure("Admin");
    assert!(limiter.check("admin").is_ok());
    limiter.record_failure("ADMIN");
    let wait = limiter.check("admin").unwrap_err();
    assert!(wait > 0 && wait <= 60);
    assert_eq!(limiter.len(), 1);

    limiter.reset("admin");
    assert!(limiter.check("admin").is_ok());
    assert!(limiter.is_empty());
}

#[test]
fn login_limiter_cleanup_drops_expired_windows() {
    let limiter = LoginRateLimiter::new(5, StdDuration::ZERO);
    limiter.record_failure("someone");
    limiter.record_failure("other");
    assert_eq!(limiter.len(), 2);

    limiter.cleanup();
    assert!(limiter.is_empty());
}
