mod common;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use devtracker::seed::{self, SeedOptions};

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    common::cleanup(app).await;
}

// ── Registration & Auth ─────────────────────────────────────────

#[tokio::test]
async fn first_registered_user_is_admin() {
    let app = common::spawn_app().await;

    let (body, status) = app.register("admin", "admin@test.com", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["user"]["is_admin"], true);
    assert!(body["user"].get("password_hash").is_none());

    let (body, status) = app.register("dev", "dev@test.com", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_admin"], false);
    assert_eq!(body["user"]["role"], "developer");

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_reports_field_errors() {
    let app = common::spawn_app().await;

    let (body, status) = app.register("", "not-an-email", "short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["username"].is_array());
    assert!(body["fields"]["email"].is_array());
    assert!(body["fields"]["password"].is_array());

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (_, status) = app.register("admin", "other@test.com", "password123").await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_with_username_or_email() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app.login("admin", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    let (_, status) = app.login("admin@test.com", "password123").await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_invalid_credentials() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (_, status) = app.login("admin", "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app.login("nobody", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_is_rate_limited_after_repeated_failures() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    for _ in 0..5 {
        let (_, status) = app.login("admin", "wrongpassword").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while the limit holds
    let (_, status) = app.login("admin", "password123").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    common::cleanup(app).await;
}

#[tokio::test]
async fn refresh_token_rotation() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (login_body, _) = app.login("admin", "password123").await;
    let refresh = login_body["refresh_token"].as_str().unwrap().to_string();

    let resp = app
        .client
        .post(app.url("/api/v1/auth/refresh"))
        .header("cookie", format!("refresh_token={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let new_refresh = body["refresh_token"].as_str().unwrap();
    assert_ne!(new_refresh, refresh);

    // The rotated-out token is no longer accepted
    let resp = app
        .client
        .post(app.url("/api/v1/auth/refresh"))
        .header("cookie", format!("refresh_token={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn change_password_then_login() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app
        .post_auth(
            "/api/v1/auth/change-password",
            &token,
            &json!({ "current_password": "wrong", "new_password": "newpassword1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (_, status) = app
        .post_auth(
            "/api/v1/auth/change-password",
            &token,
            &json!({ "current_password": "password123", "new_password": "newpassword1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.login("admin", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, status) = app.login("admin", "newpassword1").await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn profile_update() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app
        .put_auth(
            "/api/v1/auth/me",
            &token,
            &json!({
                "email": "admin@test.com",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "role": "manager",
                "github_username": "ada",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["first_name"], "Ada");
    assert_eq!(body["role"], "manager");

    let (body, _) = app.get_auth("/api/v1/auth/me", &token).await;
    assert_eq!(body["github_username"], "ada");

    common::cleanup(app).await;
}

#[tokio::test]
async fn api_requires_authentication() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/api/v1/projects")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (_, status) = app.get_auth("/api/v1/projects", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn pages_redirect_to_login() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/tasks?status=pending")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers()["location"].to_str().unwrap();
    assert_eq!(location, "/auth/login?next=/tasks%3Fstatus%3Dpending");

    let resp = app.client.get(app.url("/auth/login")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    common::cleanup(app).await;
}

// ── Projects ────────────────────────────────────────────────────

#[tokio::test]
async fn project_crud() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let project = app.create_project(&token, "Atlas").await;
    let id = project["id"].as_str().unwrap();
    assert_eq!(project["status"], "development");
    assert_eq!(project["completion_percentage"], 0.0);
    assert_eq!(project["is_overdue"], false);

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/projects/{id}"),
            &token,
            &json!({
                "name": "Atlas 2",
                "description": "Second take",
                "status": "testing",
                "start_date": "2024-01-01",
                "target_date": "2030-06-30",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Atlas 2");
    assert_eq!(body["target_date"], "2030-06-30");

    let (body, _) = app.get_auth("/api/v1/projects?search=atlas", &token).await;
    assert_eq!(body["total"], 1);

    let (body, _) = app.get_auth("/api/v1/projects?status=planning", &token).await;
    assert_eq!(body["total"], 0);

    let (_, status) = app.delete_auth(&format!("/api/v1/projects/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.get_auth(&format!("/api/v1/projects/{id}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn project_validation() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app
        .post_auth(
            "/api/v1/projects",
            &token,
            &json!({
                "name": "Backwards",
                "description": "Ends before it starts",
                "status": "unknown",
                "start_date": "2025-06-01",
                "target_date": "2025-01-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["status"].is_array());
    assert!(body["fields"]["__all__"][0]
        .as_str()
        .unwrap()
        .contains("after the start date"));

    let (body, status) = app.post_auth("/api/v1/projects", &token, &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["name", "description", "start_date", "target_date"] {
        assert!(body["fields"][field].is_array(), "missing error for {field}");
    }

    common::cleanup(app).await;
}

#[tokio::test]
async fn only_owner_or_admin_can_change_project() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let dev = app.regular_user().await;

    let project = app.create_project(&admin, "Owned").await;
    let id = project["id"].as_str().unwrap();

    let (_, status) = app.delete_auth(&format!("/api/v1/projects/{id}"), &dev).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Anyone signed in can read it
    let (_, status) = app.get_auth(&format!("/api/v1/projects/{id}"), &dev).await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn project_progress_counts_tasks() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let project = app.create_project(&token, "Progress").await;
    let pid = project["id"].as_str().unwrap();
    let application = app.create_application(&token, pid, "Web").await;
    let aid = application["id"].as_str().unwrap();

    let done = app.create_task(&token, aid, "Done").await;
    app.create_task(&token, aid, "Open").await;
    let (_, status) = app
        .post_auth(
            &format!("/api/v1/tasks/{}/status", done["id"].as_str().unwrap()),
            &token,
            &json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app.get_auth(&format!("/api/v1/projects/{pid}/progress"), &token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total_tasks"], 2);
    assert_eq!(body["completed_tasks"], 1);
    assert_eq!(body["completion_percentage"], 50.0);

    let (body, _) = app.get_auth(&format!("/api/v1/projects/{pid}"), &token).await;
    assert_eq!(body["completion_percentage"], 50.0);
    assert_eq!(body["applications"].as_array().unwrap().len(), 1);

    common::cleanup(app).await;
}

// ── Applications ────────────────────────────────────────────────

#[tokio::test]
async fn application_lists_accept_arrays_and_lines() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let project = app.create_project(&token, "Lists").await;
    let application = app
        .create_application(&token, project["id"].as_str().unwrap(), "Mobile")
        .await;

    assert_eq!(application["features"], json!(["Login", "Reports"]));
    assert_eq!(application["tech_stack"], json!(["Rust", "Postgres"]));

    common::cleanup(app).await;
}

#[tokio::test]
async fn application_name_unique_within_project() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let first = app.create_project(&token, "First").await;
    let second = app.create_project(&token, "Second").await;
    let first_id = first["id"].as_str().unwrap();
    app.create_application(&token, first_id, "Api").await;

    let payload = |project_id: &str| {
        json!({
            "project_id": project_id,
            "name": "Api",
            "description": "Duplicate",
            "estimated_weeks": 2,
        })
    };

    let (body, status) = app
        .post_auth("/api/v1/applications", &token, &payload(first_id))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["name"].is_array());

    // Same name in another project is fine
    let (_, status) = app
        .post_auth("/api/v1/applications", &token, &payload(second["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn application_rejects_unknown_project() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app
        .post_auth(
            "/api/v1/applications",
            &token,
            &json!({
                "project_id": uuid::Uuid::now_v7(),
                "name": "Orphan",
                "description": "No parent",
                "estimated_weeks": 1,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["project_id"][0]
        .as_str()
        .unwrap()
        .starts_with("Select a valid choice"));

    common::cleanup(app).await;
}

// ── Tasks ───────────────────────────────────────────────────────

#[tokio::test]
async fn task_validation_rules() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Rules").await;
    let application = app
        .create_application(&token, project["id"].as_str().unwrap(), "Core")
        .await;
    let aid = application["id"].as_str().unwrap();

    let yesterday = (Utc::now() - Duration::days(1)).date_naive().to_string();
    let (body, status) = app
        .post_auth(
            "/api/v1/tasks",
            &token,
            &json!({
                "application_id": aid,
                "title": "Late",
                "due_date": yesterday,
                "estimated_hours": 2,
                "actual_hours": 5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["due_date"].is_array());
    assert!(body["fields"]["actual_hours"][0]
        .as_str()
        .unwrap()
        .contains("Consider updating the estimate"));

    let task = app.create_task(&token, aid, "Fine").await;
    assert_eq!(task["status"], "pending");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["assignee"], "human");

    common::cleanup(app).await;
}

#[tokio::test]
async fn task_status_and_bulk_updates() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Bulk").await;
    let application = app
        .create_application(&token, project["id"].as_str().unwrap(), "Svc")
        .await;
    let aid = application["id"].as_str().unwrap();

    let ids: Vec<String> = {
        let mut ids = Vec::new();
        for title in ["One", "Two", "Three"] {
            let task = app.create_task(&token, aid, title).await;
            ids.push(task["id"].as_str().unwrap().to_string());
        }
        ids
    };

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/tasks/{}/status", ids[0]),
            &token,
            &json!({ "status": "in-progress" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_display"], "In Progress");

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/tasks/{}/status", ids[0]),
            &token,
            &json!({ "status": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["status"].is_array());

    let (body, status) = app
        .post_auth(
            "/api/v1/tasks/bulk",
            &token,
            &json!({ "action": "complete", "task_ids": ids }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["updated"], 3);

    let (body, _) = app
        .get_auth(&format!("/api/v1/tasks?application={aid}&status=completed"), &token)
        .await;
    assert_eq!(body["total"], 3);

    let (body, status) = app
        .post_auth(
            "/api/v1/tasks/bulk",
            &token,
            &json!({ "action": "change_assignee", "task_ids": ids }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["new_assignee"].is_array());

    let (body, status) = app
        .post_auth("/api/v1/tasks/bulk", &token, &json!({ "action": "pending" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["__all__"].is_array());

    let (body, status) = app
        .post_auth(
            "/api/v1/tasks/bulk",
            &token,
            &json!({ "action": "change_assignee", "new_assignee": "team", "task_ids": ids }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (body, _) = app.get_auth(&format!("/api/v1/tasks/{}", ids[2]), &token).await;
    assert_eq!(body["assignee"], "team");

    common::cleanup(app).await;
}


#[tokio::test]
async fn task_kanban_groups_by_status() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Board").await;
    let pid = project["id"].as_str().unwrap();
    let application = app.create_application(&token, pid, "Web").await;
    let aid = application["id"].as_str().unwrap();

    let (long, status) = app
        .post_auth(
            "/api/v1/tasks",
            &token,
            &json!({
                "application_id": aid,
                "title": "Wordy",
                "description": "x".repeat(250),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{long}");
    let done = app.create_task(&token, aid, "Shipped").await;
    app.post_auth(
        &format!("/api/v1/tasks/{}/status", done["id"].as_str().unwrap()),
        &token,
        &json!({ "status": "completed" }),
    )
    .await;

    let (body, status) = app
        .get_auth(&format!("/api/v1/tasks/kanban?project={pid}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let columns = body.as_array().unwrap();
    let statuses: Vec<&str> = columns.iter().map(|c| c["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, ["pending", "in-progress", "completed", "blocked"]);

    let pending = &columns[0]["tasks"];
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["title"], "Wordy");
    assert_eq!(pending[0]["description"].as_str().unwrap().len(), 100);
    assert_eq!(pending[0]["project"], "Board");
    assert_eq!(pending[0]["application"], "Web");
    assert!(pending[0]["assigned_to"].is_null());
    assert_eq!(columns[2]["label"], "Completed");
    assert_eq!(columns[2]["tasks"][0]["title"], "Shipped");

    // Another project's board is empty
    let other = app.create_project(&token, "Elsewhere").await;
    let (body, _) = app
        .get_auth(
            &format!("/api/v1/tasks/kanban?project={}", other["id"].as_str().unwrap()),
            &token,
        )
        .await;
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["tasks"].as_array().unwrap().is_empty()));

    common::cleanup(app).await;
}

#[tokio::test]
async fn task_assign_sets_and_clears_user() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let dev_token = app.regular_user().await;
    let (dev, _) = app.get_auth("/api/v1/auth/me", &dev_token).await;
    let dev_id = dev["id"].as_str().unwrap();

    let project = app.create_project(&token, "Assign").await;
    let application = app
        .create_application(&token, project["id"].as_str().unwrap(), "Api")
        .await;
    let task = app
        .create_task(&token, application["id"].as_str().unwrap(), "Route it")
        .await;
    let tid = task["id"].as_str().unwrap();

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/tasks/{tid}/assign"),
            &token,
            &json!({ "assigned_user_id": dev_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["assigned_to"], "dev");
    assert_eq!(body["assigned_user_id"], dev_id);

    let (body, _) = app.get_auth(&format!("/api/v1/tasks/{tid}"), &token).await;
    assert_eq!(body["assigned_user_id"], dev_id);

    let (body, _) = app.get_auth("/api/v1/tasks/kanban", &token).await;
    assert_eq!(body[0]["tasks"][0]["assigned_to"], "dev");

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/tasks/{tid}/assign"),
            &token,
            &json!({ "assigned_user_id": null }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["assigned_to"].is_null());

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/tasks/{tid}/assign"),
            &token,
            &json!({ "assigned_user_id": Uuid::now_v7() }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/tasks/{}/assign", Uuid::now_v7()),
            &token,
            &json!({ "assigned_user_id": dev_id }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn list_survives_huge_page_number() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    app.create_project(&token, "Paged").await;

    let (body, status) = app
        .get_auth(&format!("/api/v1/projects?page={}", i64::MAX), &token)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn overdue_filter() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Late").await;
    let application = app
        .create_application(&token, project["id"].as_str().unwrap(), "Batch")
        .await;
    let task = app
        .create_task(&token, application["id"].as_str().unwrap(), "Backdated")
        .await;
    let id = task["id"].as_str().unwrap();

    // Past due dates are allowed once the task exists
    let last_week = (Utc::now() - Duration::days(7)).date_naive().to_string();
    let (body, status) = app
        .put_auth(
            &format!("/api/v1/tasks/{id}"),
            &token,
            &json!({
                "application_id": application["id"],
                "title": "Backdated",
                "due_date": last_week,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["is_overdue"], true);

    let (body, _) = app.get_auth("/api/v1/tasks?overdue=true", &token).await;
    assert_eq!(body["total"], 1);

    let (body, _) = app.get_auth("/api/v1/dashboard/overdue-tasks", &token).await;
    assert_eq!(body["overdue_tasks"].as_array().unwrap().len(), 1);

    common::cleanup(app).await;
}

// ── Artifacts ───────────────────────────────────────────────────

#[tokio::test]
async fn artifact_version_increment() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Docs").await;
    let application = app
        .create_application(&token, project["id"].as_str().unwrap(), "Site")
        .await;
    let aid = application["id"].as_str().unwrap();

    let artifact = app.create_artifact(&token, aid, "Spec").await;
    assert_eq!(artifact["version"], "1.0");
    assert_eq!(artifact["has_file"], false);

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/artifacts/{}", artifact["id"].as_str().unwrap()),
            &token,
            &json!({
                "application_id": aid,
                "name": "Spec",
                "type": "documentation",
                "increment_version": true,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["version"], "1.1");

    common::cleanup(app).await;
}

#[tokio::test]
async fn artifact_file_upload_and_download() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Files").await;
    let application = app
        .create_application(&token, project["id"].as_str().unwrap(), "Store")
        .await;
    let artifact = app
        .create_artifact(&token, application["id"].as_str().unwrap(), "Readme")
        .await;
    let id = artifact["id"].as_str().unwrap();

    let upload = |name: &'static str, data: &'static [u8]| {
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(data).file_name(name),
        );
        app.client
            .post(app.url(&format!("/api/v1/artifacts/{id}/file")))
            .bearer_auth(&token)
            .multipart(form)
            .send()
    };

    let resp = upload("virus.exe", b"MZ").await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["file"].is_array());

    let resp = upload("notes.txt", b"hello artifacts").await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["has_file"], true);
    assert_eq!(body["file_name"], "notes.txt");
    assert_eq!(body["file_size"], 15);

    let resp = app
        .client
        .get(app.url(&format!("/api/v1/artifacts/{id}/download")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("notes.txt"));
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"hello artifacts");

    // Over the configured limit
    let big = vec![b'a'; 70 * 1024];
    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(big).file_name("big.txt"),
    );
    let resp = app
        .client
        .post(app.url(&format!("/api/v1/artifacts/{id}/file")))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn artifact_versions_share_a_name() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "History").await;
    let application = app
        .create_application(&token, project["id"].as_str().unwrap(), "Svc")
        .await;
    let aid = application["id"].as_str().unwrap();

    let first = app.create_artifact(&token, aid, "Design").await;
    let (_, status) = app
        .post_auth(
            "/api/v1/artifacts",
            &token,
            &json!({ "application_id": aid, "name": "Design", "type": "design", "version": "2.0" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.create_artifact(&token, aid, "Other").await;

    let (body, status) = app
        .get_auth(
            &format!("/api/v1/artifacts/{}/versions", first["id"].as_str().unwrap()),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let versions = body.as_array().unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0]["version"], "2.0");

    common::cleanup(app).await;
}

// ── Decisions & Integrations ────────────────────────────────────

#[tokio::test]
async fn decision_crud() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Choices").await;
    let pid = project["id"].as_str().unwrap();

    let (body, status) = app
        .post_auth(
            "/api/v1/decisions",
            &token,
            &json!({
                "project_id": pid,
                "title": "Use Postgres",
                "description": "Storage engine",
                "rationale": "Mature and boring",
                "impact": "high",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "pending");
    let id = body["id"].as_str().unwrap().to_string();

    let (body, _) = app.get_auth(&format!("/api/v1/decisions?project={pid}&status=pending"), &token).await;
    assert_eq!(body["total"], 1);

    let (_, status) = app.delete_auth(&format!("/api/v1/decisions/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn integration_rules() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let p1 = app.create_project(&token, "One").await;
    let p2 = app.create_project(&token, "Two").await;
    let a = app.create_application(&token, p1["id"].as_str().unwrap(), "A").await;
    let b = app.create_application(&token, p1["id"].as_str().unwrap(), "B").await;
    let c = app.create_application(&token, p2["id"].as_str().unwrap(), "C").await;

    let payload = |from: &Value, to: &Value| {
        json!({
            "from_app_id": from["id"],
            "to_app_id": to["id"],
            "integration_type": "api-integration",
            "complexity": "medium",
            "description": "Share accounts",
            "estimated_weeks": 2,
        })
    };

    let (body, status) = app.post_auth("/api/v1/integrations", &token, &payload(&a, &a)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["to_app_id"].is_array());

    let (body, status) = app.post_auth("/api/v1/integrations", &token, &payload(&a, &c)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["__all__"].is_array());

    let (body, status) = app.post_auth("/api/v1/integrations", &token, &payload(&a, &b)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["complexity_multiplier"], 1.5);
    assert_eq!(body["estimated_hours"], 120);

    common::cleanup(app).await;
}

// ── Cascades ────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_project_cascades() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Doomed").await;
    let pid = project["id"].as_str().unwrap();
    let a = app.create_application(&token, pid, "A").await;
    let b = app.create_application(&token, pid, "B").await;
    let aid = a["id"].as_str().unwrap();
    let task = app.create_task(&token, aid, "Gone soon").await;
    let artifact = app.create_artifact(&token, aid, "Gone too").await;
    let (integration, status) = app
        .post_auth(
            "/api/v1/integrations",
            &token,
            &json!({
                "from_app_id": a["id"],
                "to_app_id": b["id"],
                "integration_type": "data-sharing",
                "description": "Nightly sync",
                "estimated_weeks": 1,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{integration}");

    let (_, status) = app.delete_auth(&format!("/api/v1/projects/{pid}"), &token).await;
    assert_eq!(status, StatusCode::OK);

    for path in [
        format!("/api/v1/applications/{aid}"),
        format!("/api/v1/tasks/{}", task["id"].as_str().unwrap()),
        format!("/api/v1/artifacts/{}", artifact["id"].as_str().unwrap()),
        format!("/api/v1/integrations/{}", integration["id"].as_str().unwrap()),
    ] {
        let (_, status) = app.get_auth(&path, &token).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path} survived");
    }

    common::cleanup(app).await;
}

// ── Search & Dashboard ──────────────────────────────────────────

#[tokio::test]
async fn search_across_types() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Nebula").await;
    let application = app
        .create_application(&token, project["id"].as_str().unwrap(), "Nebula Web")
        .await;
    app.create_task(&token, application["id"].as_str().unwrap(), "Wire nebula login")
        .await;

    let (body, status) = app.get_auth("/api/v1/search?q=nebula", &token).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["type"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"project"));
    assert!(kinds.contains(&"application"));
    assert!(kinds.contains(&"task"));

    let (body, _) = app.get_auth("/api/v1/search/suggestions?q=n", &token).await;
    assert_eq!(body["suggestions"], json!([]));

    common::cleanup(app).await;
}

#[tokio::test]
async fn dashboard_stats() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Stats").await;
    let application = app
        .create_application(&token, project["id"].as_str().unwrap(), "Core")
        .await;
    app.create_task(&token, application["id"].as_str().unwrap(), "Only").await;

    let (body, status) = app.get_auth("/api/v1/dashboard/stats", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_projects"], 1);
    assert_eq!(body["total_applications"], 1);
    assert_eq!(body["total_tasks"], 1);
    assert_eq!(body["task_completion_rate"], 0.0);

    let (body, status) = app
        .get_auth("/api/v1/dashboard/chart-data?type=project_status", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["labels"], json!(["Development"]));
    assert_eq!(body["data"], json!([1]));

    common::cleanup(app).await;
}

// ── Export ──────────────────────────────────────────────────────

#[tokio::test]
async fn export_json_and_csv() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Exported").await;
    let pid = project["id"].as_str().unwrap();
    let application = app.create_application(&token, pid, "Api, v2").await;
    app.create_task(&token, application["id"].as_str().unwrap(), "Ship \"it\"").await;
    app.create_project(&token, "Not exported").await;

    let (body, status) = app
        .get_auth(&format!("/api/v1/export?format=json&project={pid}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["export_info"]["format"], "json");
    assert_eq!(body["export_info"]["project"], "Exported");
    assert_eq!(body["data"]["projects"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["applications"][0]["name"], "Api, v2");
    assert_eq!(body["data"]["tasks"][0]["title"], "Ship \"it\"");

    let (_, status) = app.get_auth("/api/v1/export?format=csv", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let resp = app
        .client
        .get(app.url(&format!("/api/v1/export?format=csv&include=applications&project={pid}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-type"].to_str().unwrap().starts_with("text/csv"));
    let text = resp.text().await.unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("id,"));
    assert!(lines.next().unwrap().contains("\"Api, v2\""));

    let (_, status) = app
        .get_auth("/api/v1/export?format=json&include=widgets", &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn export_excel_workbook() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    app.create_project(&token, "Sheets").await;

    let resp = app
        .client
        .get(app.url("/api/v1/export?format=excel"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains(".xlsx"));
    // XLSX files are zip archives
    assert_eq!(&resp.bytes().await.unwrap()[..2], b"PK");

    common::cleanup(app).await;
}

// ── Seed ────────────────────────────────────────────────────────

#[tokio::test]
async fn seed_is_idempotent() {
    let app = common::spawn_app().await;
    let opts = SeedOptions {
        admin_username: "seeder".to_string(),
        admin_email: "Seeder@Example.com".to_string(),
        admin_password: "seedpass123".to_string(),
    };

    let first = seed::run(&app.pool, &opts).await.unwrap();
    assert!(first.admin_created);
    assert!(first.project_created);
    assert!(first.tasks > 0);

    let second = seed::run(&app.pool, &opts).await.unwrap();
    assert!(!second.admin_created);
    assert!(!second.project_created);
    assert_eq!(second.project_id, first.project_id);

    let projects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE name = $1")
        .bind(seed::SAMPLE_PROJECT)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(projects, 1);
    let tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(tasks, first.tasks as i64);
    let applications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(applications, first.applications as i64);

    // The seeded admin can sign in
    let (body, status) = app.login("seeder", "seedpass123").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["is_admin"], true);
    assert_eq!(body["user"]["email"], "seeder@example.com");

    common::cleanup(app).await;
}

// ── Admin ───────────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_require_admin() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let dev = app.regular_user().await;

    let (_, status) = app.get_auth("/api/v1/admin/users", &dev).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (body, status) = app.get_auth("/api/v1/admin/users", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (body, status) = app.get_auth("/api/v1/admin/audit", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["total"].as_i64().unwrap() >= 2);

    common::cleanup(app).await;
}

#[tokio::test]
async fn audit_log_filters_by_resource_type() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    app.create_project(&admin, "Audited").await;

    let (body, status) = app
        .get_auth("/api/v1/admin/audit?resource_type=project", &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    let event = &body["items"][0];
    assert_eq!(event["action"], "project.created");
    assert_eq!(event["resource_type"], "project");
    assert_eq!(event["actor"], "admin");

    common::cleanup(app).await;
}

#[tokio::test]
async fn admin_manages_users() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (body, status) = app
        .post_auth(
            "/api/v1/admin/users",
            &admin,
            &json!({
                "username": "tester",
                "email": "tester@test.com",
                "password": "password123",
                "role": "tester",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "tester");
    let id = body["id"].as_str().unwrap().to_string();

    let (_, status) = app.login("tester", "password123").await;
    assert_eq!(status, StatusCode::OK);

    let (me, _) = app.get_auth("/api/v1/auth/me", &admin).await;
    let (_, status) = app
        .delete_auth(&format!("/api/v1/admin/users/{}", me["id"].as_str().unwrap()), &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app.delete_auth(&format!("/api/v1/admin/users/{id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    let (_, status) = app.login("tester", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

// ── Pages ───────────────────────────────────────────────────────

#[tokio::test]
async fn pages_render_for_signed_in_users() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Rendered").await;
    let pid = project["id"].as_str().unwrap();
    let application = app.create_application(&token, pid, "Face").await;
    let aid = application["id"].as_str().unwrap();
    let task = app.create_task(&token, aid, "Paint").await;

    for path in [
        "/dashboard".to_string(),
        "/projects".to_string(),
        format!("/projects/{pid}"),
        format!("/projects/{pid}/edit"),
        "/applications/new".to_string(),
        format!("/applications/{aid}"),
        "/tasks?overdue=true".to_string(),
        format!("/tasks/{}", task["id"].as_str().unwrap()),
        "/search?q=paint".to_string(),
        "/profile".to_string(),
        "/admin/users".to_string(),
    ] {
        let resp = app
            .client
            .get(app.url(&path))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        let html = resp.text().await.unwrap();
        assert!(html.contains("DevTracker"), "{path}");
    }

    common::cleanup(app).await;
}
