use axum::http::StatusCode;
use axum_test::TestServer;
use dsa_tracker::api::{create_router, Imported, ProblemResolves};
use dsa_tracker::db::Database;
use dsa_tracker::models::*;
use dsa_tracker::views::{DailySeries, TopicRow};
use serde_json::{json, Value};

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_topic(server: &TestServer, name: &str) -> Topic {
    server
        .post("/api/v1/topics")
        .json(&json!({ "name": name }))
        .await
        .json::<Topic>()
}

async fn create_test_problem(server: &TestServer, title: &str) -> Problem {
    server
        .post("/api/v1/problems")
        .json(&json!({ "title": title }))
        .await
        .json::<Problem>()
}

async fn log_resolve(server: &TestServer, body: Value) -> ResolveAttempt {
    server
        .post("/api/v1/resolves")
        .json(&body)
        .await
        .json::<ResolveAttempt>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }
}

mod topics {
    use super::*;

    #[tokio::test]
    async fn creates_and_lists_topics_with_totals() {
        let server = setup();
        let topic = server
            .post("/api/v1/topics")
            .json(&json!({ "name": " Graphs ", "goal_questions": "40", "goal_minutes": 600 }))
            .await;
        topic.assert_status(StatusCode::CREATED);
        let topic = topic.json::<Topic>();
        assert_eq!(topic.name, "Graphs");
        assert_eq!(topic.goal_questions, 40);
        assert_eq!(topic.goal_minutes, 600);

        server
            .post("/api/v1/sessions")
            .json(&json!({ "topic_id": topic.id, "duration_minutes": 25 }))
            .await
            .assert_status(StatusCode::CREATED);

        let rows = server.get("/api/v1/topics").await.json::<Vec<TopicRow>>();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sessions, 1);
        assert_eq!(rows[0].minutes, 25);
    }

    #[tokio::test]
    async fn requires_a_name() {
        let server = setup();
        let response = server
            .post("/api/v1/topics")
            .json(&json!({ "name": "   " }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Topic name required");
    }

    #[tokio::test]
    async fn rejects_duplicates() {
        let server = setup();
        create_test_topic(&server, "Arrays").await;
        let response = server
            .post("/api/v1/topics")
            .json(&json!({ "name": "arrays" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.text(), "Topic already exists");
    }

    #[tokio::test]
    async fn delete_cascades_and_404s_after() {
        let server = setup();
        let topic = create_test_topic(&server, "Trees").await;
        let problem = server
            .post("/api/v1/problems")
            .json(&json!({ "title": "Invert Tree", "topic_id": topic.id }))
            .await
            .json::<Problem>();

        server
            .delete(&format!("/api/v1/topics/{}", topic.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/api/v1/problems/{}", problem.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/api/v1/topics/{}", topic.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod problems {
    use super::*;

    #[tokio::test]
    async fn requires_a_title() {
        let server = setup();
        let response = server.post("/api/v1/problems").json(&json!({})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Title is required");
    }

    #[tokio::test]
    async fn malformed_date_and_minutes_fall_back() {
        let server = setup();
        let problem = server
            .post("/api/v1/problems")
            .json(&json!({
                "title": "Two Sum",
                "first_logged_date": "yesterday",
                "first_logged_minutes": "twenty"
            }))
            .await
            .json::<Problem>();
        assert_eq!(problem.first_logged_date, Some(dsa_tracker::today()));
        assert_eq!(problem.first_logged_minutes, 0);
        assert_eq!(problem.source, "LeetCode");
    }

    #[tokio::test]
    async fn edits_a_problem() {
        let server = setup();
        let problem = create_test_problem(&server, "Two Sum").await;

        let response = server
            .put(&format!("/api/v1/problems/{}", problem.id))
            .json(&json!({ "title": "", "difficulty": "Easy", "first_logged_minutes": 12 }))
            .await;
        response.assert_status_ok();
        let updated = response.json::<Problem>();
        assert_eq!(updated.title, "Two Sum");
        assert_eq!(updated.difficulty, "Easy");
        assert_eq!(updated.first_logged_minutes, 12);

        server
            .put("/api/v1/problems/999")
            .json(&json!({ "title": "x" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn overview_groups_and_counts() {
        let server = setup();
        let topic = create_test_topic(&server, "Arrays").await;
        server
            .post("/api/v1/problems")
            .json(&json!({ "title": "Two Sum", "topic_id": topic.id }))
            .await;
        let loose = create_test_problem(&server, "Loose").await;
        server
            .post(&format!("/api/v1/problems/{}/review", loose.id))
            .json(&json!({ "review_state": "on" }))
            .await
            .assert_status_ok();

        let overview = server.get("/api/v1/problems").await.json::<Value>();
        assert_eq!(overview["totals"]["total"], 2);
        assert_eq!(overview["totals"]["needs_review"], 1);
        assert_eq!(overview["groups"][0]["name"], "Arrays");
        assert_eq!(overview["groups"][1]["name"], "Misc / No Topic");
        assert_eq!(overview["review_preview"][0]["title"], "Loose");
    }

    #[tokio::test]
    async fn delete_removes_problem() {
        let server = setup();
        let problem = create_test_problem(&server, "Two Sum").await;
        server
            .delete(&format!("/api/v1/problems/{}", problem.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/api/v1/problems/{}", problem.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod reviews {
    use super::*;

    #[tokio::test]
    async fn updates_review_settings() {
        let server = setup();
        let problem = create_test_problem(&server, "Two Sum").await;

        let updated = server
            .post(&format!("/api/v1/problems/{}/review", problem.id))
            .json(&json!({
                "review_state": "on",
                "review_priority": "High",
                "review_notes": "off-by-one",
                "next_review_date": "2024-07-01"
            }))
            .await
            .json::<Problem>();
        assert!(updated.needs_review);
        assert_eq!(updated.review_priority, ReviewPriority::High);
        assert_eq!(updated.review_notes, "off-by-one");
        assert_eq!(updated.next_review_date.unwrap().to_string(), "2024-07-01");

        // A malformed date leaves the stored one alone.
        let kept = server
            .post(&format!("/api/v1/problems/{}/review", problem.id))
            .json(&json!({ "next_review_date": "next week" }))
            .await
            .json::<Problem>();
        assert_eq!(kept.next_review_date, updated.next_review_date);
        assert!(kept.needs_review);
    }

    #[tokio::test]
    async fn rejects_unknown_priority() {
        let server = setup();
        let problem = create_test_problem(&server, "Two Sum").await;
        server
            .post(&format!("/api/v1/problems/{}/review", problem.id))
            .json(&json!({ "review_priority": "Someday" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn board_lists_queue_history_and_focus() {
        let server = setup();
        let problem = create_test_problem(&server, "Two Sum").await;
        server
            .post(&format!("/api/v1/problems/{}/review", problem.id))
            .json(&json!({ "needs_review": true }))
            .await;
        for (day, minutes) in [("2024-01-01", 30), ("2024-02-01", 20)] {
            log_resolve(
                &server,
                json!({ "problem_id": problem.id, "planned_date": day, "minutes_spent": minutes, "outcome": "Solved" }),
            )
            .await;
        }

        let board = server
            .get("/api/v1/reviews")
            .add_query_param("problem_id", problem.id)
            .await
            .json::<Value>();
        assert_eq!(board["review_queue"].as_array().unwrap().len(), 1);
        assert_eq!(board["recent_attempts"].as_array().unwrap().len(), 2);
        assert_eq!(board["recent_attempts"][0]["problem_title"], "Two Sum");
        assert_eq!(board["history"][0]["progress_label"], "↓ 10 min");
        assert_eq!(board["history"][0]["progress_class"], "improved");
        assert_eq!(board["focus"]["id"], problem.id);
        assert_eq!(board["priorities"], json!(["Low", "Normal", "High", "Critical"]));
    }
}

mod resolves {
    use super::*;

    #[tokio::test]
    async fn requires_a_problem() {
        let server = setup();
        let response = server
            .post("/api/v1/resolves")
            .json(&json!({ "outcome": "Solved" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Select a problem to track a resolve attempt");

        server
            .post("/api/v1/resolves")
            .json(&json!({ "problem_id": 404 }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_outcome_is_logged_as_planned() {
        let server = setup();
        let problem = create_test_problem(&server, "Two Sum").await;
        let attempt = log_resolve(
            &server,
            json!({ "problem_id": problem.id.to_string(), "outcome": "Nailed it", "minutes_spent": "n/a" }),
        )
        .await;
        assert_eq!(attempt.outcome, ResolveOutcome::Planned);
        assert_eq!(attempt.minutes_spent, Some(0));
        assert_eq!(attempt.planned_date, Some(dsa_tracker::today()));
    }

    #[tokio::test]
    async fn outcome_update_validates_and_keeps_record_on_error() {
        let server = setup();
        let problem = create_test_problem(&server, "Two Sum").await;
        let attempt = log_resolve(
            &server,
            json!({ "problem_id": problem.id, "minutes_spent": 18 }),
        )
        .await;

        let response = server
            .post(&format!("/api/v1/resolves/{}/outcome", attempt.id))
            .json(&json!({ "outcome": "Done" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Invalid outcome");

        let updated = server
            .post(&format!("/api/v1/resolves/{}/outcome", attempt.id))
            .json(&json!({ "outcome": "Not Solved" }))
            .await
            .json::<ResolveAttempt>();
        assert_eq!(updated.outcome, ResolveOutcome::NotSolved);
        assert_eq!(updated.minutes_spent, Some(18));

        server
            .post("/api/v1/resolves/999/outcome")
            .json(&json!({ "outcome": "Solved" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lists_problem_attempts_with_stats() {
        let server = setup();
        let problem = create_test_problem(&server, "Two Sum").await;
        for (day, minutes, outcome) in [
            ("2024-01-01", 40, "Solved"),
            ("2024-01-10", 25, "Not Solved"),
            ("2024-01-20", 30, "Solved"),
        ] {
            log_resolve(
                &server,
                json!({ "problem_id": problem.id, "planned_date": day, "minutes_spent": minutes, "outcome": outcome }),
            )
            .await;
        }

        let resolves = server
            .get(&format!("/api/v1/problems/{}/resolves", problem.id))
            .await
            .json::<ProblemResolves>();
        assert_eq!(resolves.attempts.len(), 3);
        assert_eq!(resolves.attempts[0].planned_date.unwrap().to_string(), "2024-01-20");
        assert_eq!(resolves.stats.solved_count, 2);
        assert_eq!(resolves.stats.best_minutes, Some(30));
        assert_eq!(resolves.stats.avg_minutes, Some(35.0));
        assert_eq!(resolves.stats.progress.unwrap().label, "↓ 10 min");

        server
            .get("/api/v1/problems/999/resolves")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod sessions {
    use super::*;

    #[tokio::test]
    async fn logs_with_defaults_and_lists() {
        let server = setup();
        let session = server
            .post("/api/v1/sessions")
            .json(&json!({ "duration_minutes": "abc" }))
            .await
            .json::<Session>();
        assert_eq!(session.duration_minutes, 0);
        assert_eq!(session.attempts, 1);
        assert_eq!(session.outcome, "Solved");
        assert_eq!(session.date, Some(dsa_tracker::today()));

        let listed = server.get("/api/v1/sessions").await.json::<Value>();
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_problem_is_not_found() {
        let server = setup();
        server
            .post("/api/v1/sessions")
            .json(&json!({ "problem_id": 12 }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletes_a_session() {
        let server = setup();
        let session = server
            .post("/api/v1/sessions")
            .json(&json!({ "duration_minutes": 10 }))
            .await
            .json::<Session>();
        server
            .delete(&format!("/api/v1/sessions/{}", session.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete(&format!("/api/v1/sessions/{}", session.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bulk_import_counts_lines() {
        let server = setup();
        let response = server
            .post("/api/v1/sessions/bulk")
            .json(&json!({ "bulk": "2024-01-05|Arrays|Two Sum|30|Solved|clean\nshort|line\n2024-01-06|Arrays|Two Sum|20" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Imported>().imported, 2);

        let empty = server
            .post("/api/v1/sessions/bulk")
            .json(&json!({ "bulk": "" }))
            .await;
        empty.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(empty.text(), "No data provided");
    }

    #[tokio::test]
    async fn exports_csv() {
        let server = setup();
        server
            .post("/api/v1/sessions/bulk")
            .json(&json!({ "bulk": "2024-01-05|Arrays|Two Sum|30|Solved|clean" }))
            .await;

        let response = server.get("/api/v1/sessions/export").await;
        response.assert_status_ok();
        assert!(response
            .header("content-type")
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        assert_eq!(
            response.text(),
            "date,topic,problem,minutes,attempts,outcome,notes\n2024-01-05,Arrays,Two Sum,30,1,Solved,clean\n"
        );
    }
}

mod statistics {
    use super::*;

    #[tokio::test]
    async fn stats_cover_thirty_days() {
        let server = setup();
        server
            .post("/api/v1/sessions")
            .json(&json!({ "duration_minutes": 45 }))
            .await;

        let stats = server.get("/api/v1/stats").await.json::<DailySeries>();
        assert_eq!(stats.series.len(), 30);
        assert_eq!(stats.series.last().unwrap().date, dsa_tracker::today());
        assert_eq!(stats.series.last().unwrap().minutes, 45);
    }

    #[tokio::test]
    async fn dashboard_reports_totals() {
        let server = setup();
        let topic = create_test_topic(&server, "Graphs").await;
        server
            .post("/api/v1/sessions")
            .json(&json!({ "duration_minutes": 45, "topic_id": topic.id }))
            .await;

        let dashboard = server.get("/api/v1/dashboard").await.json::<Value>();
        assert_eq!(dashboard["totals"]["total_minutes"], 45);
        assert_eq!(dashboard["totals"]["total_sessions"], 1);
        assert_eq!(dashboard["top_topics"][0]["name"], "Graphs");
        assert_eq!(dashboard["last_week"].as_array().unwrap().len(), 7);
        assert_eq!(dashboard["last_week"][6]["minutes"], 45);
    }
}

mod spreadsheet_import {
    use super::*;

    #[tokio::test]
    async fn rejects_empty_and_unreadable_uploads() {
        let server = setup();
        let empty = server.post("/api/v1/import").await;
        empty.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(empty.text(), "No file uploaded");

        let garbage = server
            .post("/api/v1/import")
            .bytes("not a workbook".as_bytes().into())
            .await;
        garbage.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(garbage.text(), "Could not read workbook");
    }

    #[tokio::test]
    async fn imports_an_uploaded_workbook() {
        let server = setup();
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/practice_log.xlsx");
        let workbook = std::fs::read(path).expect("Failed to read workbook fixture");

        let response = server.post("/api/v1/import").bytes(workbook.into()).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Imported>().imported, 2);

        let sessions = server.get("/api/v1/sessions").await.json::<Value>();
        let sessions = sessions.as_array().unwrap();
        assert_eq!(sessions.len(), 2);
        let dated = sessions
            .iter()
            .find(|s| s["duration_minutes"] == 30)
            .expect("session for the dated row");
        assert_eq!(dated["date"], "2024-01-05");
    }
}
