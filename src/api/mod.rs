mod handlers;

pub use handlers::{Imported, ProblemResolves};

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

/// Workbooks are uploaded whole.
const MAX_WORKBOOK_BYTES: usize = 16 * 1024 * 1024;

pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Statistics
        .route("/dashboard", get(handlers::dashboard))
        .route("/stats", get(handlers::stats))
        // Topics
        .route("/topics", get(handlers::list_topics).post(handlers::create_topic))
        .route("/topics/{id}", delete(handlers::delete_topic))
        // Problems
        .route(
            "/problems",
            get(handlers::problems_overview).post(handlers::create_problem),
        )
        .route(
            "/problems/{id}",
            get(handlers::get_problem)
                .put(handlers::update_problem)
                .delete(handlers::delete_problem),
        )
        .route("/problems/{id}/review", post(handlers::update_review))
        .route("/problems/{id}/resolves", get(handlers::list_problem_resolves))
        // Resolve attempts
        .route("/resolves", post(handlers::create_resolve))
        .route("/resolves/{id}/outcome", post(handlers::update_outcome))
        .route("/reviews", get(handlers::reviews_board))
        // Sessions
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/sessions/{id}", delete(handlers::delete_session))
        .route("/sessions/bulk", post(handlers::bulk_sessions))
        .route("/sessions/export", get(handlers::export_sessions))
        // Spreadsheet import
        .route(
            "/import",
            post(handlers::import_workbook).layer(DefaultBodyLimit::max(MAX_WORKBOOK_BYTES)),
        )
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
