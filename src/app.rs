use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/export", get(handlers::export_page))
        .route("/subjects", post(handlers::create_subject_form))
        .route("/subjects/:id/delete", post(handlers::delete_subject_form))
        .route("/subjects/:id/checkpoints", post(handlers::add_checkpoint_form))
        .route(
            "/subjects/:id/checkpoints/:checkpoint_id/toggle",
            post(handlers::toggle_checkpoint_form),
        )
        .route(
            "/subjects/:id/checkpoints/:checkpoint_id/delete",
            post(handlers::delete_checkpoint_form),
        )
        .route(
            "/api/subjects",
            get(handlers::list_subjects).post(handlers::create_subject),
        )
        .route("/api/subjects/:id", axum::routing::delete(handlers::delete_subject))
        .route(
            "/api/subjects/:id/checkpoints",
            get(handlers::list_checkpoints).post(handlers::add_checkpoint),
        )
        .route(
            "/api/subjects/:id/checkpoints/:checkpoint_id",
            put(handlers::update_checkpoint)
                .patch(handlers::set_completion)
                .delete(handlers::delete_checkpoint),
        )
        .route("/api/subjects/:id/stats", get(handlers::get_stats))
        .route("/api/export", get(handlers::get_export))
        .with_state(state)
}
