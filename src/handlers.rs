use crate::errors::AppError;
use crate::export::{build_report, render_report_html, Report};
use crate::filter::{ViewFilter, ViewQuery};
use crate::models::{
    Checkpoint, CheckpointRequest, CheckpointUpdate, CompletionRequest, Stats, Subject,
    SubjectRequest,
};
use crate::state::{commit, AppState, Store};
use crate::stats::build_stats;
use crate::ui::{active_subject, render_index, tab_url, IndexPage};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
    Form, Json,
};
use tracing::warn;

pub async fn index(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Html<String> {
    let mut store = state.lock().await;
    let subjects = store.list_subjects();
    let active = active_subject(&subjects, query.tab.as_deref());
    let all = active
        .map(|subject| store.list_checkpoints(&subject.id))
        .unwrap_or_default();
    drop(store);

    let view = ViewFilter::from_query(&query);
    let visible = view.apply(&all);
    Html(render_index(&IndexPage {
        subjects: &subjects,
        active,
        checkpoints: &visible,
        stats: build_stats(&all),
        view: &view,
    }))
}

pub async fn export_page(State(state): State<AppState>) -> Html<String> {
    Html(render_report_html(&current_report(&state).await))
}

pub async fn get_export(State(state): State<AppState>) -> Json<Report> {
    Json(current_report(&state).await)
}

pub async fn list_subjects(State(state): State<AppState>) -> Json<Vec<Subject>> {
    let mut store = state.lock().await;
    Json(store.list_subjects())
}

pub async fn create_subject(
    State(state): State<AppState>,
    Json(payload): Json<SubjectRequest>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let subject = apply_create_subject(&state, &payload).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn create_subject_form(
    State(state): State<AppState>,
    Form(payload): Form<SubjectRequest>,
) -> Result<Redirect, AppError> {
    let subject = apply_create_subject(&state, &payload).await?;
    Ok(Redirect::to(&tab_url(&subject.id)))
}

pub async fn delete_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    apply_delete_subject(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_subject_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    apply_delete_subject(&state, &id).await?;
    Ok(Redirect::to("/"))
}

pub async fn list_checkpoints(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Vec<Checkpoint>>, AppError> {
    let mut store = state.lock().await;
    require_subject(&mut store, &id)?;
    let all = store.list_checkpoints(&id);
    Ok(Json(ViewFilter::from_query(&query).apply(&all)))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Stats>, AppError> {
    let mut store = state.lock().await;
    require_subject(&mut store, &id)?;
    Ok(Json(build_stats(&store.list_checkpoints(&id))))
}

pub async fn add_checkpoint(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CheckpointRequest>,
) -> Result<(StatusCode, Json<Checkpoint>), AppError> {
    let checkpoint = apply_add_checkpoint(&state, &id, &payload).await?;
    Ok((StatusCode::CREATED, Json(checkpoint)))
}

pub async fn add_checkpoint_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(payload): Form<CheckpointRequest>,
) -> Result<Redirect, AppError> {
    apply_add_checkpoint(&state, &id, &payload).await?;
    Ok(Redirect::to(&tab_url(&id)))
}

pub async fn update_checkpoint(
    State(state): State<AppState>,
    Path((id, checkpoint_id)): Path<(String, i64)>,
    Json(payload): Json<CheckpointUpdate>,
) -> Result<Json<Checkpoint>, AppError> {
    let checkpoint = payload.validate(checkpoint_id)?;

    let mut store = state.lock().await;
    let snapshot = store.kv().clone();
    require_subject(&mut store, &id)?;
    if !store.upsert_checkpoint(&id, checkpoint.clone()) {
        return Err(AppError::not_saved("checkpoint"));
    }
    commit(&state, &mut store, snapshot).await?;

    Ok(Json(checkpoint))
}

pub async fn set_completion(
    State(state): State<AppState>,
    Path((id, checkpoint_id)): Path<(String, i64)>,
    Json(payload): Json<CompletionRequest>,
) -> Result<Json<Checkpoint>, AppError> {
    let checkpoint = apply_completion(&state, &id, checkpoint_id, Some(payload.completed)).await?;
    Ok(Json(checkpoint))
}

pub async fn toggle_checkpoint_form(
    State(state): State<AppState>,
    Path((id, checkpoint_id)): Path<(String, i64)>,
) -> Result<Redirect, AppError> {
    apply_completion(&state, &id, checkpoint_id, None).await?;
    Ok(Redirect::to(&tab_url(&id)))
}

pub async fn delete_checkpoint(
    State(state): State<AppState>,
    Path((id, checkpoint_id)): Path<(String, i64)>,
) -> Result<StatusCode, AppError> {
    apply_delete_checkpoint(&state, &id, checkpoint_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_checkpoint_form(
    State(state): State<AppState>,
    Path((id, checkpoint_id)): Path<(String, i64)>,
) -> Result<Redirect, AppError> {
    apply_delete_checkpoint(&state, &id, checkpoint_id).await?;
    Ok(Redirect::to(&tab_url(&id)))
}

async fn apply_create_subject(state: &AppState, payload: &SubjectRequest) -> Result<Subject, AppError> {
    let (name, emoji) = payload.validate()?;

    let mut store = state.lock().await;
    let snapshot = store.kv().clone();
    let subject = store
        .create_subject(&name, &emoji)
        .ok_or_else(|| AppError::not_saved("subject"))?;
    commit(state, &mut store, snapshot).await?;

    Ok(subject)
}

async fn apply_delete_subject(state: &AppState, id: &str) -> Result<(), AppError> {
    let mut store = state.lock().await;
    let snapshot = store.kv().clone();
    if !store.delete_subject(id) {
        return Err(AppError::not_saved("subject deletion"));
    }
    commit(state, &mut store, snapshot).await
}

async fn apply_add_checkpoint(
    state: &AppState,
    id: &str,
    payload: &CheckpointRequest,
) -> Result<Checkpoint, AppError> {
    let new = payload.validate()?;

    let mut store = state.lock().await;
    let snapshot = store.kv().clone();
    require_subject(&mut store, id)?;
    let checkpoint = store
        .add_checkpoint(id, new)
        .ok_or_else(|| AppError::not_saved("checkpoint"))?;
    commit(state, &mut store, snapshot).await?;

    Ok(checkpoint)
}

/// Sets completion to `completed`, or flips it when `None`.
async fn apply_completion(
    state: &AppState,
    id: &str,
    checkpoint_id: i64,
    completed: Option<bool>,
) -> Result<Checkpoint, AppError> {
    let mut store = state.lock().await;
    let snapshot = store.kv().clone();
    require_subject(&mut store, id)?;
    let current = store
        .list_checkpoints(id)
        .into_iter()
        .find(|checkpoint| checkpoint.id == checkpoint_id)
        .ok_or_else(|| {
            warn!(subject = id, checkpoint_id, "checkpoint not found");
            AppError::not_found(format!("checkpoint {checkpoint_id} not found"))
        })?;

    let checkpoint = store
        .set_completed(id, checkpoint_id, completed.unwrap_or(!current.completed))
        .ok_or_else(|| AppError::not_saved("checkpoint"))?;
    commit(state, &mut store, snapshot).await?;

    Ok(checkpoint)
}

async fn apply_delete_checkpoint(state: &AppState, id: &str, checkpoint_id: i64) -> Result<(), AppError> {
    let mut store = state.lock().await;
    let snapshot = store.kv().clone();
    require_subject(&mut store, id)?;
    if !store.delete_checkpoint(id, checkpoint_id) {
        return Err(AppError::not_saved("checkpoint deletion"));
    }
    commit(state, &mut store, snapshot).await
}

fn require_subject(store: &mut Store, id: &str) -> Result<Subject, AppError> {
    store.subject(id).ok_or_else(|| {
        warn!(subject = id, "subject not found");
        AppError::not_found(format!("subject {id} not found"))
    })
}

async fn current_report(state: &AppState) -> Report {
    let mut store = state.lock().await;
    let subjects = store.list_subjects();
    let data = store.checkpoint_map();
    build_report(&subjects, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    // A directory as the data path makes every disk write fail.
    fn unwritable_state() -> AppState {
        AppState::new(std::env::temp_dir(), MemoryKv::new())
    }

    fn request(title: &str) -> CheckpointRequest {
        CheckpointRequest {
            title: title.to_string(),
            description: String::new(),
            date: "2024-01-01".to_string(),
            priority: Some("high".to_string()),
        }
    }

    #[tokio::test]
    async fn failed_flush_rolls_back_added_checkpoint() {
        let state = unwritable_state();
        let before = state.lock().await.kv().clone();

        let result = add_checkpoint(
            State(state.clone()),
            Path("dsa".to_string()),
            Json(request("Graphs")),
        )
        .await;

        match result {
            Err(err) => assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR),
            Ok(_) => panic!("write to a directory should fail"),
        }
        let store = state.lock().await;
        assert!(store.list_checkpoints("dsa").is_empty());
        assert_eq!(store.kv(), &before);
    }

    #[tokio::test]
    async fn failed_flush_rolls_back_subject_changes() {
        let state = unwritable_state();
        let before = state.lock().await.list_subjects();

        let created = create_subject(
            State(state.clone()),
            Json(SubjectRequest {
                name: "DevOps".to_string(),
                emoji: "🚀".to_string(),
            }),
        )
        .await;
        assert!(created.is_err());
        assert_eq!(state.lock().await.list_subjects(), before);

        let deleted = delete_subject(State(state.clone()), Path("java".to_string())).await;
        assert!(deleted.is_err());
        assert_eq!(state.lock().await.list_subjects(), before);
    }
}
