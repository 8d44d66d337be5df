use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{ListQuery, Pagination, TaskBodyRequest, TaskListResponse, TaskResponse, PAGE_SIZE},
    repo_types::TaskQuery,
};
use crate::{
    auth::{
        access::{self, Action, Resource},
        extractors::AuthUser,
        middleware::require_role,
    },
    error::{route_not_found, AppError, AppJson, AppPath, AppResult},
    state::AppState,
};

pub const TASK_NOT_FOUND: &str = "Task not found.";

/// Routes under `/api/tasks`; the caller wraps them in authentication.
pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/tasks",
            get(list_tasks)
                .merge(post(create_task).route_layer(middleware::from_fn_with_state(
                    (Resource::Task, Action::Create),
                    require_role,
                )))
                .fallback(route_not_found),
        )
        .route("/api/tasks/:id", put(update_task).fallback(route_not_found))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppJson(payload): AppJson<TaskBodyRequest>,
) -> AppResult<(StatusCode, Json<TaskResponse>)> {
    let body = payload.into_body()?;
    let task = state.tasks.create(caller.id, &body).await?;

    info!(task_id = task.id, user_id = caller.id, "task created");
    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully",
            task,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    query: Option<Query<ListQuery>>,
) -> AppResult<Json<TaskListResponse>> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let page = query.page();
    let owner = access::list_scope(Resource::Task, &caller)?;

    let (tasks, total) = state
        .tasks
        .list(&TaskQuery {
            owner,
            sort: query.sort(),
            limit: PAGE_SIZE,
            offset: (page - 1).saturating_mul(PAGE_SIZE),
        })
        .await?;

    Ok(Json(TaskListResponse {
        tasks,
        pagination: Pagination::new(page, PAGE_SIZE, total),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<TaskBodyRequest>,
) -> AppResult<Json<TaskResponse>> {
    let body = payload.into_body()?;

    let task = state
        .tasks
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound(TASK_NOT_FOUND))?;

    if let Err(e) =
        access::ensure_owner_or_elevated(Resource::Task, Action::Update, &caller, task.user_id)
    {
        warn!(task_id = id, owner_id = task.user_id, user_id = caller.id, "task update denied");
        return Err(e);
    }

    let task = state
        .tasks
        .update_body(id, &body)
        .await?
        .ok_or(AppError::NotFound(TASK_NOT_FOUND))?;

    info!(task_id = task.id, user_id = caller.id, "task updated");
    Ok(Json(TaskResponse {
        message: "Task updated successfully",
        task,
    }))
}
