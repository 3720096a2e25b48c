//! CRUD endpoints shared by users, roles, divisions and positions.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/` | paginated list |
//! | POST | `/` | create (201) |
//! | GET | `/all` | active records, when the resource has them |
//! | GET | `/:id` | show |
//! | PUT, PATCH | `/:id` | update |
//! | DELETE | `/:id` | delete |

use crate::{
    extractors::{RequestActor, RequestPayload},
    responses::{created, done, ok, ok_with, ApiResponse, ApiResult, AppError},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use orgdesk_core::{ListParams, Page};
use orgdesk_service::{ListActive, Resource, ResourceHandler};
use std::sync::Arc;

type Handler<R> = State<Arc<ResourceHandler<R>>>;

/// Creates the CRUD router for one resource.
pub fn router<R, S>(handler: Arc<ResourceHandler<R>>) -> Router<S>
where
    R: Resource,
    S: Clone + Send + Sync + 'static,
{
    routes::<R>().with_state(handler)
}

/// Creates the CRUD router for a resource that also serves `/all`.
pub fn router_with_active<R, S>(handler: Arc<ResourceHandler<R>>) -> Router<S>
where
    R: ListActive,
    S: Clone + Send + Sync + 'static,
{
    routes::<R>()
        .route("/all", get(all::<R>))
        .with_state(handler)
}

fn routes<R: Resource>() -> Router<Arc<ResourceHandler<R>>> {
    Router::new()
        .route("/", get(index::<R>).post(store::<R>))
        .route("/:id", get(show::<R>).put(update::<R>).patch(update::<R>).delete(destroy::<R>))
}

async fn index<R: Resource>(
    State(handler): Handler<R>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<R::Summary>> {
    ok(handler.list(&params).await?)
}

async fn all<R: ListActive>(State(handler): Handler<R>) -> ApiResult<Vec<R::Entity>> {
    ok(handler.list_all_active().await?)
}

async fn store<R: Resource>(
    State(handler): Handler<R>,
    RequestActor(actor): RequestActor,
    RequestPayload(payload): RequestPayload,
) -> Result<(StatusCode, Json<ApiResponse<R::Detail>>), AppError> {
    let detail = handler.create(payload, actor).await?;
    Ok(created(format!("{} created successfully", R::NAME), detail))
}

async fn show<R: Resource>(State(handler): Handler<R>, Path(id): Path<String>) -> ApiResult<R::Detail> {
    let id = ResourceHandler::<R>::parse_id(&id)?;
    ok(handler.get(id).await?)
}

async fn update<R: Resource>(
    State(handler): Handler<R>,
    Path(id): Path<String>,
    RequestActor(actor): RequestActor,
    RequestPayload(payload): RequestPayload,
) -> ApiResult<R::Detail> {
    let id = ResourceHandler::<R>::parse_id(&id)?;
    let detail = handler.update(id, payload, actor).await?;
    ok_with(format!("{} updated successfully", R::NAME), detail)
}

async fn destroy<R: Resource>(State(handler): Handler<R>, Path(id): Path<String>) -> ApiResult<()> {
    let id = ResourceHandler::<R>::parse_id(&id)?;
    handler.delete(id).await?;
    done(format!("{} deleted successfully", R::NAME))
}
