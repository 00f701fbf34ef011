//! HTTP adapter between the books routes and a [`BooksUseCase`].
//!
//! Every handler follows the same pipeline: decode transport input, call the
//! use-case once with the request's [`RequestScope`] context, and wrap the
//! outcome in an [`Envelope`](shelf_http::Envelope). Input that cannot be
//! decoded is answered with 400 before the use-case is reached.

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use shelf_authz::Identity;
use shelf_http::{
    respond, ApiError, ApiResult, CiJson, CiQuery, DataResponse, InputRejection, RequestScope,
    BAD_REQUEST,
};

use super::models::{Book, BookDeleted, BooksFilter, BooksReqCreate, BooksReqUpdate};
use super::usecase::BooksUseCase;

#[derive(Clone)]
pub struct BooksController {
    usecase: Arc<dyn BooksUseCase>,
}

impl BooksController {
    pub fn new(usecase: Arc<dyn BooksUseCase>) -> Self {
        Self { usecase }
    }

    pub fn routes(&self) -> Router {
        Router::new()
            .route("/", get(get_all_books).post(create_books))
            .route(
                "/{id_books}",
                get(get_books_by_id)
                    .put(update_books_by_id)
                    .patch(update_books_by_id)
                    .delete(delete_books_by_id),
            )
            .with_state(self.clone())
    }
}

/// Non-empty `id_books` path segment, or 400.
fn books_id(path: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    match path {
        Ok(Path(id)) if !id.is_empty() => Ok(id),
        Ok(_) => Err(ApiError::bad_request(BAD_REQUEST)),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "invalid books id");
            Err(ApiError::bad_request(BAD_REQUEST))
        }
    }
}

async fn get_all_books(
    State(controller): State<BooksController>,
    scope: RequestScope,
    query: Result<CiQuery<BooksFilter>, InputRejection>,
) -> ApiResult<DataResponse<Vec<Book>>> {
    let CiQuery(filter) =
        query.inspect_err(|error| tracing::warn!(%error, "invalid books filter"))?;

    let books = controller
        .usecase
        .get_all_books(scope.ctx(), filter)
        .await?;

    Ok(respond(StatusCode::OK, books))
}

async fn get_books_by_id(
    State(controller): State<BooksController>,
    scope: RequestScope,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<DataResponse<Book>> {
    let id = books_id(path)?;

    let book = controller.usecase.get_books_by_id(scope.ctx(), &id).await?;

    Ok(respond(StatusCode::OK, book))
}

async fn create_books(
    State(controller): State<BooksController>,
    scope: RequestScope,
    identity: Identity,
    body: Result<CiJson<BooksReqCreate>, InputRejection>,
) -> ApiResult<DataResponse<Book>> {
    tracing::debug!(
        user_id = %identity.user_id,
        email = %identity.email,
        "create book requested"
    );

    let CiJson(mut req) =
        body.inspect_err(|error| tracing::warn!(%error, "invalid create books body"))?;
    req.user_id = identity.numeric_user_id();

    let book = controller.usecase.create_books(scope.ctx(), req).await?;

    Ok(respond(StatusCode::CREATED, book))
}

async fn update_books_by_id(
    State(controller): State<BooksController>,
    scope: RequestScope,
    path: Result<Path<String>, PathRejection>,
    body: Result<CiJson<BooksReqUpdate>, InputRejection>,
) -> ApiResult<DataResponse<Book>> {
    let id = books_id(path)?;
    let CiJson(req) = body.map_err(|error| {
        tracing::warn!(%error, "invalid update books body");
        ApiError::bad_request(BAD_REQUEST)
    })?;

    let book = controller
        .usecase
        .update_books_by_id(scope.ctx(), &id, req)
        .await?;

    Ok(respond(StatusCode::OK, book))
}

async fn delete_books_by_id(
    State(controller): State<BooksController>,
    scope: RequestScope,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<DataResponse<BookDeleted>> {
    let id = books_id(path)?;

    let deleted = controller
        .usecase
        .delete_books_by_id(scope.ctx(), &id)
        .await?;

    Ok(respond(StatusCode::OK, deleted))
}
