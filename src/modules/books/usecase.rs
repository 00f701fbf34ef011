use async_trait::async_trait;
use shelf_kernel::{RequestCtx, UseCaseResult};

use super::models::{Book, BookDeleted, BooksFilter, BooksReqCreate, BooksReqUpdate};

/// Business logic behind the books endpoints.
///
/// Implementations own persistence, pagination and domain rules. Failures
/// carry their own status classification which the controller passes
/// through untouched.
#[async_trait]
pub trait BooksUseCase: Send + Sync {
    async fn get_all_books(&self, ctx: &RequestCtx, filter: BooksFilter)
        -> UseCaseResult<Vec<Book>>;

    async fn get_books_by_id(&self, ctx: &RequestCtx, id: &str) -> UseCaseResult<Book>;

    async fn create_books(&self, ctx: &RequestCtx, req: BooksReqCreate) -> UseCaseResult<Book>;

    async fn update_books_by_id(
        &self,
        ctx: &RequestCtx,
        id: &str,
        req: BooksReqUpdate,
    ) -> UseCaseResult<Book>;

    async fn delete_books_by_id(&self, ctx: &RequestCtx, id: &str)
        -> UseCaseResult<BookDeleted>;
}
