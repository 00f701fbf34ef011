//! Process-local [`BooksUseCase`] backed by a `BTreeMap`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use shelf_kernel::{settings::BooksSettings, RequestCtx, UseCaseError, UseCaseResult};
use tokio::sync::RwLock;

use super::models::{Book, BookDeleted, BooksFilter, BooksReqCreate, BooksReqUpdate};
use super::usecase::BooksUseCase;

const NOT_FOUND: &str = "book not found";
const TITLE_REQUIRED: &str = "title is required";

#[derive(Debug, Default)]
struct Store {
    last_id: u64,
    books: BTreeMap<u64, Book>,
}

pub struct InMemoryBooks {
    settings: BooksSettings,
    store: RwLock<Store>,
}

impl InMemoryBooks {
    pub fn new(settings: BooksSettings) -> Self {
        Self {
            settings,
            store: RwLock::new(Store::default()),
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.store.read().await.books.len()
    }

    /// Effective `(limit, offset)` for a filter.
    fn window(&self, filter: &BooksFilter) -> (usize, usize) {
        let limit = match filter.limit {
            None | Some(0) => self.settings.default_limit,
            Some(limit) => limit.min(self.settings.max_limit),
        };
        let page = filter.page.filter(|page| *page > 0).unwrap_or(1);
        let offset = u64::from(page - 1).saturating_mul(u64::from(limit));
        (
            limit as usize,
            usize::try_from(offset).unwrap_or(usize::MAX),
        )
    }
}

fn ensure_live(ctx: &RequestCtx) -> UseCaseResult<()> {
    if ctx.is_cancelled() {
        return Err(UseCaseError::unavailable("request cancelled"));
    }
    Ok(())
}

/// Ids are decimal; anything else can never match a stored book.
fn parse_id(id: &str) -> UseCaseResult<u64> {
    id.parse().map_err(|_| UseCaseError::not_found(NOT_FOUND))
}

fn require_title(title: &str) -> UseCaseResult<()> {
    if title.trim().is_empty() {
        return Err(UseCaseError::bad_request(TITLE_REQUIRED));
    }
    Ok(())
}

#[async_trait]
impl BooksUseCase for InMemoryBooks {
    async fn get_all_books(
        &self,
        ctx: &RequestCtx,
        filter: BooksFilter,
    ) -> UseCaseResult<Vec<Book>> {
        ensure_live(ctx)?;
        let (limit, offset) = self.window(&filter);
        let needle = filter.title.as_deref().map(str::to_lowercase);

        let store = self.store.read().await;
        let books: Vec<Book> = store
            .books
            .values()
            .filter(|book| match &needle {
                Some(needle) => book.title.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        tracing::debug!(
            request_id = ctx.request_id(),
            returned = books.len(),
            limit,
            offset,
            "listed books"
        );
        Ok(books)
    }

    async fn get_books_by_id(&self, ctx: &RequestCtx, id: &str) -> UseCaseResult<Book> {
        ensure_live(ctx)?;
        let key = parse_id(id)?;

        self.store
            .read()
            .await
            .books
            .get(&key)
            .cloned()
            .ok_or_else(|| UseCaseError::not_found(NOT_FOUND))
    }

    async fn create_books(&self, ctx: &RequestCtx, req: BooksReqCreate) -> UseCaseResult<Book> {
        ensure_live(ctx)?;
        require_title(&req.title)?;

        let mut store = self.store.write().await;
        store.last_id += 1;
        let key = store.last_id;
        let book = Book {
            id: key.to_string(),
            title: req.title,
            author: req.author,
            user_id: Some(req.user_id),
        };
        store.books.insert(key, book.clone());

        tracing::info!(
            request_id = ctx.request_id(),
            book_id = %book.id,
            user_id = req.user_id,
            "book created"
        );
        Ok(book)
    }

    async fn update_books_by_id(
        &self,
        ctx: &RequestCtx,
        id: &str,
        req: BooksReqUpdate,
    ) -> UseCaseResult<Book> {
        ensure_live(ctx)?;
        let key = parse_id(id)?;
        if let Some(title) = &req.title {
            require_title(title)?;
        }

        let mut store = self.store.write().await;
        let book = store
            .books
            .get_mut(&key)
            .ok_or_else(|| UseCaseError::not_found(NOT_FOUND))?;
        if let Some(title) = req.title {
            book.title = title;
        }
        if let Some(author) = req.author {
            book.author = Some(author);
        }

        tracing::info!(request_id = ctx.request_id(), book_id = %book.id, "book updated");
        Ok(book.clone())
    }

    async fn delete_books_by_id(&self, ctx: &RequestCtx, id: &str) -> UseCaseResult<BookDeleted> {
        ensure_live(ctx)?;
        let key = parse_id(id)?;

        let removed = self.store.write().await.books.remove(&key);
        match removed {
            Some(book) => {
                tracing::info!(request_id = ctx.request_id(), book_id = %book.id, "book deleted");
                Ok(BookDeleted { id: book.id })
            }
            None => Err(UseCaseError::not_found(NOT_FOUND)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_kernel::ErrorKind;

    fn cancelled_ctx() -> RequestCtx {
        let ctx = RequestCtx::background();
        ctx.cancellation_token().cancel();
        ctx
    }

    fn create(title: &str, user_id: u64) -> BooksReqCreate {
        BooksReqCreate {
            title: title.to_string(),
            author: None,
            user_id,
        }
    }

    async fn seeded(titles: &[&str]) -> InMemoryBooks {
        let books = InMemoryBooks::new(BooksSettings::default());
        let ctx = RequestCtx::background();
        for title in titles {
            books.create_books(&ctx, create(title, 1)).await.unwrap();
        }
        books
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|book| book.title.as_str()).collect()
    }

    #[tokio::test]
    async fn ids_are_sequential_and_owner_is_recorded() {
        let books = InMemoryBooks::new(BooksSettings::default());
        let ctx = RequestCtx::background();

        let first = books.create_books(&ctx, create("Dune", 42)).await.unwrap();
        let second = books.create_books(&ctx, create("Emma", 0)).await.unwrap();

        assert_eq!(first.id, "1");
        assert_eq!(first.user_id, Some(42));
        assert_eq!(second.id, "2");
        assert_eq!(books.len().await, 2);
    }

    #[tokio::test]
    async fn title_filter_is_a_case_insensitive_substring() {
        let books = seeded(&["Dune", "Dune Messiah", "Emma", "Children of Dune"]).await;

        let found = books
            .get_all_books(
                &RequestCtx::background(),
                BooksFilter {
                    title: Some("dUnE".to_string()),
                    ..BooksFilter::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(titles(&found), vec!["Dune", "Dune Messiah", "Children of Dune"]);
    }

    #[tokio::test]
    async fn pagination_uses_limit_and_page() {
        let books = seeded(&["a", "b", "c", "d", "e"]).await;
        let ctx = RequestCtx::background();
        let page = |limit, page| BooksFilter {
            title: None,
            limit: Some(limit),
            page: Some(page),
        };

        let second = books.get_all_books(&ctx, page(2, 2)).await.unwrap();
        assert_eq!(titles(&second), vec!["c", "d"]);

        let past_end = books.get_all_books(&ctx, page(2, 9)).await.unwrap();
        assert!(past_end.is_empty());

        let page_zero = books.get_all_books(&ctx, page(2, 0)).await.unwrap();
        assert_eq!(titles(&page_zero), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn limit_defaults_and_is_clamped() {
        let books = InMemoryBooks::new(BooksSettings {
            default_limit: 2,
            max_limit: 3,
        });
        let ctx = RequestCtx::background();
        for title in ["a", "b", "c", "d"] {
            books.create_books(&ctx, create(title, 1)).await.unwrap();
        }

        let defaulted = books
            .get_all_books(&ctx, BooksFilter::default())
            .await
            .unwrap();
        assert_eq!(defaulted.len(), 2);

        let clamped = books
            .get_all_books(
                &ctx,
                BooksFilter {
                    limit: Some(50),
                    ..BooksFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(clamped.len(), 3);
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let books = seeded(&["Dune"]).await;
        let ctx = RequestCtx::background();

        let error = books.create_books(&ctx, create("  ", 1)).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::BadRequest);
        assert_eq!(error.message, "title is required");

        let error = books
            .update_books_by_id(
                &ctx,
                "1",
                BooksReqUpdate {
                    title: Some(String::new()),
                    author: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn update_changes_only_present_fields() {
        let books = seeded(&["Dune"]).await;
        let ctx = RequestCtx::background();

        let updated = books
            .update_books_by_id(
                &ctx,
                "1",
                BooksReqUpdate {
                    title: None,
                    author: Some("Frank Herbert".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(books.get_books_by_id(&ctx, "1").await.unwrap(), updated);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let books = seeded(&["Dune"]).await;
        let ctx = RequestCtx::background();

        for id in ["2", "abc"] {
            let error = books.get_books_by_id(&ctx, id).await.unwrap_err();
            assert_eq!(error, UseCaseError::not_found("book not found"));
        }
        let error = books
            .update_books_by_id(&ctx, "7", BooksReqUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn delete_removes_once() {
        let books = seeded(&["Dune"]).await;
        let ctx = RequestCtx::background();

        let deleted = books.delete_books_by_id(&ctx, "1").await.unwrap();
        assert_eq!(deleted, BookDeleted { id: "1".to_string() });

        let error = books.delete_books_by_id(&ctx, "1").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::NotFound);
        assert_eq!(books.len().await, 0);
    }

    #[tokio::test]
    async fn cancelled_requests_are_refused() {
        let books = seeded(&["Dune"]).await;

        let error = books
            .get_books_by_id(&cancelled_ctx(), "1")
            .await
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::Unavailable);
        assert_eq!(books.len().await, 1);
    }
}
