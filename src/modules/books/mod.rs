pub mod controller;
pub mod memory;
pub mod models;
pub mod usecase;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use serde_json::{json, Value};
use shelf_kernel::{InitCtx, Module};

use controller::BooksController;
use usecase::BooksUseCase;

/// Books module: mounts the [`BooksController`] over an injected use-case
pub struct BooksModule {
    controller: BooksController,
}

impl BooksModule {
    pub fn new(usecase: Arc<dyn BooksUseCase>) -> Self {
        Self {
            controller: BooksController::new(usecase),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            default_limit = ctx.settings.books.default_limit,
            max_limit = ctx.settings.books.max_limit,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .merge(self.controller.routes())
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            query_parameter("title", "string", "Title substring"),
                            query_parameter("limit", "integer", "Page size"),
                            query_parameter("page", "integer", "1-based page number")
                        ],
                        "responses": {
                            "200": data_response("List of books", json!({
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            })),
                            "400": error_response("Malformed query string"),
                            "default": error_response("Use-case error")
                        }
                    },
                    "post": {
                        "summary": "Create a book owned by the caller",
                        "tags": ["Books"],
                        "requestBody": json_body("BooksReqCreate"),
                        "responses": {
                            "201": data_response("Created book", book_ref()),
                            "400": error_response("Malformed body"),
                            "401": error_response("Caller identity missing"),
                            "default": error_response("Use-case error")
                        }
                    }
                },
                "/{id_books}": {
                    "parameters": [{
                        "name": "id_books",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "string" }
                    }],
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": data_response("Book", book_ref()),
                            "400": error_response("Missing id"),
                            "default": error_response("Use-case error")
                        }
                    },
                    "put": update_operation("Replace book fields"),
                    "patch": update_operation("Update book fields"),
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": data_response("Deleted book id", json!({
                                "$ref": "#/components/schemas/BookDeleted"
                            })),
                            "400": error_response("Missing id"),
                            "default": error_response("Use-case error")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": {
                                    "text/plain": {
                                        "schema": { "type": "string" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "Unique identifier for the book" },
                            "title": { "type": "string", "description": "Title of the book" },
                            "author": { "type": "string", "description": "Author of the book" },
                            "user_id": { "type": "integer", "description": "Owner of the book" }
                        },
                        "required": ["id", "title"]
                    },
                    "BooksReqCreate": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" }
                        },
                        "required": ["title"]
                    },
                    "BooksReqUpdate": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" }
                        }
                    },
                    "BookDeleted": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" }
                        },
                        "required": ["id"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn book_ref() -> Value {
    json!({ "$ref": "#/components/schemas/Book" })
}

fn query_parameter(name: &str, kind: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": { "type": kind }
    })
}

fn json_body(schema: &str) -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn data_response(description: &str, data: Value) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": { "data": data },
                    "required": ["data"]
                }
            }
        }
    })
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn update_operation(summary: &str) -> Value {
    json!({
        "summary": summary,
        "tags": ["Books"],
        "requestBody": json_body("BooksReqUpdate"),
        "responses": {
            "200": data_response("Updated book", book_ref()),
            "400": error_response("Missing id or malformed body"),
            "default": error_response("Use-case error")
        }
    })
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

/// Create a new instance of the books module
pub fn create_module(usecase: Arc<dyn BooksUseCase>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(usecase))
}
