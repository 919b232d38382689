pub mod models;
pub mod routes;

use async_trait::async_trait;
use axum::{routing::get, Router};
use quill_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::state::AppState;

/// Blog posts with ownership checks, mounted at `/api/blogs`
pub struct BlogsModule {
    state: AppState,
}

impl BlogsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BlogsModule {
    fn name(&self) -> &'static str {
        "blogs"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let existing = ctx.db.collection::<models::BlogRecord>(models::BLOGS).count().await;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            database = ctx.db.name(),
            blogs = existing,
            "blogs module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(routes::list_blogs).post(routes::create_blog))
            .route("/stats", get(routes::blog_stats))
            .route(
                "/{id}",
                get(routes::get_blog)
                    .put(routes::update_blog)
                    .delete(routes::delete_blog),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let bearer = json!([{ "bearerAuth": [] }]);
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let blog = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Blog" }
                    }
                }
            })
        };
        let id_param = json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        }]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List blogs",
                        "tags": ["Blogs"],
                        "responses": {
                            "200": {
                                "description": "List of blogs",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Blog" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a blog owned by the caller",
                        "tags": ["Blogs"],
                        "security": bearer,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBlog" }
                                }
                            }
                        },
                        "responses": {
                            "201": blog("Blog created"),
                            "400": error("Missing title or url"),
                            "401": error("Token missing or invalid")
                        }
                    }
                },
                "/stats": {
                    "get": {
                        "summary": "Total likes and the most-liked blog",
                        "tags": ["Blogs"],
                        "responses": {
                            "200": {
                                "description": "Like summary",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BlogStats" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Fetch one blog",
                        "tags": ["Blogs"],
                        "parameters": id_param,
                        "responses": {
                            "200": blog("Blog"),
                            "404": error("No blog with this id")
                        }
                    },
                    "put": {
                        "summary": "Update a blog; only the owner may change fields other than likes",
                        "tags": ["Blogs"],
                        "security": bearer,
                        "parameters": id_param,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateBlog" }
                                }
                            }
                        },
                        "responses": {
                            "200": blog("Updated blog"),
                            "401": error("Token missing or invalid"),
                            "403": error("Caller does not own the blog"),
                            "404": error("No blog with this id")
                        }
                    },
                    "delete": {
                        "summary": "Delete a blog owned by the caller",
                        "tags": ["Blogs"],
                        "security": bearer,
                        "parameters": id_param,
                        "responses": {
                            "204": { "description": "Deleted" },
                            "401": error("Token missing or invalid"),
                            "403": error("Caller does not own the blog")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Blog": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "url": { "type": "string" },
                            "likes": { "type": "integer", "minimum": 0 },
                            "user": {
                                "type": "object",
                                "properties": {
                                    "id": { "type": "string" },
                                    "username": { "type": "string" },
                                    "name": { "type": "string" }
                                }
                            }
                        },
                        "required": ["id", "title", "url", "likes"]
                    },
                    "CreateBlog": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "url": { "type": "string" },
                            "likes": { "type": "integer", "minimum": 0 }
                        },
                        "required": ["title", "url"]
                    },
                    "UpdateBlog": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "url": { "type": "string" },
                            "likes": { "type": "integer", "minimum": 0 }
                        }
                    },
                    "BlogStats": {
                        "type": "object",
                        "properties": {
                            "total_likes": { "type": "integer", "minimum": 0 },
                            "favorite": {
                                "type": "object",
                                "properties": {
                                    "title": { "type": "string" },
                                    "author": { "type": "string" },
                                    "likes": { "type": "integer", "minimum": 0 }
                                }
                            }
                        },
                        "required": ["total_likes"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            collection: models::BLOGS,
            unique: &[],
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "blogs module stopped");
        Ok(())
    }
}

/// Create a new instance of the blogs module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BlogsModule::new(state))
}
