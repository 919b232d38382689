pub mod models;
pub mod routes;

use async_trait::async_trait;
use quill_kernel::{InitCtx, Migration, Module};
use axum::{routing::get, Router};
use serde_json::json;

use crate::state::AppState;

/// User registration and listing, mounted at `/api/users`
pub struct UsersModule {
    state: AppState,
}

impl UsersModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let existing = ctx.db.collection::<models::UserRecord>(models::USERS).count().await;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            users = existing,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(routes::list_users).post(routes::create_user))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List users with their blogs",
                        "tags": ["Users"],
                        "responses": {
                            "200": {
                                "description": "List of users",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/User" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Register a user",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateUser" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "User created",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/User" }
                                    }
                                }
                            },
                            "400": {
                                "description": "Missing or short field, or username taken",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "username": { "type": "string" },
                            "name": { "type": "string" },
                            "blogs": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/BlogSummary" }
                            }
                        },
                        "required": ["id", "username", "name", "blogs"]
                    },
                    "BlogSummary": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "url": { "type": "string" },
                            "likes": { "type": "integer", "minimum": 0 }
                        },
                        "required": ["id", "title", "url", "likes"]
                    },
                    "CreateUser": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string", "minLength": 3 },
                            "name": { "type": "string", "minLength": 3 },
                            "password": { "type": "string", "minLength": 3 }
                        },
                        "required": ["username", "name", "password"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            collection: models::USERS,
            unique: &["username"],
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

/// Create a new instance of the users module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(UsersModule::new(state))
}
