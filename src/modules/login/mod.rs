pub mod routes;

use async_trait::async_trait;
use axum::{routing::post, Router};
use quill_kernel::Module;
use serde_json::json;

use crate::state::AppState;

/// Credential exchange for bearer tokens, mounted at `/api/login`
pub struct LoginModule {
    state: AppState,
}

impl LoginModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for LoginModule {
    fn name(&self) -> &'static str {
        "login"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(routes::login))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Exchange username and password for a bearer token",
                        "tags": ["Login"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/LoginRequest" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Token issued",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/LoginResponse" }
                                    }
                                }
                            },
                            "401": {
                                "description": "Invalid username or password",
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
                    "LoginRequest": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string" },
                            "password": { "type": "string" }
                        },
                        "required": ["username", "password"]
                    },
                    "LoginResponse": {
                        "type": "object",
                        "properties": {
                            "token": { "type": "string" },
                            "username": { "type": "string" },
                            "name": { "type": "string" }
                        },
                        "required": ["token", "username", "name"]
                    }
                }
            }
        }))
    }
}

/// Create a new instance of the login module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(LoginModule::new(state))
}
