//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Delve, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Research (`/api`)
//! - `POST /api/research` - Start a research job, body `{"topic": "..."}`
//! - `GET /api/status/{id}` - Poll a job: status, discovered sites, result
//!
//! ## Health
//! - `GET /health` - Health check endpoint
//!
//! # OpenAPI Documentation
//!
//! When the `swagger-ui` feature is enabled, interactive API documentation
//! is available at `/swagger-ui/`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{ResearchCreated, ResearchRequest, ResearchStatus, Site, StatusResponse};
use utoipa::OpenApi;

/// OpenAPI description of the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::research::create_research, handlers::research::get_status),
    components(schemas(ResearchRequest, ResearchCreated, StatusResponse, ResearchStatus, Site)),
    tags((name = "research", description = "Background research jobs"))
)]
pub struct ApiDoc;
