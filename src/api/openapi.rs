//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{CreateEntryRequest, EntryResponse};
use crate::api::handlers::{guestbook, system};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI description, served as JSON at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        guestbook::create_entry,
        guestbook::list_entries,
        guestbook::get_entry,
        system::health_handler,
    ),
    components(schemas(
        CreateEntryRequest,
        EntryResponse,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Guestbook", description = "Guestbook entries"),
        (name = "System", description = "Health and status"),
    ),
    info(
        title = "Guestbook Gateway API",
        description = "Guestbook write service with fan-out entry notifications.",
    )
)]
pub struct ApiDoc;
