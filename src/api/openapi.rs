//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{
    IssueForm, SessionListResponse, SessionUpdatesResponse, TrackDto, TrackUpdateDto,
};
use super::handlers::{issue, system, track_update};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI document, served at `/api-docs/openapi.json`
/// when the `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "trackstar-live",
        description = "Now-playing track update ingestion, history and live fan-out."
    ),
    paths(
        issue::issue_token,
        track_update::post_track_update,
        track_update::list_sessions,
        track_update::get_session,
        track_update::delete_session,
        system::health_handler,
    ),
    components(schemas(
        IssueForm,
        SessionListResponse,
        SessionUpdatesResponse,
        TrackDto,
        TrackUpdateDto,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Tokens", description = "Producer token issuance"),
        (name = "Track updates", description = "Ingestion and session history"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;
