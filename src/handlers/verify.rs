use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::VerificationSource;
use crate::error::ApiError;
use crate::services::property_service::{self, VerifyAction};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    pub action: String,
}

/// POST /verify/:property_id - owner-facing verification reached from an
/// emailed link. No session; the opaque property id is the credential.
///
/// Deliberate UX exception: the audience is non-technical owners in a
/// browser, so both success and failure render an HTML fragment, not JSON.
pub async fn submit(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
    Form(form): Form<VerifyForm>,
) -> Response {
    let action = match VerifyAction::parse(&form.action) {
        Ok(action) => action,
        Err(_) => {
            // Invalid action: reject before touching the record
            return error_page(
                StatusCode::BAD_REQUEST,
                "Invalid action",
                "That confirmation link carried an unsupported action. \
                 Please use the buttons in the email we sent you.",
            );
        }
    };

    match property_service::apply_verify_action(
        &state.pool,
        property_id,
        action,
        VerificationSource::Owner,
    )
    .await
    {
        Ok(property) => {
            let heading = match action {
                VerifyAction::Available => "Listing confirmed as available",
                VerifyAction::Sold => "Listing marked as sold",
            };
            success_page(heading, &property.title)
        }
        Err(ApiError::NotFound(_)) => error_page(
            StatusCode::NOT_FOUND,
            "Listing not found",
            "We could not find the listing this link refers to. It may have been removed.",
        ),
        Err(e) => {
            tracing::error!(property_id = %property_id, "verification failed: {}", e);
            error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                "We could not record your confirmation. Please try again later.",
            )
        }
    }
}

fn success_page(heading: &str, property_title: &str) -> Response {
    let body = format!(
        "<div class=\"verify-result verify-ok\">\
           <h1>{}</h1>\
           <p>Thank you for confirming the status of <strong>{}</strong>.</p>\
         </div>",
        heading,
        escape_html(property_title)
    );
    Html(body).into_response()
}

fn error_page(status: StatusCode, heading: &str, detail: &str) -> Response {
    let body = format!(
        "<div class=\"verify-result verify-error\">\
           <h1>{}</h1>\
           <p>{}</p>\
         </div>",
        heading, detail
    );
    (status, Html(body)).into_response()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
