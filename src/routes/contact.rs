/**
 * Contact Routes
 * Public inquiry form and the admin inbox
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use super::{decode, ApiResult, ListResponse};
use crate::models::settings::{self, ContactSettings};
use crate::models::{ContactForm, ContactSubmission};
use crate::routes::auth::AdminSession;
use crate::state::AppState;
use crate::store::{list_records, to_data, Collection, Record};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    /// Price list or brochure offered after submitting, when configured.
    pub download_url: Option<String>,
}

/// POST /api/contact
pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<ContactResponse>)> {
    let form: ContactForm = decode(body)?;
    form.validate()?;

    let submission = form.into_submission(chrono::Utc::now());
    let doc = state
        .store()
        .insert(Collection::ContactSubmissions, to_data(&submission)?)
        .await?;
    tracing::info!(id = %doc.id, event_type = %submission.form.event_type, "contact submission received");

    let contact: ContactSettings = settings::load(state.store()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            download_url: contact.downloadable_file_url,
        }),
    ))
}

/// GET /api/admin/inbox - Submissions, newest first
pub async fn inbox(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<ListResponse<Record<ContactSubmission>>>> {
    let mut submissions =
        list_records::<ContactSubmission>(state.store(), Collection::ContactSubmissions).await?;
    submissions.sort_by(|a, b| b.data.submitted_at.cmp(&a.data.submitted_at));
    Ok(Json(submissions.into()))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn form() -> serde_json::Value {
        json!({
            "name": "  Jane  ",
            "eventType": "Wedding",
            "location": "Yogyakarta",
            "whatsapp": "08123456789",
            "email": "",
            "knowFrom": ["Instagram"]
        })
    }

    #[tokio::test]
    async fn test_submit_stores_and_returns_download_url() {
        let state = state();
        let (status, _) = send(
            app(state.clone()),
            admin_json(
                "PUT",
                "/api/admin/settings/contact",
                &json!({ "downloadableFileUrl": "https://cdn.test/pricelist.pdf" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            app(state.clone()),
            public_json("POST", "/api/contact", &form()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["downloadUrl"], "https://cdn.test/pricelist.pdf");

        let (status, body) = send(app(state), admin_get("/api/admin/inbox")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["name"], "Jane");
        assert!(body["items"][0]["submittedAt"].is_string());
    }

    #[tokio::test]
    async fn test_submit_rejects_short_fields() {
        let mut body = form();
        body["whatsapp"] = json!("123");
        let (status, res) = send(app(state()), public_json("POST", "/api/contact", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(res["fields"]["whatsapp"].is_array());
    }

    #[tokio::test]
    async fn test_inbox_requires_session() {
        let (status, _) = send(app(state()), get("/api/admin/inbox")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
