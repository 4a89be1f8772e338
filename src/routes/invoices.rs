/**
 * Invoice Routes
 * Admin invoice management, the public share page and the PDF download
 */
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::{decode, ApiError, ApiResult, ListResponse, SuccessResponse};
use crate::invoice::{pdf::render_invoice_pdf, BusinessInfo, InvoiceView};
use crate::models::settings::{self, GeneralSettings, ServicesSettings};
use crate::models::{Invoice, InvoiceTotals};
use crate::routes::auth::AdminSession;
use crate::state::AppState;
use crate::store::{get_record, list_records, to_data, Collection, Record};

#[derive(Debug, Serialize)]
pub struct InvoiceListItem {
    #[serde(flatten)]
    pub record: Record<Invoice>,
    pub totals: InvoiceTotals,
}

/// Validate and normalise an invoice body before it is written.
fn prepare(body: Value) -> ApiResult<Invoice> {
    let mut invoice: Invoice = decode(body)?;
    invoice.check()?;
    invoice.assign_item_ids();
    Ok(invoice)
}

async fn load(state: &AppState, id: &str) -> ApiResult<Record<Invoice>> {
    get_record::<Invoice>(state.store(), Collection::Invoices, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice not found"))
}

/// Issuer header from the general and services settings.
async fn business_info(state: &AppState) -> ApiResult<BusinessInfo> {
    let general: GeneralSettings = settings::load(state.store()).await?;
    let services: ServicesSettings = settings::load(state.store()).await?;
    Ok(BusinessInfo::new(
        Some(general.app_name),
        services.tagline,
        general.logo_url,
        &state.site,
    ))
}

async fn view(state: &AppState, id: &str) -> ApiResult<InvoiceView> {
    let record = load(state, id).await?;
    let business = business_info(state).await?;
    Ok(InvoiceView::new(record, business, &state.site))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/admin/invoices - Issue date descending
pub async fn list_invoices(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<ListResponse<InvoiceListItem>>> {
    let mut records = list_records::<Invoice>(state.store(), Collection::Invoices).await?;
    // Stable sort keeps newest-created first among equal issue dates.
    records.sort_by(|a, b| b.data.issue_date.cmp(&a.data.issue_date));

    let items: Vec<InvoiceListItem> = records
        .into_iter()
        .map(|record| InvoiceListItem {
            totals: record.data.totals(),
            record,
        })
        .collect();
    Ok(Json(items.into()))
}

/// GET /api/admin/invoices/new - Defaults for the new-invoice form
pub async fn new_invoice(_session: AdminSession) -> Json<Invoice> {
    Json(Invoice::draft(chrono::Local::now().date_naive()))
}

/// GET /api/admin/invoices/{id}
pub async fn get_invoice(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceListItem>> {
    let record = load(&state, &id).await?;
    Ok(Json(InvoiceListItem {
        totals: record.data.totals(),
        record,
    }))
}

/// POST /api/admin/invoices
pub async fn create_invoice(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Record<Invoice>>)> {
    let invoice = prepare(body)?;
    let doc = state
        .store()
        .insert(Collection::Invoices, to_data(&invoice)?)
        .await?;
    tracing::info!(id = %doc.id, number = %invoice.invoice_number, "invoice created");
    Ok((StatusCode::CREATED, Json(doc.into_record()?)))
}

/// PUT /api/admin/invoices/{id}
pub async fn update_invoice(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Record<Invoice>>> {
    let invoice = prepare(body)?;
    let doc = state
        .store()
        .replace(Collection::Invoices, &id, to_data(&invoice)?)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice not found"))?;
    tracing::info!(%id, number = %invoice.invoice_number, "invoice updated");
    Ok(Json(doc.into_record()?))
}

/// DELETE /api/admin/invoices/{id}
pub async fn delete_invoice(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    if !state.store().delete(Collection::Invoices, &id).await? {
        return Err(ApiError::not_found("Invoice not found"));
    }
    tracing::info!(%id, "invoice deleted");
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================================
// Public
// ============================================================================

/// GET /api/invoices/{id} - Shareable invoice page data
pub async fn public_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceView>> {
    Ok(Json(view(&state, &id).await?))
}

/// GET /api/invoices/{id}/pdf - Single-page A4 download
pub async fn invoice_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let view = view(&state, &id).await?;
    let file_name = view.pdf_file_name();

    let bytes = tokio::task::spawn_blocking(move || render_invoice_pdf(&view))
        .await
        .map_err(|e| ApiError::Internal(format!("PDF task failed: {}", e)))??;
    tracing::info!(%id, size = bytes.len(), "invoice pdf rendered");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use serde_json::json;

    fn invoice(number: &str, issue_date: &str) -> Value {
        json!({
            "clientName": "Jane Doe",
            "invoiceNumber": number,
            "issueDate": issue_date,
            "dueDate": "2024-12-31",
            "items": [
                { "description": "Wedding photography", "quantity": 2, "price": 100000 },
                { "description": "Album", "quantity": 1, "price": 50000,
                  "subItems": [{ "description": "30 pages" }] }
            ],
            "paymentStatus": "Menunggu DP",
            "downPayment": 50000
        })
    }

    async fn create(state: &AppState, body: &Value) -> Value {
        let (status, created) = send(
            app(state.clone()),
            admin_json("POST", "/api/admin/invoices", body),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "body: {}", created);
        created
    }

    #[tokio::test]
    async fn test_create_assigns_item_ids_and_public_view_has_totals() {
        let state = state();
        let created = create(&state, &invoice("INV-2024-05-001", "2024-05-01")).await;
        let id = created["id"].as_str().unwrap();
        assert!(created["items"][0]["id"].as_str().is_some_and(|s| !s.is_empty()));

        let (status, body) = send(app(state), get(&format!("/api/invoices/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["subtotal"], json!(250000.0));
        assert_eq!(body["totals"]["remaining"], json!(200000.0));
        assert_eq!(
            body["shareUrl"],
            format!("https://www.ningratwedding.id/invoice/{}", id)
        );
        assert_eq!(body["business"]["name"], "Ningrat Wedding");
    }

    #[tokio::test]
    async fn test_list_sorted_by_issue_date_desc() {
        let state = state();
        create(&state, &invoice("INV-A", "2024-03-01")).await;
        create(&state, &invoice("INV-B", "2024-06-01")).await;
        create(&state, &invoice("INV-C", "2024-01-15")).await;

        let (status, body) = send(app(state), admin_get("/api/admin/invoices")).await;
        assert_eq!(status, StatusCode::OK);
        let numbers: Vec<&str> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["invoiceNumber"].as_str().unwrap())
            .collect();
        assert_eq!(numbers, vec!["INV-B", "INV-A", "INV-C"]);
    }

    #[tokio::test]
    async fn test_invalid_invoice_reports_item_fields() {
        let mut body = invoice("INV-X", "2024-05-01");
        body["items"][0]["description"] = json!("");
        body["downPayment"] = json!(-1);

        let (status, res) = send(
            app(state()),
            admin_json("POST", "/api/admin/invoices", &body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(res["fields"]["items.0.description"].is_array());
        assert!(res["fields"]["downPayment"].is_array());
    }

    #[tokio::test]
    async fn test_new_invoice_draft_defaults() {
        let (status, body) = send(app(state()), admin_get("/api/admin/invoices/new")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["paymentStatus"], "Menunggu DP");
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert!(body["invoiceNumber"].as_str().unwrap().starts_with("INV-"));
    }

    #[tokio::test]
    async fn test_pdf_download_is_an_attachment() {
        let state = state();
        let created = create(&state, &invoice("INV/2024/07", "2024-07-01")).await;
        let id = created["id"].as_str().unwrap();

        let res = tower::ServiceExt::oneshot(
            app(state),
            get(&format!("/api/invoices/{}/pdf", id)),
        )
        .await
        .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Faktur-INV-2024-07.pdf\""
        );
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_unknown_invoice_is_not_found() {
        let (status, body) = send(app(state()), get("/api/invoices/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Invoice not found");
    }
}
