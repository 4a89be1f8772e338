use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;

use super::invoices::InvoiceListItem;
use super::ApiResult;
use crate::models::Invoice;
use crate::routes::auth::AdminSession;
use crate::state::AppState;
use crate::store::{list_records, Collection};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub stories: usize,
    pub blog_posts: usize,
    pub contact_submissions: usize,
    pub invoices: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub counts: DashboardCounts,
    /// Invoices not yet marked paid, earliest due first.
    pub unpaid_invoices: Vec<InvoiceListItem>,
    pub outstanding: Decimal,
}

/// GET /api/admin/dashboard
pub async fn dashboard(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<DashboardResponse>> {
    let store = state.store();
    let invoices = list_records::<Invoice>(store, Collection::Invoices).await?;

    let counts = DashboardCounts {
        stories: store.list(Collection::Stories).await?.len(),
        blog_posts: store.list(Collection::BlogPosts).await?.len(),
        contact_submissions: store.list(Collection::ContactSubmissions).await?.len(),
        invoices: invoices.len(),
    };

    let mut unpaid: Vec<InvoiceListItem> = invoices
        .into_iter()
        .filter(|record| !record.data.payment_status.is_paid())
        .map(|record| InvoiceListItem {
            totals: record.data.totals(),
            record,
        })
        .collect();
    unpaid.sort_by(|a, b| a.record.data.due_date.cmp(&b.record.data.due_date));

    let outstanding = unpaid.iter().map(|item| item.totals.remaining).sum();

    Ok(Json(DashboardResponse {
        counts,
        unpaid_invoices: unpaid,
        outstanding,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_dashboard_counts_and_unpaid_invoices() {
        let state = state();
        for (number, status, due) in [
            ("INV-1", "Lunas", "2024-02-01"),
            ("INV-2", "Menunggu Pelunasan", "2024-05-01"),
            ("INV-3", "Belum Lunas", "2024-03-01"),
        ] {
            let (code, _) = send(
                app(state.clone()),
                admin_json(
                    "POST",
                    "/api/admin/invoices",
                    &json!({
                        "clientName": "Jane",
                        "invoiceNumber": number,
                        "issueDate": "2024-01-01",
                        "dueDate": due,
                        "items": [{ "description": "Photo", "quantity": 1, "price": 100000 }],
                        "paymentStatus": status,
                        "downPayment": 25000
                    }),
                ),
            )
            .await;
            assert_eq!(code, StatusCode::CREATED);
        }

        let (status, body) = send(app(state), admin_get("/api/admin/dashboard")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["counts"]["invoices"], 3);
        assert_eq!(body["counts"]["stories"], 0);
        let unpaid = body["unpaidInvoices"].as_array().unwrap();
        assert_eq!(unpaid.len(), 2);
        assert_eq!(unpaid[0]["invoiceNumber"], "INV-3");
        assert_eq!(unpaid[0]["paymentStatus"], "Menunggu Pelunasan");
        assert_eq!(body["outstanding"], json!(150000.0));
    }
}
