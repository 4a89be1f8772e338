//! Public invoice view and its printable form.

pub mod pdf;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::config::SiteConfig;
use crate::models::{Invoice, InvoiceTotals};
use crate::store::Record;

const MONTHS_ID: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// `1 Mei 2024`.
pub fn format_date_id(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS_ID[date.month0() as usize],
        date.year()
    )
}

/// Issuer details printed in the invoice header and footer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    pub name: String,
    pub website: String,
    pub tagline: Option<String>,
    pub logo_url: Option<String>,
}

impl BusinessInfo {
    pub const DEFAULT_NAME: &'static str = "Ningrat Wedding";

    pub fn new(
        name: Option<String>,
        tagline: Option<String>,
        logo_url: Option<String>,
        site: &SiteConfig,
    ) -> Self {
        let website = site
            .base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.")
            .to_string();
        Self {
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| Self::DEFAULT_NAME.to_string()),
            website,
            tagline,
            logo_url,
        }
    }
}

/// Everything the shareable invoice page and the PDF need.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    pub id: String,
    #[serde(flatten)]
    pub invoice: Invoice,
    pub totals: InvoiceTotals,
    pub share_url: String,
    pub business: BusinessInfo,
}

impl InvoiceView {
    pub fn new(record: Record<Invoice>, business: BusinessInfo, site: &SiteConfig) -> Self {
        Self {
            share_url: format!("{}/invoice/{}", site.base_url, record.id),
            totals: record.data.totals(),
            id: record.id,
            invoice: record.data,
            business,
        }
    }

    /// `Faktur-<number>.pdf`, restricted to header-safe characters.
    pub fn pdf_file_name(&self) -> String {
        let number: String = self
            .invoice
            .invoice_number
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        format!("Faktur-{}.pdf", number)
    }
}
