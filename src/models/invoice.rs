use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::empty_string_as_none;

const DEFAULT_NOTES: &str = "Terima kasih atas pembayaran Anda. Jika ada pertanyaan, jangan ragu untuk menghubungi kami.";
const DUE_IN_DAYS: u64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "Menunggu DP")]
    MenungguDp,
    #[serde(rename = "Menunggu Pelunasan", alias = "Belum Lunas")]
    MenungguPelunasan,
    #[serde(rename = "Lunas")]
    Lunas,
    #[serde(rename = "Lewat Tempo")]
    LewatTempo,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::MenungguDp => "Menunggu DP",
            PaymentStatus::MenungguPelunasan => "Menunggu Pelunasan",
            PaymentStatus::Lunas => "Lunas",
            PaymentStatus::LewatTempo => "Lewat Tempo",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Lunas)
    }
}

fn validate_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity < Decimal::new(1, 2) {
        return Err(ValidationError::new("range").with_message("Quantity must be greater than 0".into()));
    }
    Ok(())
}

fn validate_non_negative(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::new("range").with_message("Amount cannot be negative".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubItem {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    #[serde(default)]
    pub id: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_non_negative"))]
    pub price: Decimal,

    #[serde(default)]
    pub sub_items: Vec<SubItem>,
}

impl InvoiceItem {
    pub fn line_total(&self) -> Decimal {
        self.quantity * self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(email(message = "Client email is not valid"))]
    pub client_email: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub client_address: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub client_whatsapp: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub my_contact_info: Option<String>,

    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,

    pub issue_date: NaiveDate,

    pub due_date: NaiveDate,

    #[validate(length(min = 1, message = "At least one item is required"))]
    #[validate(nested)]
    pub items: Vec<InvoiceItem>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub notes: Option<String>,

    #[serde(alias = "status")]
    pub payment_status: PaymentStatus,

    #[serde(default)]
    pub down_payment: Option<Decimal>,
}

/// Derived amounts; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub down_payment: Decimal,
    pub remaining: Decimal,
}

impl Invoice {
    /// Defaults for a new invoice issued on `today`.
    pub fn draft(today: NaiveDate) -> Self {
        Self {
            client_name: String::new(),
            client_email: None,
            client_address: None,
            client_whatsapp: None,
            my_contact_info: None,
            invoice_number: format!("INV-{}-{:02}-", today.year(), today.month()),
            issue_date: today,
            due_date: today
                .checked_add_days(Days::new(DUE_IN_DAYS))
                .unwrap_or(today),
            items: vec![InvoiceItem {
                id: Uuid::new_v4().to_string(),
                description: String::new(),
                quantity: Decimal::ONE,
                price: Decimal::ZERO,
                sub_items: Vec::new(),
            }],
            notes: Some(DEFAULT_NOTES.to_string()),
            payment_status: PaymentStatus::MenungguDp,
            down_payment: None,
        }
    }

    /// Full validation, including the down payment which the derive cannot
    /// express on an optional decimal.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if let Some(down_payment) = &self.down_payment {
            if let Err(e) = validate_non_negative(down_payment) {
                errors.add("down_payment", e);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Give every line item an id so clients can key rows.
    pub fn assign_item_ids(&mut self) {
        for item in &mut self.items {
            if item.id.trim().is_empty() {
                item.id = Uuid::new_v4().to_string();
            }
        }
    }

    pub fn totals(&self) -> InvoiceTotals {
        let subtotal: Decimal = self.items.iter().map(InvoiceItem::line_total).sum();
        let down_payment = self.down_payment.unwrap_or(Decimal::ZERO);
        InvoiceTotals {
            subtotal,
            down_payment,
            remaining: subtotal - down_payment,
        }
    }
}

/// Format an amount the way Indonesian invoices show it: `Rp 1.250.000`.
pub fn format_idr(amount: Decimal) -> String {
    let rounded = amount.round_dp(0);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}
