use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::empty_string_as_none;

/// Inquiry submitted from the public contact page.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[validate(length(min = 3, message = "Event type must be at least 3 characters"))]
    pub event_type: String,

    #[validate(length(min = 2, message = "Location is required"))]
    pub location: String,

    #[validate(length(min = 6, message = "WhatsApp number must be at least 6 digits"))]
    pub whatsapp: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(email(message = "Email is not valid"))]
    pub email: Option<String>,

    /// Where the visitor heard about the business.
    #[serde(default)]
    pub know_from: Vec<String>,
}

/// Stored form of a contact inquiry. Submissions are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(flatten)]
    pub form: ContactForm,
    pub submitted_at: DateTime<Utc>,
}

impl ContactForm {
    pub fn into_submission(self, submitted_at: DateTime<Utc>) -> ContactSubmission {
        ContactSubmission {
            form: ContactForm {
                name: self.name.trim().to_string(),
                event_type: self.event_type.trim().to_string(),
                location: self.location.trim().to_string(),
                whatsapp: self.whatsapp.trim().to_string(),
                ..self
            },
            submitted_at,
        }
    }
}
