//! Entities stored in the document collections, with their input schemas.

pub mod blog;
pub mod contact;
pub mod invoice;
pub mod settings;
pub mod story;

pub use blog::BlogPost;
pub use contact::{ContactForm, ContactSubmission};
pub use invoice::{format_idr, Invoice, InvoiceItem, InvoiceTotals, PaymentStatus, SubItem};
pub use settings::SettingsPage;
pub use story::Story;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::content::{slugify, ContentBlocks};
use crate::error::{ApiError, ApiResult};
use crate::store::Collection;

/// A titled, block-bodied entry published under `/<section>/<slug>`.
pub trait Entry: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Public path segment, e.g. `stories` for `/stories/<slug>`.
    const SECTION: &'static str;

    fn slug(&self) -> &str;

    /// Validate, clean and derive the slug. Called before every write.
    fn prepare(self) -> ApiResult<Self>;
}

/// Deserialize `""` (and whitespace) as `None`. Form clients send empty
/// strings for untouched optional inputs.
pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Shared save path for titled, block-bodied entries: clean the blocks,
/// check they are publishable and derive the slug from the title.
pub(crate) fn prepare_body(title: &str, blocks: &mut ContentBlocks) -> ApiResult<String> {
    blocks.sanitize();
    blocks.check_publishable()?;

    let slug = slugify(title);
    if slug.is_empty() {
        return Err(ApiError::invalid_field(
            "title",
            "Title must contain letters or numbers",
        ));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        value: Option<String>,
    }

    #[test]
    fn test_empty_string_as_none() {
        let probe: Probe = serde_json::from_str(r#"{"value": ""}"#).unwrap();
        assert_eq!(probe.value, None);
        let probe: Probe = serde_json::from_str(r#"{"value": "  "}"#).unwrap();
        assert_eq!(probe.value, None);
        let probe: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(probe.value, None);
        let probe: Probe = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(probe.value, None);
        let probe: Probe = serde_json::from_str(r#"{"value": "x"}"#).unwrap();
        assert_eq!(probe.value.as_deref(), Some("x"));
    }

    #[test]
    fn test_prepare_body_rejects_unsluggable_title() {
        let mut blocks = ContentBlocks::default();
        assert_eq!(prepare_body("Jane & John", &mut blocks).unwrap(), "jane-and-john");
        assert!(matches!(
            prepare_body("!!!", &mut blocks),
            Err(ApiError::Validation(_))
        ));
    }
}
