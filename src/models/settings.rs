//! Per-page editable copy. Each page is a singleton document in the
//! `settings` collection keyed by the page name.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::empty_string_as_none;
use crate::error::{ApiError, ApiResult};
use crate::store::{to_data, Collection, DocumentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsPage {
    General,
    Home,
    About,
    Contact,
    Portfolio,
    Services,
}

impl SettingsPage {
    pub const ALL: [SettingsPage; 6] = [
        SettingsPage::General,
        SettingsPage::Home,
        SettingsPage::About,
        SettingsPage::Contact,
        SettingsPage::Portfolio,
        SettingsPage::Services,
    ];

    /// Document id inside the `settings` collection.
    pub fn doc_id(&self) -> &'static str {
        match self {
            SettingsPage::General => "general",
            SettingsPage::Home => "home",
            SettingsPage::About => "about",
            SettingsPage::Contact => "contact",
            SettingsPage::Portfolio => "portfolio",
            SettingsPage::Services => "services",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.doc_id() == s)
    }
}

/// A settings document: validated on save, defaulted on read.
pub trait PageSettings: Serialize + DeserializeOwned + Validate + Default {
    const PAGE: SettingsPage;

    /// Hook run after validation, before the merge-write.
    fn normalize(&mut self) {}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
    #[validate(length(min = 1, message = "App name is required"))]
    pub app_name: String,

    #[validate(length(min = 1, message = "Meta description is required"))]
    pub meta_description: String,

    #[serde(deserialize_with = "empty_string_as_none")]
    pub meta_keywords: Option<String>,

    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url(message = "Logo URL is not valid"))]
    pub logo_url: Option<String>,

    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url(message = "Favicon URL is not valid"))]
    pub favicon_url: Option<String>,
}

impl PageSettings for GeneralSettings {
    const PAGE: SettingsPage = SettingsPage::General;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct HeroMedia {
    #[validate(url(message = "Media URL is not valid"))]
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct HomeSettings {
    #[validate(nested)]
    pub hero_media: Vec<HeroMedia>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub intro_headline: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub intro_paragraph1: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub intro_paragraph2: Option<String>,
}

impl PageSettings for HomeSettings {
    const PAGE: SettingsPage = SettingsPage::Home;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AboutSettings {
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url(message = "Hero image URL is not valid"))]
    pub hero_image_url: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub headline: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub paragraph: Option<String>,
}

impl PageSettings for AboutSettings {
    const PAGE: SettingsPage = SettingsPage::About;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioSettings {
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url(message = "Hero image URL is not valid"))]
    pub hero_image_url: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub headline: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub paragraph: Option<String>,
}

impl PageSettings for PortfolioSettings {
    const PAGE: SettingsPage = SettingsPage::Portfolio;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSettings {
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url(message = "Hero image URL is not valid"))]
    pub hero_image_url: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub headline: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub paragraph: Option<String>,
    /// File offered to visitors after they submit the contact form.
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url(message = "File URL is not valid"))]
    pub downloadable_file_url: Option<String>,
}

impl PageSettings for ContactSettings {
    const PAGE: SettingsPage = SettingsPage::Contact;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CapturedMoment {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(url(message = "Image URL is not valid"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ServicePackage {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub id: Option<String>,
    #[validate(length(min = 1, message = "Package name is required"))]
    pub name: String,
    /// Display price, free text ("Rp 15.000.000", "Mulai 10jt").
    pub price: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub highlight: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicesSettings {
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url(message = "Hero image URL is not valid"))]
    pub hero_image_url: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub tagline: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub moments_title: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub moments_description: Option<String>,
    #[validate(nested)]
    pub captured_moments: Vec<CapturedMoment>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub packages_title: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub packages_description: Option<String>,
    #[validate(nested)]
    pub packages: Vec<ServicePackage>,
}

impl ServicesSettings {
    pub fn package(&self, id: &str) -> Option<&ServicePackage> {
        self.packages.iter().find(|p| p.id.as_deref() == Some(id))
    }
}

impl PageSettings for ServicesSettings {
    const PAGE: SettingsPage = SettingsPage::Services;

    /// Packages and moments keep stable ids so checkout links resolve.
    fn normalize(&mut self) {
        for moment in &mut self.captured_moments {
            moment.id.get_or_insert_with(|| Uuid::new_v4().to_string());
        }
        for package in &mut self.packages {
            package.id.get_or_insert_with(|| Uuid::new_v4().to_string());
        }
    }
}

/// Read a page's settings. A missing or unreadable document yields the
/// default value.
pub async fn load<T: PageSettings>(store: &dyn DocumentStore) -> ApiResult<T> {
    let Some(doc) = store.get(Collection::Settings, T::PAGE.doc_id()).await? else {
        return Ok(T::default());
    };
    Ok(serde_json::from_value(doc.data).unwrap_or_else(|e| {
        tracing::warn!(page = T::PAGE.doc_id(), error = %e, "settings document unreadable, using defaults");
        T::default()
    }))
}

/// Validate a page's settings and merge-write them. Returns the stored value.
pub async fn save<T: PageSettings>(store: &dyn DocumentStore, body: Value) -> ApiResult<T> {
    let mut settings: T = serde_json::from_value(body)
        .map_err(|e| ApiError::invalid_field("body", e.to_string()))?;
    settings.validate()?;
    settings.normalize();

    store
        .merge(Collection::Settings, T::PAGE.doc_id(), to_data(&settings)?)
        .await?;
    tracing::info!(page = T::PAGE.doc_id(), "settings saved");
    Ok(settings)
}

/// Page-dispatched read, returning JSON.
pub async fn load_page(store: &dyn DocumentStore, page: SettingsPage) -> ApiResult<Value> {
    Ok(match page {
        SettingsPage::General => serde_json::to_value(load::<GeneralSettings>(store).await?),
        SettingsPage::Home => serde_json::to_value(load::<HomeSettings>(store).await?),
        SettingsPage::About => serde_json::to_value(load::<AboutSettings>(store).await?),
        SettingsPage::Contact => serde_json::to_value(load::<ContactSettings>(store).await?),
        SettingsPage::Portfolio => serde_json::to_value(load::<PortfolioSettings>(store).await?),
        SettingsPage::Services => serde_json::to_value(load::<ServicesSettings>(store).await?),
    }
    .map_err(|e| ApiError::Internal(format!("Failed to encode settings: {}", e)))?)
}

/// Page-dispatched save, returning the stored JSON.
pub async fn save_page(store: &dyn DocumentStore, page: SettingsPage, body: Value) -> ApiResult<Value> {
    Ok(match page {
        SettingsPage::General => serde_json::to_value(save::<GeneralSettings>(store, body).await?),
        SettingsPage::Home => serde_json::to_value(save::<HomeSettings>(store, body).await?),
        SettingsPage::About => serde_json::to_value(save::<AboutSettings>(store, body).await?),
        SettingsPage::Contact => serde_json::to_value(save::<ContactSettings>(store, body).await?),
        SettingsPage::Portfolio => {
            serde_json::to_value(save::<PortfolioSettings>(store, body).await?)
        }
        SettingsPage::Services => serde_json::to_value(save::<ServicesSettings>(store, body).await?),
    }
    .map_err(|e| ApiError::Internal(format!("Failed to encode settings: {}", e)))?)
}
