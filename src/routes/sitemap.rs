use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::models::{BlogPost, Entry, Story};
use crate::state::AppState;
use crate::store::{list_records, StoreError};

const STATIC_ROUTES: [&str; 6] = ["/", "/about", "/portfolio", "/contact", "/services", "/blog"];

struct UrlEntry {
    loc: String,
    last_modified: DateTime<Utc>,
    change_frequency: &'static str,
    priority: f32,
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn static_entries(base_url: &str, now: DateTime<Utc>) -> Vec<UrlEntry> {
    STATIC_ROUTES
        .iter()
        .map(|route| UrlEntry {
            loc: format!("{}{}", base_url, route),
            last_modified: now,
            change_frequency: "monthly",
            priority: if *route == "/" { 1.0 } else { 0.8 },
        })
        .collect()
}

async fn entry_urls<T: Entry>(
    state: &AppState,
    priority: f32,
) -> Result<Vec<UrlEntry>, StoreError> {
    let records = list_records::<T>(state.store(), T::COLLECTION).await?;
    Ok(records
        .into_iter()
        .map(|record| UrlEntry {
            loc: format!("{}/{}/{}", state.site.base_url, T::SECTION, record.data.slug()),
            last_modified: record.updated_at.unwrap_or(record.created_at),
            change_frequency: "weekly",
            priority,
        })
        .collect())
}

fn render(entries: &[UrlEntry]) -> String {
    let mut urls = String::new();
    for entry in entries {
        urls.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{:.1}</priority>\n  </url>\n",
            escape_xml(&entry.loc),
            entry.last_modified.to_rfc3339(),
            entry.change_frequency,
            entry.priority,
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>\n",
        urls
    )
}

/// GET /sitemap.xml
/// Static pages plus every story and blog post. Falls back to the static
/// pages alone when the store cannot be read.
pub async fn sitemap(State(state): State<AppState>) -> Response {
    let mut entries = static_entries(&state.site.base_url, Utc::now());

    let dynamic = async {
        let mut urls = entry_urls::<Story>(&state, 0.7).await?;
        urls.extend(entry_urls::<BlogPost>(&state, 0.6).await?);
        Ok::<_, StoreError>(urls)
    };
    match dynamic.await {
        Ok(urls) => entries.extend(urls),
        Err(e) => tracing::error!("Failed to generate sitemap entries: {}", e),
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        render(&entries),
    )
        .into_response()
}

/// GET /robots.txt
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    let body = format!(
        "User-agent: *\nAllow: /\nDisallow: /admin/\n\nSitemap: {}/sitemap.xml\n",
        state.site.base_url
    );
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}
