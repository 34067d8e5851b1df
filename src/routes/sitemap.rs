use axum::{body::Body, http::header, response::Response};
use chrono::{DateTime, Utc};

use crate::db;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Derive a URL-safe short slug from a title. The stored `slug` field is
/// free text, so public article URLs are built from the title instead.
fn short_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_was_hyphen = false;
        } else if (c.is_whitespace() || c == '-') && !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    slug.truncate(50);
    slug.trim_matches('-').to_string()
}

fn url_entry(loc: &str, lastmod: &DateTime<Utc>) -> String {
    format!(
        "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n  </url>\n",
        escape_xml(loc),
        lastmod.format("%Y-%m-%d"),
    )
}

/// GET /sitemap.xml - published articles, showcase entries, and static pages
pub async fn sitemap() -> Response {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => {
            return Response::builder()
                .status(503)
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("Service unavailable"))
                .unwrap();
        }
    };

    let base_url = std::env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let rows: Vec<(uuid::Uuid, String, String, DateTime<Utc>)> = sqlx::query_as(
        r#"
            SELECT id, kind, title, updated_at
            FROM posts
            WHERE published = true
            ORDER BY created_at DESC
            LIMIT 500
            "#,
    )
    .fetch_all(pool.as_ref())
    .await
    .unwrap_or_default();

    let now = Utc::now();
    let mut entries = String::new();
    for page in ["", "/Blog", "/Project", "/Contact"] {
        entries.push_str(&url_entry(&format!("{base_url}{page}"), &now));
    }
    for (id, kind, title, updated_at) in &rows {
        let loc = if kind == "article" {
            format!("{}/Blog/{}", base_url, short_slug(title))
        } else {
            format!("{}/Project/{}", base_url, id)
        };
        entries.push_str(&url_entry(&loc, updated_at));
    }

    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n\
         {entries}</urlset>\n"
    );

    Response::builder()
        .status(200)
        .header(header::CONTENT_TYPE, "application/xml; charset=utf-8")
        .header(
            header::CACHE_CONTROL,
            "public, max-age=3600, stale-while-revalidate=600",
        )
        .body(Body::from(xml))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<title>"), "&lt;title&gt;");
        assert_eq!(escape_xml("\"quote\""), "&quot;quote&quot;");
    }

    #[test]
    fn test_short_slug_normalizes_title() {
        assert_eq!(short_slug("Hello, World!"), "hello-world");
        assert_eq!(short_slug("  Rust   &  Axum  "), "rust-axum");
        assert_eq!(short_slug("already-slugged"), "already-slugged");
    }

    #[test]
    fn test_short_slug_truncates_long_titles() {
        let title = "x".repeat(120);
        assert_eq!(short_slug(&title).len(), 50);
    }

    #[tokio::test]
    async fn test_sitemap_without_database_is_unavailable() {
        let response = sitemap().await;
        assert_eq!(response.status(), 503);
    }
}
