//! Title and slug for recipes that could not be extracted.

use log::debug;
use reqwest::Client;
use scraper::Html;
use url::Url;

use crate::url_to_text::html::page_title;

pub const UNTITLED: &str = "Untitled";

/// Lowercase the title and turn spaces into hyphens.
pub fn slugify(title: &str) -> String {
    title.trim().to_lowercase().replace(' ', "-")
}

/// Best-effort title and slug for `url`.
///
/// Tries the page's `og:title` or `<title>` with a cheap GET (the client
/// carries the short timeout), then the URL path, then [`UNTITLED`].
pub async fn fallback_title_and_slug(client: &Client, url: &str) -> (String, String) {
    let title = match fetch_title(client, url).await {
        Some(title) => title,
        None => title_from_url(url).unwrap_or_else(|| UNTITLED.to_string()),
    };

    let mut slug = slugify(&title);
    if slug.is_empty() {
        slug = slugify(UNTITLED);
    }
    (title, slug)
}

async fn fetch_title(client: &Client, url: &str) -> Option<String> {
    let response = match client.get(url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            debug!("Title lookup for {} returned {}", url, response.status());
            return None;
        }
        Err(e) => {
            debug!("Title lookup for {} failed: {}", url, e);
            return None;
        }
    };
    let body = response.text().await.ok()?;
    page_title(&Html::parse_document(&body))
}

/// Title derived from the last path segment, e.g. `/recipes/banana_bread.html`
/// becomes "Banana Bread".
pub fn title_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let segment = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;

    let stem = match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    };

    let title = stem
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    (!title.is_empty()).then_some(title)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Duration;

    fn client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Banana Bread"), "banana-bread");
        assert_eq!(slugify("  Mom's Pie "), "mom's-pie");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_title_from_url() {
        assert_eq!(
            title_from_url("https://food.test/recipes/banana_bread.html").as_deref(),
            Some("Banana Bread")
        );
        assert_eq!(
            title_from_url("https://food.test/recipes/easy-apple-pie/").as_deref(),
            Some("Easy Apple Pie")
        );
        assert_eq!(title_from_url("https://food.test/"), None);
        assert_eq!(title_from_url("not a url"), None);
    }

    #[tokio::test]
    async fn test_fallback_uses_page_title() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/recipes/x")
            .with_status(200)
            .with_body(r#"<html><head><meta property="og:title" content="Grandma's Lasagna"></head></html>"#)
            .create_async()
            .await;

        let (title, slug) =
            fallback_title_and_slug(&client(), &format!("{}/recipes/x", server.url())).await;
        assert_eq!(title, "Grandma's Lasagna");
        assert_eq!(slug, "grandma's-lasagna");
    }

    #[tokio::test]
    async fn test_fallback_uses_url_path_when_fetch_fails() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/recipes/chicken-tikka-masala")
            .with_status(503)
            .create_async()
            .await;

        let url = format!("{}/recipes/chicken-tikka-masala", server.url());
        let (title, slug) = fallback_title_and_slug(&client(), &url).await;
        assert_eq!(title, "Chicken Tikka Masala");
        assert_eq!(slug, "chicken-tikka-masala");
    }

    #[tokio::test]
    async fn test_fallback_untitled() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html><body>nothing</body></html>")
            .create_async()
            .await;

        let (title, slug) = fallback_title_and_slug(&client(), &format!("{}/", server.url())).await;
        assert_eq!(title, "Untitled");
        assert_eq!(slug, "untitled");
    }
}
