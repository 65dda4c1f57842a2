//! Read-only views over a fetched HTML document.
//!
//! Everything here is synchronous and returns owned data, so the parsed
//! document never lives across an `.await`.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Subtrees that never contribute visible text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Metadata image candidates in priority order: (selector, attribute)
const IMAGE_CANDIDATES: &[(&str, &str)] = &[
    ("meta[property='og:image']", "content"),
    ("meta[name='twitter:image']", "content"),
    ("link[rel='apple-touch-icon']", "href"),
    ("link[rel='icon']", "href"),
];

/// What the extraction pipeline needs from a page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSummary {
    /// Whitespace-normalized visible text
    pub text: String,
    /// Best metadata image, resolved against the page URL
    pub image_url: Option<String>,
    pub title: Option<String>,
}

impl PageSummary {
    pub fn from_html(html: &str, page_url: &str) -> Self {
        let document = Html::parse_document(html);
        PageSummary {
            text: visible_text(&document),
            image_url: metadata_image_url(&document, page_url),
            title: page_title(&document),
        }
    }
}

/// Visible text of the document with hidden subtrees dropped.
pub fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();
    collect_text(document.root_element(), &mut parts);
    parts
        .iter()
        .flat_map(|part| part.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push(&**text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !HIDDEN_ELEMENTS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        }
    }
}

/// First usable image URL from page metadata.
///
/// Falls back to `/favicon.ico` on the page origin when no candidate is
/// present; `None` only when the page URL itself cannot be parsed.
pub fn metadata_image_url(document: &Html, page_url: &str) -> Option<String> {
    let base = Url::parse(page_url).ok();

    for (css, attr) in IMAGE_CANDIDATES {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let found = document
            .select(&selector)
            .filter_map(|element| element.value().attr(attr))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .find_map(|value| resolve_url(base.as_ref(), value));
        if found.is_some() {
            return found;
        }
    }

    base.and_then(|base| base.join("/favicon.ico").ok())
        .map(String::from)
}

/// Resolve a possibly relative reference against the page URL.
pub fn resolve_url(base: Option<&Url>, raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(absolute) => Some(absolute.into()),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base.join(raw).ok().map(String::from),
            None => Some(raw.to_string()),
        },
        Err(_) => None,
    }
}

/// `og:title`, else the `<title>` text.
pub fn page_title(document: &Html) -> Option<String> {
    let og_title = Selector::parse("meta[property='og:title']")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .filter_map(|element| element.value().attr("content"))
                .map(str::trim)
                .find(|content| !content.is_empty())
                .map(str::to_string)
        });
    if og_title.is_some() {
        return og_title;
    }

    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .find(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let html = r#"
            <html>
            <head><title>Pie</title><style>body { color: red; }</style></head>
            <body>
                <h1>Apple   Pie</h1>
                <script>var tracking = true;</script>
                <noscript>Enable JavaScript</noscript>
                <p>2 apples</p>
            </body>
            </html>
        "#;
        let text = visible_text(&Html::parse_document(html));
        assert_eq!(text, "Pie Apple Pie 2 apples");
    }

    #[test]
    fn test_metadata_image_priority_and_resolution() {
        let html = r#"
            <html><head>
                <link rel="icon" href="/icon.png">
                <meta name="twitter:image" content="/images/twitter.jpg">
            </head></html>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(
            metadata_image_url(&document, "https://food.test/recipes/pie").as_deref(),
            Some("https://food.test/images/twitter.jpg")
        );
    }

    #[test]
    fn test_metadata_image_skips_blank_candidates() {
        let html = r#"
            <html><head>
                <meta property="og:image" content="  ">
                <meta property="og:image" content="https://cdn.test/pie.webp">
            </head></html>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(
            metadata_image_url(&document, "https://food.test/pie").as_deref(),
            Some("https://cdn.test/pie.webp")
        );
    }

    #[test]
    fn test_metadata_image_falls_back_to_favicon() {
        let document = Html::parse_document("<html><body>No metadata</body></html>");
        assert_eq!(
            metadata_image_url(&document, "https://food.test/a/b?c=d").as_deref(),
            Some("https://food.test/favicon.ico")
        );
        assert_eq!(metadata_image_url(&document, "not a url"), None);
    }

    #[test]
    fn test_page_title() {
        let og = Html::parse_document(
            r#"<html><head><meta property="og:title" content="Best Pie"><title>Ignored</title></head></html>"#,
        );
        assert_eq!(page_title(&og).as_deref(), Some("Best Pie"));

        let plain = Html::parse_document("<html><head><title>\n  Plain   Pie </title></head></html>");
        assert_eq!(page_title(&plain).as_deref(), Some("Plain Pie"));

        let none = Html::parse_document("<html><body></body></html>");
        assert_eq!(page_title(&none), None);
    }

    #[test]
    fn test_page_summary() {
        let summary = PageSummary::from_html(
            r#"<html><head><title>Soup</title><meta property="og:image" content="img/soup.png"></head><body>Hot soup</body></html>"#,
            "https://food.test/recipes/",
        );
        assert_eq!(summary.text, "Soup Hot soup");
        assert_eq!(
            summary.image_url.as_deref(),
            Some("https://food.test/recipes/img/soup.png")
        );
        assert_eq!(summary.title.as_deref(), Some("Soup"));
    }
}
