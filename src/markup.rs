use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static H2: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").unwrap());
static AUTHOR_BLOCK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div > div").unwrap());
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static FIGURE_IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("figure img").unwrap());
static PUBLISHED: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="article:published_time"]"#).unwrap()
});

/// Metadata readable from the server-rendered article markup. Every field is
/// optional; the markup layout is not a stable contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupMeta {
    pub title: Option<String>,
    pub headline: Option<String>,
    pub author: Option<String>,
    pub author_avatar: Option<String>,
    pub poster: Option<String>,
    pub published_time: Option<DateTime<Utc>>,
}

/// Title from the first `h1`, headline from the first `h2`, byline from the
/// element right after the `h1`, poster from the first figure image and the
/// publish time from the `article:published_time` meta tag.
pub fn extract(html: &str) -> MarkupMeta {
    let doc = Html::parse_document(html);

    let h1 = doc.select(&H1).next();
    let byline = h1.and_then(|h| h.next_siblings().find_map(ElementRef::wrap));
    let author_blocks: Vec<ElementRef> = byline
        .map(|b| b.select(&AUTHOR_BLOCK).collect())
        .unwrap_or_default();

    let author = author_blocks
        .iter()
        .find_map(|b| b.select(&SPAN).next())
        .and_then(text_of);
    let author_avatar = author_blocks
        .iter()
        .find_map(|b| b.select(&IMG).next())
        .and_then(|img| attr_of(img, "src"));

    let published_time = doc
        .select(&PUBLISHED)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|t| t.with_timezone(&Utc));

    MarkupMeta {
        title: h1.and_then(text_of),
        headline: doc.select(&H2).next().and_then(text_of),
        author,
        author_avatar,
        poster: doc.select(&FIGURE_IMG).next().and_then(|img| attr_of(img, "src")),
        published_time,
    }
}

fn text_of(el: ElementRef) -> Option<String> {
    let text = el.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn attr_of(el: ElementRef, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
