use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::config::Settings;
use crate::error::{ParseError, Result};
use crate::fetch::Fetch;
use crate::graph::StateGraph;
use crate::markup::{self, MarkupMeta};
use crate::post::{self, PostMeta};
use crate::render::ParagraphRenderer;
use crate::state;

static BLANKS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// A parsed article, ready for a serializer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediumData {
    pub title: String,
    pub poster: String,
    pub headline: String,
    pub author: String,
    pub author_avatar: String,
    pub published_time: DateTime<Utc>,
    pub canonical_url: String,
    pub markdown: String,
}

pub struct MediumParser<F> {
    fetcher: F,
    settings: Settings,
}

impl<F: Fetch> MediumParser<F> {
    pub fn new(fetcher: F, settings: Settings) -> Self {
        Self { fetcher, settings }
    }

    /// Fetch an article page and parse it. Only configured hosts are accepted.
    pub async fn parse_from_url(&self, url: &str) -> Result<MediumData> {
        let parsed = Url::parse(url).map_err(|source| ParseError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let host = parsed.host_str().unwrap_or_default();
        if !self.settings.is_allowed_host(host) {
            return Err(ParseError::NotMedium { host: host.to_string() });
        }

        info!("Fetching {}", url);
        let page = self.fetcher.fetch_text(url).await?;
        if !page.is_success() {
            return Err(ParseError::Status {
                url: url.to_string(),
                status: page.status,
            });
        }

        self.parse_from_html(&page.body).await
    }

    /// Parse a page already in hand. Embeds are still fetched.
    pub async fn parse_from_html(&self, html: &str) -> Result<MediumData> {
        let page_state = state::extract(html)?;
        let graph = StateGraph::from_value(page_state.apollo);
        info!("State graph has {} records", graph.len());

        let mut meta = post::resolve(&graph, &self.settings)?;
        if has_gaps(&meta) {
            debug!("Post metadata incomplete, reading rendered markup");
            fill_gaps(&mut meta, markup::extract(html));
        }

        let renderer = ParagraphRenderer::new(&graph, &self.fetcher, &self.settings);
        let blocks = renderer.render_all().await;
        info!("Rendered {} paragraphs for \"{}\"", blocks.len(), meta.title);

        Ok(MediumData {
            title: meta.title,
            poster: meta.poster,
            headline: meta.headline,
            author: meta.author,
            author_avatar: meta.author_avatar,
            published_time: meta.published_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            canonical_url: meta.canonical_url,
            markdown: assemble(&blocks),
        })
    }
}

fn has_gaps(meta: &PostMeta) -> bool {
    meta.title.is_empty()
        || meta.headline.is_empty()
        || meta.author.is_empty()
        || meta.author_avatar.is_empty()
        || meta.poster.is_empty()
        || meta.published_time.is_none()
}

/// Fields the Post left empty take the rendered markup's value; Post values
/// always win.
fn fill_gaps(meta: &mut PostMeta, markup: MarkupMeta) {
    fn fill(field: &mut String, value: Option<String>) {
        if field.is_empty() {
            if let Some(value) = value {
                *field = value;
            }
        }
    }

    fill(&mut meta.title, markup.title);
    fill(&mut meta.headline, markup.headline);
    fill(&mut meta.author, markup.author);
    fill(&mut meta.author_avatar, markup.author_avatar);
    fill(&mut meta.poster, markup.poster);
    meta.published_time = meta.published_time.or(markup.published_time);
}

/// Blocks separated by one blank line; empty blocks leave no trace.
pub fn assemble(blocks: &[String]) -> String {
    collapse_blank_lines(&blocks.join("\n\n")).trim().to_string()
}

/// Runs of three or more newlines become exactly two.
pub fn collapse_blank_lines(s: &str) -> String {
    BLANKS_RE.replace_all(s, "\n\n").to_string()
}
