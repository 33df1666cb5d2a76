use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::Settings;
use crate::error::{ParseError, Result};
use crate::graph::StateGraph;

/// Article metadata pulled from the canonical Post and its creator.
#[derive(Debug, Clone, PartialEq)]
pub struct PostMeta {
    pub title: String,
    pub author: String,
    pub author_avatar: String,
    pub poster: String,
    pub headline: String,
    /// `None` when the Post carries no publish timestamp.
    pub published_time: Option<DateTime<Utc>>,
    pub canonical_url: String,
}

/// The first Post carrying a canonical url is the article; other Post records
/// are list and recommendation stubs.
pub fn resolve(graph: &StateGraph, settings: &Settings) -> Result<PostMeta> {
    let (id, post) = graph
        .posts()
        .find(|(_, post)| post.canonical_url.is_some())
        .ok_or(ParseError::PostNotFound)?;
    debug!("Canonical post is {}", id);

    let creator = graph.user(post.creator.as_ref());
    let author = creator.and_then(|u| u.name.clone()).unwrap_or_default();
    let author_avatar = creator
        .and_then(|u| u.image_id.as_deref())
        .map(|image| settings.image_url(image))
        .unwrap_or_default();

    let poster = post
        .preview_image
        .as_ref()
        .map(|image| settings.image_url(&image.id))
        .unwrap_or_default();
    let headline = post
        .preview_content
        .as_ref()
        .and_then(|c| c.subtitle.clone())
        .unwrap_or_default();

    Ok(PostMeta {
        title: post.title.clone().unwrap_or_default(),
        author,
        author_avatar,
        poster,
        headline,
        published_time: post.first_published_at.map(from_epoch_millis),
        canonical_url: post.canonical_url.clone().unwrap_or_default(),
    })
}

/// Out-of-range timestamps fall back to the epoch.
fn from_epoch_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
