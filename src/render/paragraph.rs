use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use super::marks::interleave;
use super::media::MediaResolver;
use crate::config::Settings;
use crate::fetch::Fetch;
use crate::graph::{Paragraph, ParagraphKind, StateGraph};

/// Why a paragraph contributed nothing. Logged, never propagated.
#[derive(Debug, Error)]
enum RenderError {
    #[error("unknown paragraph type `{0}`")]
    UnknownKind(String),
    #[error("image paragraph without image reference")]
    MissingImage,
}

pub struct ParagraphRenderer<'a, F> {
    graph: &'a StateGraph,
    settings: &'a Settings,
    media: MediaResolver<'a, F>,
}

impl<'a, F: Fetch> ParagraphRenderer<'a, F> {
    pub fn new(graph: &'a StateGraph, fetcher: &'a F, settings: &'a Settings) -> Self {
        Self {
            graph,
            settings,
            media: MediaResolver::new(fetcher, settings),
        }
    }

    /// Every paragraph in graph order. Embeds resolve concurrently; the output
    /// order is the scan order regardless of which fetch finishes first.
    pub async fn render_all(&self) -> Vec<String> {
        let pending = self.graph.paragraphs().map(|(id, p)| self.render(id, p));
        join_all(pending).await
    }

    /// One markdown block; a paragraph that cannot be rendered becomes `""`.
    pub async fn render(&self, id: &str, paragraph: &Paragraph) -> String {
        match self.try_render(paragraph).await {
            Ok(block) => block,
            Err(e) => {
                warn!("Skipping paragraph {}: {}", id, e);
                String::new()
            }
        }
    }

    async fn try_render(&self, p: &Paragraph) -> Result<String, RenderError> {
        let raw = p.text.as_deref().unwrap_or_default();
        let text = || interleave(raw, &p.markups, self.settings);

        let block = match &p.kind {
            ParagraphKind::H3 => format!("### {}", text()),
            ParagraphKind::H4 => format!("#### {}", text()),
            ParagraphKind::P => text(),
            ParagraphKind::Blockquote => format!("> {}", text()),
            ParagraphKind::PullQuote => format!("> ## {}", text()),
            ParagraphKind::UnorderedItem => format!("- {}", text()),
            // Every item is `0.`, never renumbered.
            ParagraphKind::OrderedItem => format!("0. {}", text()),
            ParagraphKind::Image => {
                let image = p.metadata.as_ref().ok_or(RenderError::MissingImage)?;
                format!(
                    "![{} {}]({})",
                    text(),
                    p.layout.as_deref().unwrap_or_default(),
                    self.settings.image_url(&image.id)
                )
            }
            ParagraphKind::Preformatted => format!("```\n{}\n```", raw),
            ParagraphKind::Iframe => {
                match p.iframe.as_ref().and_then(|f| f.media_resource.as_ref()) {
                    Some(media) => self.media.resolve(&media.id).await,
                    None => {
                        debug!("Iframe paragraph without media resource");
                        String::new()
                    }
                }
            }
            ParagraphKind::Unknown(tag) => return Err(RenderError::UnknownKind(tag.clone())),
        };

        Ok(block)
    }
}
