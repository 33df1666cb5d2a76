use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::fetch::Fetch;

const GIST_MARKER: &str = "gist.github.com";
const GIST_RAW_HOST: &str = "https://gist.githubusercontent.com";
const YOUTUBE_THUMB_HOST: &str = "https://img.youtube.com/vi/";
const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

static GIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https://gist\.github\.com/([\w-]+)/([0-9a-fA-F]+))").unwrap()
});
static YOUTUBE_WATCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""href":"https://www\.youtube\.com/watch\?v=([\w-]+)[^"]*""#).unwrap()
});
static YOUTU_BE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""href":"https://youtu\.be/([\w-]+)(?:\?([^"]*))?""#).unwrap()
});

/// Turns an embedded media resource into a markdown snippet: a fenced block
/// for gists, a thumbnail link for YouTube. Every step that misses ends the
/// chain with an empty snippet.
pub struct MediaResolver<'a, F> {
    fetcher: &'a F,
    settings: &'a Settings,
}

impl<'a, F: Fetch> MediaResolver<'a, F> {
    pub fn new(fetcher: &'a F, settings: &'a Settings) -> Self {
        Self { fetcher, settings }
    }

    /// Never fails; unrecognised or unreachable media resolve to `""`.
    pub async fn resolve(&self, media_id: &str) -> String {
        match self.try_resolve(media_id).await {
            Some(snippet) => snippet,
            None => {
                debug!("Media {} resolved to nothing", media_id);
                String::new()
            }
        }
    }

    async fn try_resolve(&self, media_id: &str) -> Option<String> {
        let page = self.fetch(&self.settings.media_url(media_id)).await?;

        if page.contains(GIST_MARKER) {
            return self.gist(&page).await;
        }

        youtube_watch(&page).or_else(|| youtu_be(&page))
    }

    async fn gist(&self, media_page: &str) -> Option<String> {
        let caps = GIST_RE.captures(media_page)?;
        let (gist_url, user, id) = (&caps[1], &caps[2], &caps[3]);

        let gist_page = self.fetch(gist_url).await?;
        let (path, ext) = raw_file_path(&gist_page, user, id)?;

        let code = self.fetch(&format!("{}{}", GIST_RAW_HOST, path)).await?;
        Some(format!("```{}\n{}\n```", ext, code.trim_end()))
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        match self.fetcher.fetch_text(url).await {
            Ok(resp) if !resp.is_success() => {
                warn!("Media fetch {} returned {}", url, resp.status);
                None
            }
            Ok(resp) if !resp.is_textual() => {
                debug!("Media fetch {} is not text ({:?})", url, resp.content_type);
                None
            }
            Ok(resp) => Some(resp.body),
            Err(e) => {
                warn!("Media fetch {} failed: {}", url, e);
                None
            }
        }
    }
}

/// `/<user>/<id>/raw/...<file>.<ext>` for exactly this gist, plus its extension.
fn raw_file_path(gist_page: &str, user: &str, id: &str) -> Option<(String, String)> {
    let pattern = format!(
        r#"(/{}/{}/raw/[^"'\s<>]*\.(\w+))["'\s<>]"#,
        regex::escape(user),
        regex::escape(id)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(gist_page)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

fn youtube_watch(page: &str) -> Option<String> {
    let caps = YOUTUBE_WATCH_RE.captures(page)?;
    Some(youtube_snippet(&caps[1], None))
}

fn youtu_be(page: &str) -> Option<String> {
    let caps = YOUTU_BE_RE.captures(page)?;
    let query = caps.get(2).map(|m| m.as_str()).filter(|q| !q.is_empty());
    Some(youtube_snippet(&caps[1], query))
}

fn youtube_snippet(video_id: &str, query: Option<&str>) -> String {
    let mut watch = format!("{}{}", YOUTUBE_WATCH_URL, video_id);
    if let Some(q) = query {
        watch.push('&');
        watch.push_str(q);
    }
    format!("[![]({}{}/0.jpg)]({})", YOUTUBE_THUMB_HOST, video_id, watch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::StaticFetcher;

    const MEDIA: &str = "https://medium.com/media/abc";

    async fn resolve(fetcher: &StaticFetcher, id: &str) -> String {
        let settings = Settings::default();
        MediaResolver::new(fetcher, &settings).resolve(id).await
    }

    fn gist_fetcher() -> StaticFetcher {
        StaticFetcher::default()
            .with(
                MEDIA,
                "text/html",
                r#"<html><script src="https://gist.github.com/octo/1f2e3d.js"></script></html>"#,
            )
            .with(
                "https://gist.github.com/octo/1f2e3d",
                "text/html",
                r#"<a href="/other/999/raw/aa/x.rb">no</a><a href="/octo/1f2e3d/raw/0badc0de/hello.rs">Raw</a>"#,
            )
            .with(
                "https://gist.githubusercontent.com/octo/1f2e3d/raw/0badc0de/hello.rs",
                "text/plain",
                "fn main() {}\n",
            )
    }

    #[tokio::test]
    async fn gist_becomes_fenced_block() {
        let out = resolve(&gist_fetcher(), "MediaResource:abc").await;
        assert_eq!(out, "```rs\nfn main() {}\n```");
    }

    #[tokio::test]
    async fn gist_without_raw_link() {
        let fetcher = StaticFetcher::default()
            .with(MEDIA, "text/html", "see https://gist.github.com/octo/1f2e3d")
            .with("https://gist.github.com/octo/1f2e3d", "text/html", "<p>nothing</p>");
        assert_eq!(resolve(&fetcher, "MediaResource:abc").await, "");
    }

    #[tokio::test]
    async fn gist_marker_without_url() {
        let fetcher = StaticFetcher::default().with(MEDIA, "text/html", "gist.github.com is down");
        assert_eq!(resolve(&fetcher, "abc").await, "");
    }

    #[tokio::test]
    async fn gist_raw_fetch_fails() {
        let fetcher = StaticFetcher::default()
            .with(MEDIA, "text/html", "https://gist.github.com/octo/1f2e3d")
            .with(
                "https://gist.github.com/octo/1f2e3d",
                "text/html",
                r#"href="/octo/1f2e3d/raw/00/a.py""#,
            );
        assert_eq!(resolve(&fetcher, "abc").await, "");
    }

    #[tokio::test]
    async fn youtube_watch_link() {
        let fetcher = StaticFetcher::default().with(
            MEDIA,
            "text/html",
            r#"{"links":[{"href":"https://www.youtube.com/watch?v=dQw4w9WgXcQ","rel":"x"}]}"#,
        );
        assert_eq!(
            resolve(&fetcher, "abc").await,
            "[![](https://img.youtube.com/vi/dQw4w9WgXcQ/0.jpg)](https://www.youtube.com/watch?v=dQw4w9WgXcQ)"
        );
    }

    #[tokio::test]
    async fn youtu_be_with_query() {
        let fetcher = StaticFetcher::default().with(
            MEDIA,
            "text/html",
            r#"{"href":"https://youtu.be/abc_-12?t=42"}"#,
        );
        assert_eq!(
            resolve(&fetcher, "abc").await,
            "[![](https://img.youtube.com/vi/abc_-12/0.jpg)](https://www.youtube.com/watch?v=abc_-12&t=42)"
        );
    }

    #[tokio::test]
    async fn youtu_be_without_query() {
        let fetcher = StaticFetcher::default()
            .with(MEDIA, "text/html", r#"{"href":"https://youtu.be/xyz"}"#);
        assert_eq!(
            resolve(&fetcher, "abc").await,
            "[![](https://img.youtube.com/vi/xyz/0.jpg)](https://www.youtube.com/watch?v=xyz)"
        );
    }

    #[tokio::test]
    async fn unrecognised_media() {
        let fetcher = StaticFetcher::default().with(MEDIA, "text/html", "<iframe src=\"https://vimeo.com/1\">");
        assert_eq!(resolve(&fetcher, "abc").await, "");
    }

    #[tokio::test]
    async fn non_textual_or_failed_fetch() {
        let binary = StaticFetcher::default().with(MEDIA, "image/png", "\u{89}PNG");
        assert_eq!(resolve(&binary, "abc").await, "");

        let server_error = StaticFetcher::default().with_status(MEDIA, 500);
        assert_eq!(resolve(&server_error, "abc").await, "");

        assert_eq!(resolve(&StaticFetcher::default(), "missing").await, "");
    }

    #[test]
    fn raw_path_scoped_to_gist() {
        let page = r#"href="/a/1/raw/ff/one.go" href="/b/2/raw/ee/two.py" "#;
        assert_eq!(
            raw_file_path(page, "b", "2"),
            Some(("/b/2/raw/ee/two.py".to_string(), "py".to_string()))
        );
        assert_eq!(raw_file_path(page, "c", "3"), None);
    }
}
