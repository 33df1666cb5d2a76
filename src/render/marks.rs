use tracing::warn;

use crate::config::Settings;
use crate::graph::{Mark, MarkKind};

/// Weave markdown tokens for `marks` into `text`.
///
/// Offsets count UTF-16 code units. The text is swept once; at each character
/// boundary the marks ending there close (in stored order), then the marks
/// starting there open (in reverse stored order), then the character follows.
/// Marks that share a boundary therefore nest, but ranges that partially
/// overlap are not repaired: each still emits its own pair of tokens.
pub fn interleave(text: &str, marks: &[Mark], settings: &Settings) -> String {
    let len: usize = text.encode_utf16().count();

    let live: Vec<&Mark> = marks
        .iter()
        .filter(|m| m.start.min(len) < m.end.min(len))
        .collect();
    for m in &live {
        if let MarkKind::Unknown(kind) = &m.kind {
            warn!("Unknown mark kind {} at [{}, {}), rendered bare", kind, m.start, m.end);
        }
    }

    let mut out = String::with_capacity(text.len() + live.len() * 4);
    let mut chars = text.chars();
    let mut prev: Option<usize> = None;
    let mut pos = 0usize;

    loop {
        // Offsets inside a surrogate pair land on the next boundary.
        let at_boundary = |offset: usize| {
            let offset = offset.min(len);
            match prev {
                None => offset == pos,
                Some(p) => offset > p && offset <= pos,
            }
        };

        for m in live.iter().filter(|m| at_boundary(m.end)) {
            push_close(&mut out, m, settings);
        }
        for m in live.iter().rev().filter(|m| at_boundary(m.start)) {
            out.push_str(open_token(&m.kind));
        }

        match chars.next() {
            Some(c) => {
                out.push(c);
                prev = Some(pos);
                pos += c.len_utf16();
            }
            None => break,
        }
    }

    out
}

fn open_token(kind: &MarkKind) -> &'static str {
    match kind {
        MarkKind::Code => "`",
        MarkKind::Link => "[",
        MarkKind::Em => "*",
        MarkKind::Strong => "**",
        MarkKind::Unknown(_) => "",
    }
}

fn push_close(out: &mut String, mark: &Mark, settings: &Settings) {
    match &mark.kind {
        MarkKind::Code => out.push('`'),
        MarkKind::Link => {
            out.push_str("](");
            out.push_str(&link_target(mark, settings));
            out.push(')');
        }
        MarkKind::Em => out.push('*'),
        MarkKind::Strong => out.push_str("**"),
        MarkKind::Unknown(_) => {}
    }
}

/// Mentions carry a user id instead of an href.
fn link_target(mark: &Mark, settings: &Settings) -> String {
    match (&mark.href, mark.anchor_type.as_deref(), &mark.user_id) {
        (Some(href), _, _) => href.clone(),
        (None, Some("USER"), Some(user_id)) => settings.profile_url(user_id),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use regex::Regex;

    use super::*;

    static TOKEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\]\([^)]*\)|\*|`|\[").unwrap());

    fn render(text: &str, marks: &[Mark]) -> String {
        interleave(text, marks, &Settings::default())
    }

    fn strip(md: &str) -> String {
        TOKEN_RE.replace_all(md, "").to_string()
    }

    #[test]
    fn strong_prefix() {
        let marks = [Mark::new(MarkKind::Strong, 0, 5)];
        assert_eq!(render("hello world", &marks), "**hello** world");
    }

    #[test]
    fn nested_inner_closes_first() {
        let marks = [Mark::new(MarkKind::Em, 0, 2), Mark::new(MarkKind::Strong, 0, 1)];
        assert_eq!(render("ab", &marks), "***a**b*");
    }

    #[test]
    fn same_range_nests() {
        let marks = [Mark::new(MarkKind::Strong, 0, 3), Mark::new(MarkKind::Code, 0, 3)];
        assert_eq!(render("foo", &marks), "`**foo**`");
    }

    #[test]
    fn adjacent_marks() {
        let marks = [Mark::new(MarkKind::Em, 0, 2), Mark::new(MarkKind::Strong, 2, 4)];
        assert_eq!(render("abcd", &marks), "*ab***cd**");
    }

    #[test]
    fn link_with_href() {
        let marks = [Mark::link(4, 8, "https://example.com")];
        assert_eq!(
            render("see this page", &marks),
            "see [this](https://example.com) page"
        );
    }

    #[test]
    fn user_mention_links_to_profile() {
        let mut mention = Mark::new(MarkKind::Link, 0, 3);
        mention.anchor_type = Some("USER".into());
        mention.user_id = Some("42abc".into());
        assert_eq!(render("Ada", &[mention]), "[Ada](https://medium.com/u/42abc)");
    }

    #[test]
    fn mark_at_end_of_text() {
        let marks = [Mark::new(MarkKind::Code, 4, 7)];
        assert_eq!(render("run ls!", &marks), "run `ls!`");
    }

    #[test]
    fn unknown_kind_is_bare() {
        let marks = [
            Mark::new(MarkKind::Unknown("HIGHLIGHT".into()), 0, 3),
            Mark::new(MarkKind::Em, 4, 7),
        ];
        assert_eq!(render("abc def", &marks), "abc *def*");
    }

    #[test]
    fn offsets_are_utf16() {
        let marks = [Mark::new(MarkKind::Em, 3, 5)];
        assert_eq!(render("😀 hi", &marks), "😀 *hi*");
    }

    #[test]
    fn offset_inside_surrogate_pair_snaps_forward() {
        let marks = [Mark::new(MarkKind::Strong, 1, 3)];
        assert_eq!(render("😀 hi", &marks), "😀** **hi");
    }

    #[test]
    fn out_of_range_and_empty_marks() {
        let marks = [
            Mark::new(MarkKind::Em, 2, 99),
            Mark::new(MarkKind::Strong, 1, 1),
            Mark::new(MarkKind::Code, 50, 60),
        ];
        assert_eq!(render("abc", &marks), "ab*c*");
    }

    #[test]
    fn no_marks() {
        assert_eq!(render("plain", &[]), "plain");
        assert_eq!(render("", &[]), "");
    }

    #[test]
    fn stripping_tokens_restores_text() {
        let cases: Vec<(&str, Vec<Mark>)> = vec![
            ("hello world", vec![Mark::new(MarkKind::Strong, 0, 5)]),
            (
                "one two three",
                vec![
                    Mark::new(MarkKind::Em, 0, 13),
                    Mark::new(MarkKind::Strong, 4, 7),
                    Mark::link(8, 13, "https://x.test/a"),
                ],
            ),
            (
                "nested code",
                vec![Mark::new(MarkKind::Code, 7, 11), Mark::new(MarkKind::Strong, 0, 11)],
            ),
            ("ünïcödé ok", vec![Mark::new(MarkKind::Em, 0, 7)]),
        ];
        for (text, marks) in cases {
            assert_eq!(strip(&render(text, &marks)), text);
        }
    }

    #[test]
    fn partial_overlap_still_emits_pairs() {
        let marks = [Mark::new(MarkKind::Em, 0, 3), Mark::new(MarkKind::Strong, 2, 5)];
        let out = render("abcde", &marks);
        assert_eq!(out, "*ab**c*de**");
        assert_eq!(strip(&out), "abcde");
    }
}
