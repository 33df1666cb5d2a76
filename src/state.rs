use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{ParseError, Result};

pub const PRELOADED_STATE: &str = "__PRELOADED_STATE__";
pub const APOLLO_STATE: &str = "__APOLLO_STATE__";

const SCRIPT_OPEN: &str = "<script";
const SCRIPT_CLOSE: &str = "</script>";

static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:window\.)?(__PRELOADED_STATE__|__APOLLO_STATE__)\s*(=+)\s*").unwrap()
});

/// The two globals a page bootstraps before hydration.
#[derive(Debug)]
pub struct PageState {
    pub preloaded: Value,
    pub apollo: Value,
}

/// Collect the state globals assigned by the page's inline scripts.
///
/// Scripts are never run. Each `window.<NAME> = <literal>` assignment is read
/// as JSON, in document order, so a later assignment replaces an earlier one
/// the same way it would in a shared global scope. Comparisons (`==`, `===`)
/// are not assignments, and scanning resumes after a decoded literal so text
/// inside a payload is never taken for code.
pub fn extract(html: &str) -> Result<PageState> {
    let mut globals: HashMap<&'static str, Value> = HashMap::new();

    for fragment in script_fragments(html) {
        let mut pos = 0;
        while let Some(caps) = ASSIGN_RE.captures_at(fragment, pos) {
            let Some(whole) = caps.get(0) else { break };
            pos = whole.end();
            if &caps[2] != "=" {
                continue;
            }

            let key = match &caps[1] {
                PRELOADED_STATE => PRELOADED_STATE,
                _ => APOLLO_STATE,
            };
            let (value, consumed) = read_literal(&fragment[whole.end()..])
                .map_err(|source| ParseError::ScriptEvaluation { key, source })?;
            debug!("Read {} from inline script", key);
            globals.insert(key, value);
            pos = whole.end() + consumed;
        }
    }

    let preloaded = globals
        .remove(PRELOADED_STATE)
        .ok_or(ParseError::MissingState { key: PRELOADED_STATE })?;
    let apollo = globals
        .remove(APOLLO_STATE)
        .ok_or(ParseError::MissingState { key: APOLLO_STATE })?;

    Ok(PageState { preloaded, apollo })
}

/// Bodies of every `<script ...>...</script>` in order. Literal delimiter
/// scan, no nesting; an unterminated script runs to the end of input.
pub fn script_fragments(html: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut rest = html;

    while let Some(open) = rest.find(SCRIPT_OPEN) {
        let after_tag = &rest[open + SCRIPT_OPEN.len()..];
        let Some(gt) = after_tag.find('>') else { break };
        let body = &after_tag[gt + 1..];
        match body.find(SCRIPT_CLOSE) {
            Some(close) => {
                fragments.push(&body[..close]);
                rest = &body[close + SCRIPT_CLOSE.len()..];
            }
            None => {
                fragments.push(body);
                break;
            }
        }
    }

    fragments
}

/// First JSON value at the start of `src` and the bytes it spans; whatever
/// follows (`;`, more code) is left for the caller.
fn read_literal(src: &str) -> std::result::Result<(Value, usize), serde_json::Error> {
    let mut stream = serde_json::Deserializer::from_str(src).into_iter::<Value>();
    match stream.next() {
        Some(value) => Ok((value?, stream.byte_offset())),
        None => serde_json::from_str::<Value>(src).map(|v| (v, src.len())),
    }
}
