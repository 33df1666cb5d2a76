use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// `{"__ref": "<id>"}` pointer to another record in the graph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ref {
    #[serde(rename = "__ref")]
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub title: Option<String>,
    pub creator: Option<Ref>,
    pub first_published_at: Option<i64>,
    pub preview_image: Option<Ref>,
    pub preview_content: Option<PreviewContent>,
    pub canonical_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewContent {
    pub subtitle: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: Option<String>,
    pub image_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(rename = "type")]
    pub kind: ParagraphKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub markups: Vec<Mark>,
    pub layout: Option<String>,
    pub metadata: Option<Ref>,
    pub iframe: Option<Iframe>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Iframe {
    pub media_resource: Option<Ref>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ParagraphKind {
    H3,
    H4,
    P,
    Blockquote,
    PullQuote,
    UnorderedItem,
    OrderedItem,
    Image,
    Preformatted,
    Iframe,
    Unknown(String),
}

impl From<String> for ParagraphKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "H3" => Self::H3,
            "H4" => Self::H4,
            "P" => Self::P,
            "BQ" => Self::Blockquote,
            "PQ" => Self::PullQuote,
            "ULI" => Self::UnorderedItem,
            "OLI" => Self::OrderedItem,
            "IMG" => Self::Image,
            "PRE" => Self::Preformatted,
            "IFRAME" => Self::Iframe,
            _ => Self::Unknown(tag),
        }
    }
}

/// Styling or link over `[start, end)` in UTF-16 code units of the paragraph text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkKind,
    pub start: usize,
    pub end: usize,
    pub href: Option<String>,
    pub anchor_type: Option<String>,
    pub user_id: Option<String>,
}

impl Mark {
    pub fn new(kind: MarkKind, start: usize, end: usize) -> Self {
        Self { kind, start, end, href: None, anchor_type: None, user_id: None }
    }

    pub fn link(start: usize, end: usize, href: &str) -> Self {
        Self { href: Some(href.to_string()), ..Self::new(MarkKind::Link, start, end) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MarkKind {
    Code,
    Link,
    Em,
    Strong,
    Unknown(String),
}

impl From<String> for MarkKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "CODE" => Self::Code,
            "A" => Self::Link,
            "EM" => Self::Em,
            "STRONG" => Self::Strong,
            _ => Self::Unknown(tag),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageMetadata {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaResource {
    pub id: Option<String>,
}

/// One graph entry, typed by its `__typename`.
#[derive(Debug, Clone)]
pub enum Record {
    Post(Post),
    User(User),
    Paragraph(Paragraph),
    ImageMetadata(ImageMetadata),
    MediaResource(MediaResource),
    Other(String),
}

impl Record {
    /// Records whose fields don't fit their declared type are kept as `Other`.
    pub fn from_value(id: &str, value: Value) -> Self {
        let typename = value
            .get("__typename")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let decoded = match typename.as_str() {
            "Post" => serde_json::from_value(value).map(Record::Post),
            "User" => serde_json::from_value(value).map(Record::User),
            "Paragraph" => serde_json::from_value(value).map(Record::Paragraph),
            "ImageMetadata" => serde_json::from_value(value).map(Record::ImageMetadata),
            "MediaResource" => serde_json::from_value(value).map(Record::MediaResource),
            _ => return Record::Other(typename),
        };

        decoded.unwrap_or_else(|e| {
            if matches!(typename.as_str(), "Post" | "Paragraph") {
                warn!("Record {} ({}) dropped, fields do not decode: {}", id, typename, e);
            } else {
                debug!("Record {} ({}) kept untyped: {}", id, typename, e);
            }
            Record::Other(typename)
        })
    }

    pub fn typename(&self) -> &str {
        match self {
            Record::Post(_) => "Post",
            Record::User(_) => "User",
            Record::Paragraph(_) => "Paragraph",
            Record::ImageMetadata(_) => "ImageMetadata",
            Record::MediaResource(_) => "MediaResource",
            Record::Other(name) => name,
        }
    }
}

/// Flat id → record arena built from `__APOLLO_STATE__`. Insertion order is
/// the key order of the source object and is what every scan yields.
#[derive(Debug, Default)]
pub struct StateGraph {
    records: Vec<(String, Record)>,
    index: HashMap<String, usize>,
}

impl StateGraph {
    /// A non-object state yields an empty graph.
    pub fn from_value(state: Value) -> Self {
        let Value::Object(map) = state else {
            debug!("State is not an object, graph left empty");
            return Self::default();
        };

        let mut graph = Self {
            records: Vec::with_capacity(map.len()),
            index: HashMap::with_capacity(map.len()),
        };
        for (id, value) in map {
            let record = Record::from_value(&id, value);
            graph.index.insert(id.clone(), graph.records.len());
            graph.records.push((id, record));
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&i| &self.records[i].1)
    }

    /// Follow an optional reference; dangling references are `None`.
    pub fn deref(&self, r: Option<&Ref>) -> Option<&Record> {
        r.and_then(|r| self.get(&r.id))
    }

    pub fn user(&self, r: Option<&Ref>) -> Option<&User> {
        match self.deref(r)? {
            Record::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn scan_by_type<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = (&'a str, &'a Record)> {
        self.records
            .iter()
            .filter(move |(_, record)| record.typename() == tag)
            .map(|(id, record)| (id.as_str(), record))
    }

    pub fn posts(&self) -> impl Iterator<Item = (&str, &Post)> {
        self.scan_by_type("Post").filter_map(|(id, record)| match record {
            Record::Post(post) => Some((id, post)),
            _ => None,
        })
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = (&str, &Paragraph)> {
        self.scan_by_type("Paragraph").filter_map(|(id, record)| match record {
            Record::Paragraph(p) => Some((id, p)),
            _ => None,
        })
    }
}
