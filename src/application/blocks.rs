//! Structured-content blocks: the content lake's document representation.
//!
//! Produced exclusively by the transformer. Keys are unique within one
//! output document; the lake uses them for differencing, nothing else.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStyle {
    Normal,
    H2,
    H3,
    Blockquote,
}

impl BlockStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockStyle::Normal => "normal",
            BlockStyle::H2 => "h2",
            BlockStyle::H3 => "h3",
            BlockStyle::Blockquote => "blockquote",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMarker {
    Bullet,
    Number,
}

impl ListMarker {
    pub fn as_str(self) -> &'static str {
        match self {
            ListMarker::Bullet => "bullet",
            ListMarker::Number => "number",
        }
    }
}

/// One inline run of text with its mark references. Marks are either the
/// literal decorators `strong`/`em` or the key of a [`MarkDef`] in the
/// owning block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub key: String,
    pub text: String,
    pub marks: Vec<String>,
}

/// Block-scoped link annotation referenced from spans by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkDef {
    pub key: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    pub key: String,
    pub style: BlockStyle,
    pub list_item: Option<ListMarker>,
    pub children: Vec<Span>,
    pub mark_defs: Vec<MarkDef>,
}

/// Where an embedded image's binary lives. `Pending` carries the transient
/// object-store URL until the publish pipeline rehomes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AssetSource {
    Pending { url: String },
    Stable { asset_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageBlock {
    pub key: String,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub attribution: Option<String>,
    pub source: AssetSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoBlock {
    pub key: String,
    pub url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContentBlock {
    Text(TextBlock),
    Image(ImageBlock),
    Video(VideoBlock),
}

impl ContentBlock {
    pub fn key(&self) -> &str {
        match self {
            ContentBlock::Text(block) => &block.key,
            ContentBlock::Image(block) => &block.key,
            ContentBlock::Video(block) => &block.key,
        }
    }
}
