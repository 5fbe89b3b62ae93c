//! The rich-text editor document tree.
//!
//! Articles are authored in a block-based editor whose persisted form is a
//! recursive JSON tree. Deserialization is deliberately permissive: node
//! types this backend does not understand map to [`ContentNode::Unknown`]
//! instead of failing, so one exotic node never makes a stored draft
//! unreadable.

use serde::{Deserialize, Serialize};

/// A single node of the editor document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentNode {
    Paragraph {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<ContentNode>,
    },
    Heading {
        #[serde(default)]
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<ContentNode>,
    },
    Blockquote {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<ContentNode>,
    },
    BulletList {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<ContentNode>,
    },
    OrderedList {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<ContentNode>,
    },
    ListItem {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<ContentNode>,
    },
    Image {
        #[serde(default)]
        attrs: ImageAttrs,
    },
    #[serde(rename = "youtube-embed")]
    YoutubeEmbed {
        #[serde(default)]
        attrs: EmbedAttrs,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
    /// Any node type this backend does not model.
    #[serde(other)]
    Unknown,
}

impl ContentNode {
    /// Child nodes, empty for leaf node types.
    pub fn children(&self) -> &[ContentNode] {
        match self {
            ContentNode::Paragraph { content }
            | ContentNode::Heading { content, .. }
            | ContentNode::Blockquote { content }
            | ContentNode::BulletList { content }
            | ContentNode::OrderedList { content }
            | ContentNode::ListItem { content } => content,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeadingAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageAttrs {
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmbedAttrs {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Inline formatting attached to a text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Link {
        #[serde(default)]
        attrs: LinkAttrs,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkAttrs {
    #[serde(default)]
    pub href: String,
}
