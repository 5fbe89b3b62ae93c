//! Rich-text tree to structured-content conversion.
//!
//! A pure, best-effort translation: editorial content is user-authored, so
//! a node this code cannot interpret is omitted rather than failing the
//! publish of an entire story. There is deliberately no error channel.

use crate::application::blocks::{
    AssetSource, BlockStyle, ContentBlock, ImageBlock, ListMarker, MarkDef, Span, TextBlock,
    VideoBlock,
};
use crate::domain::content::{ContentNode, Mark};

/// Per-document key allocator. One shared counter keeps every block, span,
/// and mark-definition key unique within the output document.
#[derive(Debug, Default)]
struct KeyGen {
    next: u32,
}

impl KeyGen {
    fn block(&mut self) -> String {
        self.take('b')
    }

    fn span(&mut self) -> String {
        self.take('s')
    }

    fn mark_def(&mut self) -> String {
        self.take('m')
    }

    fn take(&mut self, prefix: char) -> String {
        let key = format!("{prefix}{}", self.next);
        self.next += 1;
        key
    }
}

/// Convert an editor document into the content lake's block sequence.
pub fn transform(nodes: &[ContentNode]) -> Vec<ContentBlock> {
    let mut keys = KeyGen::default();
    let mut blocks = Vec::new();

    for node in nodes {
        match node {
            ContentNode::Paragraph { content } => {
                blocks.push(text_block(BlockStyle::Normal, None, content, &mut keys));
            }
            ContentNode::Heading { attrs, content } => {
                blocks.push(text_block(
                    heading_style(attrs.level),
                    None,
                    content,
                    &mut keys,
                ));
            }
            ContentNode::Blockquote { content } => {
                blocks.push(text_block(BlockStyle::Blockquote, None, content, &mut keys));
            }
            ContentNode::BulletList { content } => {
                list_items(ListMarker::Bullet, content, &mut keys, &mut blocks);
            }
            ContentNode::OrderedList { content } => {
                list_items(ListMarker::Number, content, &mut keys, &mut blocks);
            }
            ContentNode::Image { attrs } => {
                blocks.push(ContentBlock::Image(ImageBlock {
                    key: keys.block(),
                    alt: attrs.alt.clone(),
                    caption: attrs.caption.clone(),
                    attribution: attrs.source.clone(),
                    source: AssetSource::Pending {
                        url: attrs.src.clone(),
                    },
                }));
            }
            ContentNode::YoutubeEmbed { attrs } => {
                blocks.push(ContentBlock::Video(VideoBlock {
                    key: keys.block(),
                    url: attrs.url.clone(),
                    caption: attrs.caption.clone(),
                }));
            }
            // Anything else is not a top-level block we know how to carry.
            ContentNode::ListItem { .. }
            | ContentNode::Text { .. }
            | ContentNode::Unknown => {}
        }
    }

    blocks
}

/// Heading levels beyond the supported range collapse to h2. The editor
/// only offers 2 and 3, but stored documents are not trusted to agree.
fn heading_style(level: Option<u8>) -> BlockStyle {
    match level {
        Some(3) => BlockStyle::H3,
        _ => BlockStyle::H2,
    }
}

fn list_items(
    marker: ListMarker,
    items: &[ContentNode],
    keys: &mut KeyGen,
    out: &mut Vec<ContentBlock>,
) {
    for item in items {
        // List invariant: immediate children are listItem nodes. Anything
        // else is skipped rather than reinterpreted.
        let ContentNode::ListItem { content } = item else {
            continue;
        };
        // Only the first child carries the item's payload; extra block
        // children are ignored (longstanding editor behavior, kept as-is).
        let Some(payload) = content.first() else {
            continue;
        };

        let style = match payload {
            ContentNode::Heading { attrs, .. } => heading_style(attrs.level),
            ContentNode::Blockquote { .. } => BlockStyle::Blockquote,
            _ => BlockStyle::Normal,
        };
        out.push(text_block(
            style,
            Some(marker),
            std::slice::from_ref(payload),
            keys,
        ));
    }
}

fn text_block(
    style: BlockStyle,
    list_item: Option<ListMarker>,
    nodes: &[ContentNode],
    keys: &mut KeyGen,
) -> ContentBlock {
    let key = keys.block();
    let mut children = Vec::new();
    let mut mark_defs = Vec::new();

    for node in nodes {
        collect_spans(node, keys, &mut children, &mut mark_defs);
    }

    // The lake rejects text blocks without children.
    if children.is_empty() {
        children.push(Span {
            key: keys.span(),
            text: String::new(),
            marks: Vec::new(),
        });
    }

    ContentBlock::Text(TextBlock {
        key,
        style,
        list_item,
        children,
        mark_defs,
    })
}

/// Walk a subtree and turn every text run into a span, registering link
/// mark definitions on the owning block as they are met.
fn collect_spans(
    node: &ContentNode,
    keys: &mut KeyGen,
    children: &mut Vec<Span>,
    mark_defs: &mut Vec<MarkDef>,
) {
    if let ContentNode::Text { text, marks } = node {
        let mut span_marks = Vec::new();
        for mark in marks {
            match mark {
                Mark::Bold => span_marks.push("strong".to_string()),
                Mark::Italic => span_marks.push("em".to_string()),
                Mark::Link { attrs } => {
                    let key = keys.mark_def();
                    mark_defs.push(MarkDef {
                        key: key.clone(),
                        href: attrs.href.clone(),
                    });
                    span_marks.push(key);
                }
                Mark::Unknown => {}
            }
        }
        children.push(Span {
            key: keys.span(),
            text: text.clone(),
            marks: span_marks,
        });
        return;
    }

    for child in node.children() {
        collect_spans(child, keys, children, mark_defs);
    }
}
