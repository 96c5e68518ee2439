//! Atlassian Document Format (ADF) types and markdown conversion.
//!
//! Jira Cloud only accepts rich comment bodies as ADF. Mayil returns its results as
//! markdown, so every result goes through [`markdown_to_document`] before it is
//! posted. The same [`Node`] type is used to read comment bodies from webhook events.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const DOC: &str = "doc";
const PARAGRAPH: &str = "paragraph";
const HEADING: &str = "heading";
const BLOCKQUOTE: &str = "blockquote";
const CODE_BLOCK: &str = "codeBlock";
const BULLET_LIST: &str = "bulletList";
const ORDERED_LIST: &str = "orderedList";
const LIST_ITEM: &str = "listItem";
const RULE: &str = "rule";
const HARD_BREAK: &str = "hardBreak";
const TEXT: &str = "text";

/// Top-level ADF document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Always `"doc"`
    #[serde(rename = "type")]
    pub doc_type: String,
    /// ADF version, always 1
    pub version: u32,
    /// Block nodes
    #[serde(default)]
    pub content: Vec<Node>,
}

impl Document {
    /// Create a document from block nodes.
    #[must_use]
    pub fn new(content: Vec<Node>) -> Self {
        Self {
            doc_type: DOC.to_string(),
            version: 1,
            content,
        }
    }

    /// A document holding a single unformatted paragraph.
    #[must_use]
    pub fn plain_text(message: &str) -> Self {
        Self::new(vec![Node::block(
            PARAGRAPH,
            vec![Node::text(message, Vec::new())],
        )])
    }
}

/// A single ADF node. Block and inline nodes share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node type (`paragraph`, `text`, `heading`, ...)
    #[serde(rename = "type", default)]
    pub node_type: String,
    /// Text content for `text` nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Child nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    /// Inline marks for `text` nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    /// Node attributes (heading level, code language, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Value>,
}

impl Node {
    /// A block node with children.
    #[must_use]
    pub fn block(node_type: &str, content: Vec<Node>) -> Self {
        Self {
            node_type: node_type.to_string(),
            text: None,
            content,
            marks: Vec::new(),
            attrs: None,
        }
    }

    /// A text node carrying the given marks.
    #[must_use]
    pub fn text(text: &str, marks: Vec<Mark>) -> Self {
        Self {
            node_type: TEXT.to_string(),
            text: Some(text.to_string()),
            content: Vec::new(),
            marks,
            attrs: None,
        }
    }

    /// Attach attributes to this node.
    #[must_use]
    pub fn with_attrs(mut self, attrs: Value) -> Self {
        self.attrs = Some(attrs);
        self
    }

    fn accepts_inline(&self) -> bool {
        matches!(self.node_type.as_str(), PARAGRAPH | HEADING | CODE_BLOCK)
    }
}

/// Inline formatting mark (`strong`, `em`, `code`, `strike`, `link`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    /// Mark type
    #[serde(rename = "type")]
    pub mark_type: String,
    /// Mark attributes (`href` for links)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Value>,
}

impl Mark {
    fn new(mark_type: &str) -> Self {
        Self {
            mark_type: mark_type.to_string(),
            attrs: None,
        }
    }
}

/// Concatenate the `text` of every node in the tree, depth first.
#[must_use]
pub fn collect_text(nodes: &[Node]) -> String {
    fn walk(nodes: &[Node], out: &mut String) {
        for node in nodes {
            if let Some(text) = &node.text {
                out.push_str(text);
            }
            walk(&node.content, out);
        }
    }

    let mut out = String::new();
    walk(nodes, &mut out);
    out
}

/// Convert markdown into an ADF document.
#[must_use]
pub fn markdown_to_document(markdown: &str) -> Document {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut builder = DocumentBuilder::new();
    for event in Parser::new_ext(markdown, options) {
        builder.push(event);
    }
    builder.finish()
}

/// What an open markdown tag contributes until its matching end event.
enum Frame {
    Block,
    Mark,
    Ignored,
}

struct DocumentBuilder {
    frames: Vec<Frame>,
    /// Open block nodes; index 0 is the document root and is never closed early.
    blocks: Vec<Node>,
    marks: Vec<Mark>,
}

impl DocumentBuilder {
    fn new() -> Self {
        Self {
            frames: Vec::new(),
            blocks: vec![Node::block(DOC, Vec::new())],
            marks: Vec::new(),
        }
    }

    fn push(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(_) => self.close(),
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.push_text(&text, self.marks.clone());
            }
            Event::Code(code) => {
                let mut marks: Vec<Mark> = self
                    .marks
                    .iter()
                    .filter(|m| m.mark_type == "link")
                    .cloned()
                    .collect();
                marks.push(Mark::new("code"));
                self.push_text(&code, marks);
            }
            Event::SoftBreak => self.push_text(" ", self.marks.clone()),
            Event::HardBreak => self.attach_inline(Node::block(HARD_BREAK, Vec::new())),
            Event::Rule => self.attach_block(Node::block(RULE, Vec::new())),
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let block = match tag {
            Tag::Paragraph => Some(Node::block(PARAGRAPH, Vec::new())),
            Tag::Heading { level, .. } => {
                Some(Node::block(HEADING, Vec::new()).with_attrs(json!({ "level": level as u8 })))
            }
            Tag::BlockQuote(_) => Some(Node::block(BLOCKQUOTE, Vec::new())),
            Tag::CodeBlock(kind) => {
                let node = Node::block(CODE_BLOCK, Vec::new());
                Some(match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                        node.with_attrs(json!({ "language": lang.as_ref() }))
                    }
                    _ => node,
                })
            }
            Tag::List(Some(start)) => {
                Some(Node::block(ORDERED_LIST, Vec::new()).with_attrs(json!({ "order": start })))
            }
            Tag::List(None) => Some(Node::block(BULLET_LIST, Vec::new())),
            Tag::Item => Some(Node::block(LIST_ITEM, Vec::new())),
            Tag::Emphasis => return self.open_mark(Mark::new("em")),
            Tag::Strong => return self.open_mark(Mark::new("strong")),
            Tag::Strikethrough => return self.open_mark(Mark::new("strike")),
            Tag::Link { dest_url, .. } => {
                let mut mark = Mark::new("link");
                mark.attrs = Some(json!({ "href": dest_url.as_ref() }));
                return self.open_mark(mark);
            }
            _ => None,
        };

        match block {
            Some(node) => {
                self.blocks.push(node);
                self.frames.push(Frame::Block);
            }
            None => self.frames.push(Frame::Ignored),
        }
    }

    fn open_mark(&mut self, mark: Mark) {
        self.marks.push(mark);
        self.frames.push(Frame::Mark);
    }

    fn close(&mut self) {
        match self.frames.pop() {
            Some(Frame::Block) => {
                if self.blocks.len() > 1 {
                    if let Some(node) = self.blocks.pop() {
                        self.attach_block(node);
                    }
                }
            }
            Some(Frame::Mark) => {
                self.marks.pop();
            }
            Some(Frame::Ignored) | None => {}
        }
    }

    fn push_text(&mut self, text: &str, marks: Vec<Mark>) {
        // ADF rejects empty text nodes
        if text.is_empty() {
            return;
        }
        self.attach_inline(Node::text(text, marks));
    }

    fn attach_block(&mut self, node: Node) {
        if let Some(parent) = self.blocks.last_mut() {
            parent.content.push(node);
        }
    }

    /// Tight list items and block quotes receive inline content directly from the
    /// parser; ADF needs it wrapped in a paragraph.
    fn attach_inline(&mut self, node: Node) {
        let Some(block) = self.blocks.last_mut() else {
            return;
        };
        if block.accepts_inline() {
            block.content.push(node);
            return;
        }

        let extend_last = block
            .content
            .last()
            .is_some_and(|last| last.node_type == PARAGRAPH);
        if extend_last {
            if let Some(last) = block.content.last_mut() {
                last.content.push(node);
            }
        } else {
            block.content.push(Node::block(PARAGRAPH, vec![node]));
        }
    }

    fn finish(mut self) -> Document {
        while !self.frames.is_empty() {
            self.close();
        }
        let content = self.blocks.pop().map(|root| root.content).unwrap_or_default();
        Document::new(content)
    }
}
