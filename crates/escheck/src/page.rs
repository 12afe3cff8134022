//! Markdown page model.
//!
//! Page bodies are parsed with pulldown-cmark into a tree of blocks that
//! keep their byte ranges, so rules can compare against the exact source.
//! Two documentation conventions are recognized on top of plain markdown:
//!
//! - definition lists written as `- term` followed by a nested `- : details`
//!   item become [`BlockKind::DescriptionList`] with alternating
//!   [`BlockKind::Term`] / [`BlockKind::Details`] children;
//! - block quotes opening with `**Note:**` (or `[!NOTE]` and friends) become
//!   [`BlockKind::Callout`].

use escheck_core::Section;
use escheck_core::section::normalize_title;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;
use std::ops::Range;

const DEFINITION_PREFIX: &str = ": ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutKind {
    Note,
    Warning,
    Callout,
}

const CALLOUT_MARKERS: &[(&str, CalloutKind)] = &[
    ("**Note:**", CalloutKind::Note),
    ("**Warning:**", CalloutKind::Warning),
    ("**Callout:**", CalloutKind::Callout),
    ("[!NOTE]", CalloutKind::Note),
    ("[!WARNING]", CalloutKind::Warning),
    ("[!CALLOUT]", CalloutKind::Callout),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    /// Fenced or indented code, with the first word of the info string
    Code { lang: String },
    List { ordered: bool },
    Item,
    BlockQuote,
    Callout(CalloutKind),
    DescriptionList,
    Term,
    Details,
    Html,
    Table,
    Rule,
    Other,
}

/// A block-level node with its source range.
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub range: Range<usize>,
    pub children: Vec<Block>,
    /// Plain text for paragraphs and headings, contents for code and html
    pub text: String,
}

impl Block {
    fn new(kind: BlockKind, range: Range<usize>) -> Self {
        Self {
            kind,
            range,
            children: Vec::new(),
            text: String::new(),
        }
    }

    pub fn is_html_comment(&self) -> bool {
        self.kind == BlockKind::Html && self.text.trim_start().starts_with("<!--")
    }

    /// Alternating term/details pairs of a description list.
    pub fn definitions(&self) -> impl Iterator<Item = (&Block, Option<&Block>)> {
        self.children
            .chunks(2)
            .map(|pair| (&pair[0], pair.get(1)))
    }
}

/// A parsed page body.
#[derive(Debug, Clone)]
pub struct Page {
    source: String,
    blocks: Vec<Block>,
    sections: Vec<Section>,
    /// Section id to the range of top-level blocks directly under it
    spans: HashMap<String, Range<usize>>,
}

impl Page {
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let blocks: Vec<Block> = parse_blocks(&source)
            .into_iter()
            .map(|b| transform(b, &source))
            .collect();

        let headings: Vec<(usize, u8, String)> = blocks
            .iter()
            .enumerate()
            .filter_map(|(i, b)| match b.kind {
                BlockKind::Heading(level) => Some((i, level, normalize_title(&b.text))),
                _ => None,
            })
            .collect();

        let mut spans = HashMap::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut outline = Vec::new();
        for (n, (index, level, title)) in headings.iter().enumerate() {
            let end = headings.get(n + 1).map(|h| h.0).unwrap_or(blocks.len());
            if *level < 2 {
                continue;
            }
            let mut id = heading_id(title);
            let count = seen.entry(id.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                id = format!("{}_{}", id, count);
            }
            spans.insert(id.clone(), index + 1..end);
            outline.push((*level as usize, title.clone(), id));
        }

        Self {
            sections: Section::from_outline(outline),
            source,
            blocks,
            spans,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Top-level blocks in document order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Every block, depth first.
    pub fn walk(&self) -> Vec<&Block> {
        fn visit<'a>(blocks: &'a [Block], out: &mut Vec<&'a Block>) {
            for block in blocks {
                out.push(block);
                visit(&block.children, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.blocks, &mut out);
        out
    }

    /// Source text of a block.
    pub fn text(&self, block: &Block) -> &str {
        &self.source[block.range.clone()]
    }

    /// Source text from the start of the first block to the end of the last.
    pub fn span_text(&self, blocks: &[Block]) -> &str {
        match (blocks.first(), blocks.last()) {
            (Some(first), Some(last)) => &self.source[first.range.start..last.range.end],
            _ => "",
        }
    }

    /// The heading outline, H2 sections at the top level.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// A top-level section by title.
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Blocks between a section's heading and the next heading.
    pub fn section_blocks(&self, section: &Section) -> &[Block] {
        self.spans
            .get(&section.id)
            .map(|span| &self.blocks[span.clone()])
            .unwrap_or(&[])
    }

    /// Text of a callout's first paragraph, without the marker and quote
    /// prefixes, on one line.
    pub fn callout_text(&self, callout: &Block) -> Option<String> {
        let first = callout.children.first()?;
        let joined = self
            .text(first)
            .lines()
            .map(|line| line.trim_start().trim_start_matches('>').trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let body = CALLOUT_MARKERS
            .iter()
            .find_map(|(marker, _)| joined.strip_prefix(marker))
            .unwrap_or(&joined);
        Some(body.trim().to_string())
    }
}

/// Anchor id for a heading, in the `lower_snake` form the docs use.
fn heading_id(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn block_kind(tag: &Tag<'_>) -> Option<BlockKind> {
    let kind = match tag {
        Tag::Paragraph => BlockKind::Paragraph,
        Tag::Heading { level, .. } => BlockKind::Heading(*level as u8),
        Tag::BlockQuote(_) => BlockKind::BlockQuote,
        Tag::CodeBlock(CodeBlockKind::Fenced(info)) => BlockKind::Code {
            lang: info.split_whitespace().next().unwrap_or("").to_string(),
        },
        Tag::CodeBlock(CodeBlockKind::Indented) => BlockKind::Code {
            lang: String::new(),
        },
        Tag::List(start) => BlockKind::List {
            ordered: start.is_some(),
        },
        Tag::Item => BlockKind::Item,
        Tag::HtmlBlock => BlockKind::Html,
        Tag::Table(_) => BlockKind::Table,
        Tag::FootnoteDefinition(_)
        | Tag::DefinitionList
        | Tag::DefinitionListTitle
        | Tag::DefinitionListDefinition
        | Tag::MetadataBlock(_) => BlockKind::Other,
        _ => return None,
    };
    Some(kind)
}

fn is_block_end(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::CodeBlock
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::HtmlBlock
            | TagEnd::Table
            | TagEnd::FootnoteDefinition
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::MetadataBlock(_)
    )
}

struct Open {
    block: Block,
    /// Paragraph synthesized for inline content of a tight list item
    implicit: bool,
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Open>,
    roots: Vec<Block>,
}

impl TreeBuilder {
    fn open(&mut self, kind: BlockKind, range: Range<usize>, implicit: bool) {
        self.stack.push(Open {
            block: Block::new(kind, range),
            implicit,
        });
    }

    fn close(&mut self) {
        if let Some(open) = self.stack.pop() {
            match self.stack.last_mut() {
                Some(parent) => parent.block.children.push(open.block),
                None => self.roots.push(open.block),
            }
        }
    }

    fn close_implicit(&mut self) {
        if self.stack.last().is_some_and(|o| o.implicit) {
            self.close();
        }
    }

    fn inline(&mut self, text: Option<&str>, range: Range<usize>) {
        if self
            .stack
            .last()
            .is_some_and(|o| o.block.kind == BlockKind::Item)
        {
            self.open(BlockKind::Paragraph, range.clone(), true);
        }
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        if top.implicit {
            top.block.range.end = top.block.range.end.max(range.end);
        }
        if let Some(text) = text {
            match top.block.kind {
                BlockKind::Paragraph
                | BlockKind::Heading(_)
                | BlockKind::Code { .. }
                | BlockKind::Html => top.block.text.push_str(text),
                _ => {}
            }
        }
    }
}

fn parse_blocks(source: &str) -> Vec<Block> {
    let mut builder = TreeBuilder::default();
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;

    for (event, range) in Parser::new_ext(source, options).into_offset_iter() {
        match event {
            Event::Start(tag) => match block_kind(&tag) {
                Some(kind) => {
                    builder.close_implicit();
                    builder.open(kind, range, false);
                }
                None => builder.inline(None, range),
            },
            Event::End(end) => {
                if is_block_end(&end) {
                    builder.close_implicit();
                    builder.close();
                }
            }
            Event::Text(text) | Event::Code(text) | Event::Html(text) | Event::InlineHtml(text) => {
                builder.inline(Some(&*text), range)
            }
            Event::SoftBreak | Event::HardBreak => builder.inline(Some(" "), range),
            Event::Rule => {
                builder.close_implicit();
                builder.open(BlockKind::Rule, range, false);
                builder.close();
            }
            _ => builder.inline(None, range),
        }
    }
    while !builder.stack.is_empty() {
        builder.close();
    }
    builder.roots
}

fn transform(block: Block, source: &str) -> Block {
    let block = match block.kind {
        BlockKind::List { ordered: false } if is_description_list(&block, source) => {
            as_description_list(block)
        }
        BlockKind::BlockQuote => match callout_kind(&block, source) {
            Some(kind) => Block {
                kind: BlockKind::Callout(kind),
                ..block
            },
            None => block,
        },
        _ => block,
    };
    Block {
        children: block
            .children
            .into_iter()
            .map(|c| transform(c, source))
            .collect(),
        ..block
    }
}

fn is_description_list(list: &Block, source: &str) -> bool {
    list.children.iter().all(|item| {
        if item.children.len() < 2 {
            return false;
        }
        let Some(definition) = item.children.last() else {
            return false;
        };
        matches!(definition.kind, BlockKind::List { .. })
            && definition.children.len() == 1
            && definition.children[0].children.first().is_some_and(|p| {
                p.kind == BlockKind::Paragraph
                    && source[p.range.clone()].starts_with(DEFINITION_PREFIX)
            })
    })
}

fn as_description_list(list: Block) -> Block {
    let mut children = Vec::with_capacity(list.children.len() * 2);
    for mut item in list.children {
        let Some(mut definition) = item.children.pop() else {
            continue;
        };
        let term_range = item
            .children
            .first()
            .map(|b| b.range.clone())
            .unwrap_or(item.range.clone());
        children.push(Block {
            kind: BlockKind::Term,
            range: term_range,
            children: item.children,
            text: String::new(),
        });
        let details = definition.children.pop().map(|i| i.children).unwrap_or_default();
        children.push(Block {
            kind: BlockKind::Details,
            range: definition.range,
            children: details,
            text: String::new(),
        });
    }
    Block {
        kind: BlockKind::DescriptionList,
        range: list.range,
        children,
        text: String::new(),
    }
}

fn callout_kind(quote: &Block, source: &str) -> Option<CalloutKind> {
    let first = quote
        .children
        .first()
        .filter(|p| p.kind == BlockKind::Paragraph)?;
    let text = &source[first.range.clone()];
    CALLOUT_MARKERS
        .iter()
        .find(|(marker, _)| text.starts_with(marker))
        .map(|(_, kind)| *kind)
}
