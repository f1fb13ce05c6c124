//! Block trees for the integration tests: a token cursor for hand-built trees and a toy
//! brace language (`head { item; item; }`).
#![allow(dead_code)]

use nova_core::{TextRange, TextSize};
use nova_format::{
    Block, ChildAttributes, CodeStyleSettings, FormatOutcome, Formatter, Indent, SimpleBlock,
    Spacing, TextFormattingModel,
};

pub fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::from(start), TextSize::from(end))
}

/// Hands out leaf blocks for tokens of `text`, searching left to right.
pub struct Tokens<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }

    pub fn leaf(&mut self, token: &str) -> SimpleBlock {
        let found = self.text[self.cursor..]
            .find(token)
            .unwrap_or_else(|| panic!("token {token:?} not found after offset {}", self.cursor));
        let start = self.cursor + found;
        self.cursor = start + token.len();
        SimpleBlock::leaf(range(start as u32, self.cursor as u32))
    }
}

/// A composite spanning its children.
pub fn node(children: Vec<SimpleBlock>) -> SimpleBlock {
    let start = children
        .first()
        .expect("composite blocks need children")
        .text_range()
        .start();
    let end = children
        .last()
        .expect("composite blocks need children")
        .text_range()
        .end();
    SimpleBlock::new(TextRange::new(start, end)).with_children(children)
}

pub fn format_with(text: &str, root: SimpleBlock, settings: CodeStyleSettings) -> String {
    let mut model = TextFormattingModel::new(text, root);
    Formatter::new(settings)
        .unwrap()
        .format_whole_model(&mut model)
        .unwrap();
    model.into_text()
}

/// Format `text` as brace-language source with default settings.
pub fn format_braces(text: &str) -> (String, FormatOutcome) {
    let mut model = TextFormattingModel::new(text, brace_tree(text));
    let outcome = Formatter::default()
        .format_whole_model(&mut model)
        .unwrap();
    (model.into_text(), outcome)
}

/// The block tree of a brace-language document.
///
/// Statements end with `;`, `head { ... }` opens an indented body, and a stray `}` is a
/// statement on its own. Tokens in a statement are separated by one space, items by line feeds.
pub fn brace_tree(text: &str) -> SimpleBlock {
    let tokens: Vec<(TextRange, &str)> = tokenize(text)
        .into_iter()
        .map(|token| (token, &text[usize::from(token.start())..usize::from(token.end())]))
        .collect();
    let mut pos = 0;
    let items = parse_items(&tokens, &mut pos, false);
    SimpleBlock::new(range(0, text.len() as u32))
        .with_spacing(Spacing::line_feed(1))
        .with_children(items)
}

/// Byte ranges of the brace-language tokens of `text`. Every token becomes one leaf.
pub fn tokenize(text: &str) -> Vec<TextRange> {
    let mut tokens = Vec::new();
    let mut word_start = None;
    for (offset, ch) in text.char_indices() {
        let single = matches!(ch, '{' | '}' | ';');
        if ch.is_whitespace() || single {
            if let Some(start) = word_start.take() {
                tokens.push(range(start as u32, offset as u32));
            }
            if single {
                tokens.push(range(offset as u32, (offset + 1) as u32));
            }
        } else if word_start.is_none() {
            word_start = Some(offset);
        }
    }
    if let Some(start) = word_start {
        tokens.push(range(start as u32, text.len() as u32));
    }
    tokens
}

fn parse_items(tokens: &[(TextRange, &str)], pos: &mut usize, nested: bool) -> Vec<SimpleBlock> {
    let mut items = Vec::new();
    while let Some(&(token, text)) = tokens.get(*pos) {
        if text == "}" {
            if nested {
                break;
            }
            items.push(SimpleBlock::leaf(token));
            *pos += 1;
            continue;
        }
        items.push(parse_item(tokens, pos));
    }
    items
}

fn parse_item(tokens: &[(TextRange, &str)], pos: &mut usize) -> SimpleBlock {
    let mut children = Vec::new();
    let mut terminated = false;
    while let Some(&(token, text)) = tokens.get(*pos) {
        match text {
            "}" => break,
            ";" => {
                children.push(SimpleBlock::leaf(token));
                *pos += 1;
                terminated = true;
                break;
            }
            "{" => {
                children.push(SimpleBlock::leaf(token));
                *pos += 1;
                let open = children.len() - 1;
                let body = parse_items(tokens, pos, true);
                if !body.is_empty() {
                    children.push(
                        node(body)
                            .with_indent(Indent::normal())
                            .with_spacing(Spacing::line_feed(1)),
                    );
                }
                if let Some(&(close, "}")) = tokens.get(*pos) {
                    children.push(SimpleBlock::leaf(close));
                    *pos += 1;
                }
                let count = children.len();
                let mut block = node(children)
                    .with_spacing(Spacing::spaces(1))
                    .with_child_attributes(ChildAttributes::new(Some(Indent::normal()), None));
                for index in (open + 1)..count {
                    block = block.with_spacing_before(index, Some(Spacing::line_feed(0)));
                }
                return block;
            }
            _ => {
                children.push(SimpleBlock::leaf(token));
                *pos += 1;
            }
        }
    }
    let count = children.len();
    let mut statement = node(children).with_spacing(Spacing::spaces(1));
    if terminated && count > 1 {
        statement = statement.with_spacing_before(count - 1, Some(Spacing::spaces(0)));
    }
    statement
}
