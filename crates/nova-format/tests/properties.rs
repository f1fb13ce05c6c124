mod support;

use nova_core::TextRange;
use nova_format::{
    Alignment, CodeStyleSettings, FormatTextRanges, Formatter, Spacing, TextFormattingModel,
};
use proptest::prelude::*;
use support::{brace_tree, format_braces, format_with, node, range, tokenize, Tokens};

const MAX_FRAGMENTS: usize = 96;

fn whitespace_fragment() -> impl Strategy<Value = String> {
    const WHITESPACE: &[&str] = &[
        "", " ", "  ", "\t", "\n", "\n\n", "\n\n\n\n", "\r\n", " \n  ", "\n\t",
    ];
    proptest::sample::select(WHITESPACE).prop_map(ToString::to_string)
}

fn token_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => proptest::string::string_regex(r"[a-z][a-z0-9_]{0,7}").unwrap(),
        2 => Just(";".to_string()),
        2 => Just("{".to_string()),
        2 => Just("}".to_string()),
    ]
}

/// Brace-language source, balanced or not.
fn brace_source() -> impl Strategy<Value = String> {
    proptest::collection::vec((whitespace_fragment(), token_fragment()), 1..MAX_FRAGMENTS)
        .prop_flat_map(|pairs| {
            whitespace_fragment().prop_map(move |tail| {
                let mut out = String::new();
                for (ws, token) in &pairs {
                    out.push_str(ws);
                    out.push_str(token);
                }
                out.push_str(&tail);
                out
            })
        })
}

fn source_and_range() -> impl Strategy<Value = (String, TextRange)> {
    brace_source().prop_flat_map(|text| {
        let len = text.len() as u32;
        (0..=len, 0..=len).prop_map(move |(a, b)| (text.clone(), range(a.min(b), a.max(b))))
    })
}

fn tokens_of(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// The gaps around the brace-language tokens of `text`, leading and trailing gap included.
fn gaps(text: &str) -> Vec<(TextRange, &str)> {
    let mut gaps = Vec::new();
    let mut prev = 0;
    for token in tokenize(text) {
        let start = usize::from(token.start());
        gaps.push((range(prev as u32, start as u32), &text[prev..start]));
        prev = usize::from(token.end());
    }
    gaps.push((range(prev as u32, text.len() as u32), &text[prev..]));
    gaps
}

/// Neither inside `requested` nor overlapping it.
fn is_outside(gap: TextRange, requested: TextRange) -> bool {
    let overlaps = gap.start() < requested.end() && requested.start() < gap.end();
    !requested.contains_range(gap) && !overlaps
}

fn spacing_gap() -> impl Strategy<Value = String> {
    const PARTS: &[&str] = &[" ", "\t", "\n"];
    proptest::collection::vec(proptest::sample::select(PARTS), 0..6)
        .prop_map(|parts| parts.concat())
}

/// Column reached after `text` starting at `column`, with the default tab size of 4.
fn end_column(column: u32, text: &str) -> u32 {
    text.chars().fold(column, |column, ch| match ch {
        '\t' => column + 4 - column % 4,
        _ => column + 1,
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn formatting_is_idempotent(input in brace_source()) {
        let (first, _) = format_braces(&input);
        let (second, outcome) = format_braces(&first);
        prop_assert_eq!(&second, &first);
        prop_assert_eq!(outcome.changed_whitespaces, 0);
    }

    #[test]
    fn formatting_only_changes_whitespace(input in brace_source()) {
        let (formatted, _) = format_braces(&input);
        prop_assert_eq!(tokens_of(&formatted), tokens_of(&input));
    }

    #[test]
    fn whitespace_outside_the_range_is_untouched((input, requested) in source_and_range()) {
        let mut model = TextFormattingModel::new(input.as_str(), brace_tree(&input));
        Formatter::default()
            .format_ranges(&mut model, &FormatTextRanges::single(requested))
            .unwrap();
        prop_assert_eq!(tokens_of(model.text()), tokens_of(&input));

        let before = gaps(&input);
        let after = gaps(model.text());
        prop_assert_eq!(before.len(), after.len());
        for ((gap, original), (_, formatted)) in before.iter().zip(&after) {
            if is_outside(*gap, requested) {
                prop_assert_eq!(original, formatted, "gap {:?} is outside {:?}", gap, requested);
            }
        }
        for edit in model.edits() {
            prop_assert!(
                !is_outside(edit.range, requested),
                "edit {:?} is away from {:?}",
                edit.range,
                requested
            );
        }
    }

    #[test]
    fn resolved_gaps_respect_their_spacing_rule(
        gap in spacing_gap(),
        min_spaces in 0u32..4,
        max_spaces in 0u32..6,
        min_line_feeds in 0u32..3,
        keep_line_breaks in any::<bool>(),
        keep_blank_lines in 0u32..3,
    ) {
        let text = format!("a{gap}b");
        let mut tokens = Tokens::new(&text);
        let spacing = Spacing::create(
            min_spaces,
            max_spaces,
            min_line_feeds,
            keep_line_breaks,
            keep_blank_lines,
        );
        let root = node(vec![tokens.leaf("a"), tokens.leaf("b")]).with_spacing(spacing);
        let formatted = format_with(&text, root, CodeStyleSettings::default());

        let resolved = &formatted[1..formatted.len() - 1];
        let line_feeds = resolved.matches('\n').count() as u32;
        prop_assert!(line_feeds >= min_line_feeds, "{:?} -> {:?}", gap, resolved);
        prop_assert!(line_feeds <= (keep_blank_lines + 1).max(min_line_feeds));
        if !keep_line_breaks {
            prop_assert_eq!(line_feeds, min_line_feeds);
        }
        if line_feeds == 0 {
            // `min_spaces` wins when it exceeds `max_spaces`.
            let width = end_column(1, resolved) - 1;
            prop_assert!(width >= min_spaces, "{:?} -> {:?}", gap, resolved);
            prop_assert!(width <= max_spaces.max(min_spaces), "{:?} -> {:?}", gap, resolved);
        }
    }

    #[test]
    fn alignment_members_share_the_rightmost_column(
        lines in proptest::collection::vec((1usize..7, 0usize..4), 2..6),
    ) {
        let text = lines
            .iter()
            .map(|&(key, pad)| format!("{}{}= v", "k".repeat(key), " ".repeat(pad)))
            .collect::<Vec<_>>()
            .join("\n");
        let group = Alignment::new();
        let mut tokens = Tokens::new(&text);
        let members = lines
            .iter()
            .map(|&(key, _)| {
                node(vec![
                    tokens.leaf(&"k".repeat(key)),
                    tokens.leaf("=").with_alignment(group.clone()),
                    tokens.leaf("v"),
                ])
                .with_spacing(Spacing::spaces(1))
            })
            .collect();
        let root = node(members).with_spacing(Spacing::line_feed(0));
        let formatted = format_with(&text, root, CodeStyleSettings::default());

        let widest = lines.iter().map(|&(key, _)| key).max().unwrap_or_default();
        let columns: Vec<Option<usize>> = formatted.lines().map(|line| line.find('=')).collect();
        prop_assert_eq!(columns, vec![Some(widest + 1); lines.len()], "{}", formatted);
    }

    #[test]
    fn empty_ranges_write_nothing(input in brace_source()) {
        let mut model = TextFormattingModel::new(input.as_str(), brace_tree(&input));
        let outcome = Formatter::default()
            .format_ranges(&mut model, &FormatTextRanges::new())
            .unwrap();
        prop_assert_eq!(outcome.changed_whitespaces, 0);
        prop_assert_eq!(model.text(), input.as_str());
    }
}

#[test]
fn unbalanced_braces_are_formatted_best_effort() {
    let (formatted, _) = format_braces("a {b;\n}\n}  c {");
    assert_eq!(formatted, "a {\n    b;\n}\n}\nc {");
}
