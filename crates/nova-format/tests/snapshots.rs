mod support;

use insta::assert_snapshot;
use nova_core::apply_text_edits;
use nova_format::{FormatTextRanges, Formatter, TextFormattingModel};
use pretty_assertions::assert_eq;
use support::{brace_tree, format_braces, range};

#[test]
fn formats_nested_blocks() {
    let input = "class  A{foo;\n\n\n\n  bar  baz;inner{x;}\n}";
    let (formatted, _) = format_braces(input);

    assert_snapshot!(
        formatted,
        @r###"
class A {
    foo;

    bar baz;
    inner {
        x;
    }
}
"###
    );
}

#[test]
fn formats_unbalanced_input_best_effort() {
    let (formatted, _) = format_braces("a{b{c;");

    assert_snapshot!(
        formatted,
        @r###"
a {
    b {
        c;
"###
    );
}

#[test]
fn keeps_one_blank_line_between_top_level_items() {
    let (formatted, outcome) = format_braces("x;\n\n\n\n\ny;z;");

    assert_snapshot!(
        formatted,
        @r###"
x;

y;
z;
"###
    );
    assert_eq!(outcome.changed_whitespaces, 2);
}

#[test]
fn crlf_documents_are_formatted_with_crlf() {
    let (formatted, _) = format_braces("a{\r\nb;c;}");
    assert_eq!(formatted, "a {\r\n    b;\r\n    c;\r\n}");
}

#[test]
fn range_formatting_produces_minimal_edits() {
    let input = "a{b;    c;}\nd  e;";
    let mut model = TextFormattingModel::new(input, brace_tree(input));
    // Covers `b;    c;`. The empty gaps at both ends of the range are inside it as well.
    Formatter::default()
        .format_ranges(&mut model, &FormatTextRanges::single(range(2, 10)))
        .unwrap();

    assert_snapshot!(
        model.text(),
        @r###"
a{
    b;
    c;
}
d  e;
"###
    );
    assert_eq!(apply_text_edits(input, model.edits()).unwrap(), model.text());
}
