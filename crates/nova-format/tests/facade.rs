mod support;

use std::sync::Arc;

use nova_core::TextSize;
use nova_format::{
    CodeStyleSettings, FormatError, FormatTextRanges, Formatter, FormatterState, IndentInfo,
    ProcessorState, SimpleBlock, Spacing, TextFormattingModel,
};
use nova_scheduler::{
    run_stepwise, CancellationToken, ProgressEvent, ProgressSender, StepwiseOptions, TaskError,
};
use pretty_assertions::assert_eq;
use support::{brace_tree, range};

const CLASS: &str = "class A {\n    foo;\n}";

fn brace_model(text: &str) -> TextFormattingModel {
    TextFormattingModel::new(text, brace_tree(text))
}

#[test]
fn indent_for_a_new_line_inside_a_body() {
    let model = brace_model(CLASS);
    let formatter = Formatter::default();

    // Right after `{`: the new line would be the first child of the class body.
    let info = formatter
        .compute_indent_for_offset(&model, TextSize::from(9))
        .unwrap();
    assert_eq!(info, IndentInfo::new(1, 4, 0));

    // After the last token a new line belongs to the root.
    let info = formatter
        .compute_indent_for_offset(&model, TextSize::of(CLASS))
        .unwrap();
    assert_eq!(info, IndentInfo::new(1, 0, 0));

    // Nothing is written by a query.
    assert_eq!(model.text(), CLASS);
    assert!(model.edits().is_empty());
}

#[test]
fn indent_queries_reject_offsets_past_the_end() {
    let model = brace_model(CLASS);
    let err = Formatter::default()
        .compute_indent_for_offset(&model, TextSize::from(100))
        .unwrap_err();
    assert!(matches!(err, FormatError::InvalidOffset(offset) if offset == TextSize::from(100)));
}

#[test]
fn line_indent_reports_the_expected_indent_of_existing_lines() {
    let text = "class A {\nfoo;\n}";
    let model = brace_model(text);
    let formatter = Formatter::default();

    assert_eq!(
        formatter.line_indent(&model, 1).unwrap(),
        Some(IndentInfo::new(1, 4, 0))
    );
    assert_eq!(
        formatter.line_indent(&model, 2).unwrap(),
        Some(IndentInfo::new(1, 0, 0))
    );
    assert_eq!(
        formatter.line_indent_string(&model, 1).unwrap().as_deref(),
        Some("    ")
    );
    assert!(matches!(
        formatter.line_indent(&model, 7),
        Err(FormatError::InvalidLine(7))
    ));
    assert_eq!(model.text(), text);
}

#[test]
fn line_indent_string_uses_tabs_when_configured() {
    let model = brace_model(CLASS);
    let formatter = Formatter::from_toml_str("[indent]\nuse_tabs = true\n").unwrap();
    assert_eq!(
        formatter.line_indent_string(&model, 1).unwrap().as_deref(),
        Some("\t")
    );
}

#[test]
fn lines_starting_inside_a_multiline_token_have_no_indent() {
    let text = "/* a\n b */ x";
    let root = SimpleBlock::new(range(0, 12))
        .with_spacing(Spacing::spaces(1))
        .with_child(SimpleBlock::leaf(range(0, 10)))
        .with_child(SimpleBlock::leaf(range(11, 12)));
    let model = TextFormattingModel::new(text, root);
    assert_eq!(Formatter::default().line_indent(&model, 1).unwrap(), None);
}

#[test]
fn adjust_indent_keeps_line_breaks_and_inline_spacing() {
    let text = "class  A {\nfoo;\n      bar;\n}";
    let mut model = brace_model(text);
    let outcome = Formatter::default()
        .adjust_indent_for_range(&mut model, range(0, text.len() as u32))
        .unwrap();
    assert_eq!(model.text(), "class  A {\n    foo;\n    bar;\n}");
    assert_eq!(outcome.changed_whitespaces, 2);
}

#[test]
fn adjust_indent_only_touches_lines_starting_in_range() {
    let text = "class  A {\n    foo;\n      bar;\n  }";
    let mut model = brace_model(text);
    // `bar;` spans 26..30.
    Formatter::default()
        .adjust_indent_for_range(&mut model, range(26, 30))
        .unwrap();
    assert_eq!(model.text(), "class  A {\n    foo;\n    bar;\n  }");
}

#[test]
fn cancelled_formatting_leaves_the_document_alone() {
    let text = "class A{foo;bar;}";
    let mut model = brace_model(text);
    let token = CancellationToken::new();
    token.cancel();

    let outcome = Formatter::default()
        .format_ranges_with_token(&mut model, &FormatTextRanges::single(range(0, 17)), &token)
        .unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.changed_whitespaces, 0);
    assert_eq!(model.text(), text);
}

#[test]
fn formatting_is_disabled_while_an_operation_runs() {
    let state = FormatterState::new();
    let formatter = Formatter::with_state(CodeStyleSettings::default(), Arc::clone(&state)).unwrap();
    let mut model = brace_model("class A{foo;}");

    formatter.format_whole_model(&mut model).unwrap();
    assert!(!state.is_formatting_disabled());

    let processor = formatter.processor(&mut model, None).unwrap();
    assert!(state.is_formatting_disabled());
    assert!(format!("{processor:?}").contains("holds_guard: true"));
    drop(processor);
    assert_eq!(state.depth(), 0);
}

#[test]
fn settings_errors_surface_through_the_facade() {
    assert!(matches!(
        Formatter::from_toml_str("right_margin = 0"),
        Err(FormatError::Settings(_))
    ));
}

#[tokio::test]
async fn processor_can_be_driven_stepwise() {
    let text = "class A{foo;bar;}";
    let mut model = brace_model(text);
    let formatter = Formatter::default();
    let sender = ProgressSender::new(64);
    let mut events = sender.subscribe();
    let options = StepwiseOptions {
        title: "Formatting".to_string(),
        yield_every: 2,
        report_every: 4,
    };

    let mut processor = formatter.processor(&mut model, None).unwrap();
    assert_eq!(processor.state(), ProcessorState::NotStarted);
    run_stepwise(&mut processor, &CancellationToken::new(), Some(&sender), &options)
        .await
        .unwrap();
    assert_eq!(processor.state(), ProcessorState::Done);
    assert!(formatter.state().is_formatting_disabled());
    drop(processor);
    assert!(!formatter.state().is_formatting_disabled());

    assert_eq!(model.text(), "class A {\n    foo;\n    bar;\n}");

    let mut begun = false;
    let mut ended = false;
    while let Ok(event) = events.try_recv() {
        match event {
            ProgressEvent::Begin { title, .. } => begun = title == "Formatting",
            ProgressEvent::End { .. } => ended = true,
            ProgressEvent::Report { .. } => {}
        }
    }
    assert!(begun && ended);
}

#[tokio::test]
async fn stepwise_cancellation_stops_the_processor() {
    let mut model = brace_model("class A{foo;bar;}");
    let formatter = Formatter::default();
    let token = CancellationToken::new();
    token.cancel();

    let mut processor = formatter.processor(&mut model, None).unwrap();
    let result = run_stepwise(&mut processor, &token, None, &StepwiseOptions::default()).await;
    assert_eq!(result, Err(TaskError::Cancelled));
    assert_eq!(processor.state(), ProcessorState::Stopped);
    assert_eq!(processor.changes(), 0);
}
