//! Entry points that configure a [`FormatProcessor`] for one use case and drive it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nova_core::{TextRange, TextSize};
use nova_scheduler::{run_to_completion, CancellationToken, SequentialTask};

use crate::chain::{ChainBuilder, LeafChain};
use crate::model::FormattingModel;
use crate::ranges::{self, FormatTextRanges};
use crate::{CodeStyleSettings, FormatError, FormatProcessor, IndentInfo};

/// Counts the formatting operations in progress. Hosts consult it to suppress reentrant
/// formatting (format-on-type reacting to the formatter's own edits, for example).
#[derive(Debug, Default)]
pub struct FormatterState {
    disabled: AtomicUsize,
}

impl FormatterState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Disable formatting until the returned guard is dropped. Guards nest.
    pub fn disable_formatting(self: &Arc<Self>) -> FormattingDisabled {
        self.disabled.fetch_add(1, Ordering::SeqCst);
        FormattingDisabled {
            state: Arc::clone(self),
        }
    }

    pub fn is_formatting_disabled(&self) -> bool {
        self.depth() > 0
    }

    pub fn depth(&self) -> usize {
        self.disabled.load(Ordering::SeqCst)
    }

    fn enable_formatting(&self) {
        let released = self
            .disabled
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| {
                depth.checked_sub(1)
            });
        if released.is_err() {
            tracing::error!(
                target = "nova.format",
                "formatting re-enabled more often than it was disabled"
            );
            debug_assert!(false, "unbalanced formatting guard");
        }
    }
}

/// Scoped "formatting in progress" marker; see [`FormatterState::disable_formatting`].
#[derive(Debug)]
#[must_use = "formatting is re-enabled as soon as the guard is dropped"]
pub struct FormattingDisabled {
    state: Arc<FormatterState>,
}

impl Drop for FormattingDisabled {
    fn drop(&mut self) {
        self.state.enable_formatting();
    }
}

/// Result of a mutating facade call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormatOutcome {
    /// Whitespaces rewritten in the document.
    pub changed_whitespaces: usize,
    /// The run observed its cancellation token; writes made before that point stay.
    pub cancelled: bool,
}

/// The formatting facade: one value per style configuration.
///
/// Every operation validates the model first and returns
/// [`FormatError::ModelInconsistency`] without touching the document when the block tree and
/// the document disagree.
#[derive(Clone, Debug)]
pub struct Formatter {
    settings: CodeStyleSettings,
    state: Arc<FormatterState>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            settings: CodeStyleSettings::default(),
            state: FormatterState::new(),
        }
    }
}

impl Formatter {
    pub fn new(settings: CodeStyleSettings) -> Result<Self, FormatError> {
        Self::with_state(settings, FormatterState::new())
    }

    /// A formatter sharing its reentrancy counter with other formatters of the same host.
    pub fn with_state(
        settings: CodeStyleSettings,
        state: Arc<FormatterState>,
    ) -> Result<Self, FormatError> {
        settings.validate()?;
        Ok(Self { settings, state })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, FormatError> {
        Self::new(CodeStyleSettings::from_toml_str(text)?)
    }

    pub fn settings(&self) -> &CodeStyleSettings {
        &self.settings
    }

    pub fn state(&self) -> &Arc<FormatterState> {
        &self.state
    }

    /// Reformat every whitespace of the model.
    pub fn format_whole_model(
        &self,
        model: &mut dyn FormattingModel,
    ) -> Result<FormatOutcome, FormatError> {
        let _guard = self.state.disable_formatting();
        let chain = self.build_chain(model, None)?;
        self.run(
            FormatProcessor::with_model(chain, self.settings.clone(), model),
            &CancellationToken::new(),
        )
    }

    /// Reformat only the whitespace inside `ranges`.
    pub fn format_ranges(
        &self,
        model: &mut dyn FormattingModel,
        ranges: &FormatTextRanges,
    ) -> Result<FormatOutcome, FormatError> {
        self.format_ranges_with_token(model, ranges, &CancellationToken::new())
    }

    /// [`format_ranges`](Self::format_ranges), checking `token` between iterations.
    pub fn format_ranges_with_token(
        &self,
        model: &mut dyn FormattingModel,
        ranges: &FormatTextRanges,
        token: &CancellationToken,
    ) -> Result<FormatOutcome, FormatError> {
        let _guard = self.state.disable_formatting();
        let mut chain = self.build_chain(model, None)?;
        ranges::mark_outside_ranges(&mut chain, ranges);
        self.run(
            FormatProcessor::with_model(chain, self.settings.clone(), model),
            token,
        )
    }

    /// Recompute the indentation of lines starting inside `range`, keeping every line break.
    pub fn adjust_indent_for_range(
        &self,
        model: &mut dyn FormattingModel,
        range: TextRange,
    ) -> Result<FormatOutcome, FormatError> {
        let _guard = self.state.disable_formatting();
        let mut chain = self.build_chain(model, None)?;
        ranges::mark_for_indent_adjustment(&mut chain, range);
        self.run(
            FormatProcessor::with_model(chain, self.settings.clone(), model),
            &CancellationToken::new(),
        )
    }

    /// The indent a line break typed at `offset` would receive. Nothing is written.
    pub fn compute_indent_for_offset(
        &self,
        model: &dyn FormattingModel,
        offset: TextSize,
    ) -> Result<IndentInfo, FormatError> {
        let _guard = self.state.disable_formatting();
        if offset > model.document().text_len() {
            return Err(FormatError::InvalidOffset(offset));
        }
        let mut chain = self.build_chain(model, Some(offset))?;
        let target = match chain.probe().map(|probe| probe.whitespace) {
            Some(target) => {
                ranges::mark_for_whitespace(&mut chain, target);
                target
            }
            None => ranges::mark_for_offset(&mut chain, offset)
                .ok_or(FormatError::InvalidOffset(offset))?,
        };
        self.preview(chain, target, true)
            .ok_or(FormatError::InvalidOffset(offset))
    }

    /// The indent the existing line `line` (zero-based) should have. `None` when the line starts
    /// inside a multi-line token.
    pub fn line_indent(
        &self,
        model: &dyn FormattingModel,
        line: u32,
    ) -> Result<Option<IndentInfo>, FormatError> {
        let _guard = self.state.disable_formatting();
        let document = model.document();
        let line_start = document
            .line_start_offset(line)
            .ok_or(FormatError::InvalidLine(line))?;
        let mut chain = self.build_chain(model, None)?;
        let Some(target) = chain.whitespace_at(line_start) else {
            return Ok(None);
        };

        let ws_end = chain.whitespaces()[target].range().end();
        let rest_of_gap = document
            .text_in(TextRange::new(line_start, ws_end))
            .unwrap_or_default();
        let token_on_line =
            target < chain.trailing_whitespace() && !rest_of_gap.contains(['\n', '\r']);
        if !token_on_line {
            return self.compute_indent_for_offset(model, line_start).map(Some);
        }

        ranges::mark_for_whitespace(&mut chain, target);
        Ok(self.preview(chain, target, false))
    }

    /// [`line_indent`](Self::line_indent) rendered with the configured tabs/spaces.
    pub fn line_indent_string(
        &self,
        model: &dyn FormattingModel,
        line: u32,
    ) -> Result<Option<String>, FormatError> {
        Ok(self
            .line_indent(model, line)?
            .map(|info| info.indent_string(&self.settings.indent)))
    }

    /// A prepared processor for `model`, for hosts that drive formatting themselves (for example
    /// with [`nova_scheduler::run_stepwise`]). Formatting stays disabled until it is dropped.
    pub fn processor<'m>(
        &self,
        model: &'m mut dyn FormattingModel,
        ranges: Option<&FormatTextRanges>,
    ) -> Result<FormatProcessor<'m>, FormatError> {
        let guard = self.state.disable_formatting();
        let mut chain = self.build_chain(model, None)?;
        if let Some(ranges) = ranges {
            ranges::mark_outside_ranges(&mut chain, ranges);
        }
        let mut processor = FormatProcessor::with_model(chain, self.settings.clone(), model);
        processor.hold(guard);
        Ok(processor)
    }

    fn build_chain(
        &self,
        model: &dyn FormattingModel,
        probe: Option<TextSize>,
    ) -> Result<LeafChain, FormatError> {
        validate(model)?;
        let mut builder = ChainBuilder::new(model.document());
        if let Some(offset) = probe {
            builder = builder.with_probe(offset);
        }
        builder.build(model.root_block())
    }

    fn preview(&self, chain: LeafChain, target: usize, force_line_feed: bool) -> Option<IndentInfo> {
        let mut processor = FormatProcessor::new(chain, self.settings.clone());
        if force_line_feed {
            processor.force_line_feed_at(target);
        }
        processor.prepare();
        while !processor.iteration() {}
        processor.indent_info(target)
    }

    fn run(
        &self,
        mut processor: FormatProcessor<'_>,
        token: &CancellationToken,
    ) -> Result<FormatOutcome, FormatError> {
        let cancelled = run_to_completion(&mut processor, token).is_err();
        if let Some(err) = processor.take_error() {
            return Err(err);
        }
        if cancelled {
            tracing::debug!(target = "nova.format", "formatting cancelled");
        }
        Ok(FormatOutcome {
            changed_whitespaces: processor.changes(),
            cancelled,
        })
    }
}

/// Check that the block tree still describes the document.
fn validate(model: &dyn FormattingModel) -> Result<(), FormatError> {
    let root = model.root_block();
    if !root.is_valid() {
        return Err(FormatError::ModelInconsistency(
            "the root block was built from an invalidated syntax tree".to_string(),
        ));
    }
    let document = model.document();
    let text_len = document.text_len();
    let range = root.text_range();
    if range.end() > text_len {
        return Err(FormatError::ModelInconsistency(format!(
            "block tree covers {range:?} but the document is {text_len:?} long"
        )));
    }
    let outside = [
        TextRange::up_to(range.start()),
        TextRange::new(range.end(), text_len),
    ];
    for gap in outside {
        let text = document.text_in(gap).ok_or_else(|| {
            FormatError::ModelInconsistency(format!("{gap:?} is not a valid document range"))
        })?;
        if !text.chars().all(char::is_whitespace) {
            return Err(FormatError::ModelInconsistency(format!(
                "document text at {gap:?} is not covered by the block tree"
            )));
        }
    }
    Ok(())
}
