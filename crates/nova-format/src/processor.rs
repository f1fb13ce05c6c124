//! The format processor: resolves every whitespace of a [`LeafChain`] and writes the results
//! back through a [`FormattingModel`].
//!
//! Processing happens in two phases. `Resolving` walks the chain in document order, one gap per
//! iteration, computing line feeds, indentation and spaces. Alignment and wrap decisions may
//! require earlier gaps to change; the processor then rolls back to that gap and replays from
//! there. Rollbacks only touch the processor's own state, never the document, and every
//! decision that triggers one is taken at most once, so resolution terminates. `Applying` then
//! writes each changed gap in document order.

use nova_core::TextRange;
use nova_scheduler::SequentialTask;

use crate::chain::{IndentProbe, LeafChain};
use crate::formatter::FormattingDisabled;
use crate::model::FormattingModel;
use crate::whitespace::{advance_column, count_line_feeds, first_line_end_column};
use crate::{CodeStyleSettings, FormatError, IndentInfo, Spacing, WrapKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessorState {
    NotStarted,
    Resolving,
    Applying,
    Done,
    /// Cancelled, or a write failed (see [`FormatProcessor::take_error`]).
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
    Verbatim,
    Computed(IndentInfo),
}

#[derive(Clone, Copy, Debug, Default)]
struct LeafLayout {
    start_column: u32,
    end_column: u32,
    end_line: u32,
    starts_line: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct WrapState {
    first_leaf: Option<usize>,
    wrapped_at: Option<usize>,
    chopped: bool,
}

#[derive(Clone, Copy, Debug)]
struct Anchor {
    leaf: usize,
    column: u32,
    line: u32,
    movable: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct AlignmentState {
    anchor: Option<Anchor>,
    /// Column the group was shifted to by a member further right. Survives rollbacks.
    target: Option<u32>,
}

enum Step {
    Next,
    Rollback(usize),
}

enum WrapDecision {
    Force(usize),
    Chop { wrap: usize, first_leaf: usize },
}

pub struct FormatProcessor<'m> {
    chain: LeafChain,
    settings: CodeStyleSettings,
    model: Option<&'m mut dyn FormattingModel>,
    state: ProcessorState,
    position: usize,
    results: Vec<Option<Resolution>>,
    layout: Vec<LeafLayout>,
    wrap_states: Vec<WrapState>,
    forced_wraps: Vec<bool>,
    alignment_states: Vec<AlignmentState>,
    forced_line_feed: Option<usize>,
    rollbacks_left: usize,
    apply_cursor: usize,
    shift: i64,
    changes: usize,
    error: Option<FormatError>,
    guard: Option<FormattingDisabled>,
}

impl<'m> FormatProcessor<'m> {
    /// A processor that only computes results ("without real modifications").
    pub fn new(chain: LeafChain, settings: CodeStyleSettings) -> Self {
        let leaves = chain.leaf_count();
        let wraps = chain.wraps.len();
        let alignments = chain.alignments.len();
        Self {
            chain,
            settings,
            model: None,
            state: ProcessorState::NotStarted,
            position: 0,
            results: vec![None; leaves + 1],
            layout: vec![LeafLayout::default(); leaves],
            wrap_states: vec![WrapState::default(); wraps],
            forced_wraps: vec![false; leaves],
            alignment_states: vec![AlignmentState::default(); alignments],
            forced_line_feed: None,
            rollbacks_left: 2 * leaves + 64,
            apply_cursor: 0,
            shift: 0,
            changes: 0,
            error: None,
            guard: None,
        }
    }

    /// A processor that writes changed whitespace into `model` once resolution is complete.
    pub fn with_model(
        chain: LeafChain,
        settings: CodeStyleSettings,
        model: &'m mut dyn FormattingModel,
    ) -> Self {
        let mut processor = Self::new(chain, settings);
        processor.model = Some(model);
        processor
    }

    /// Require at least one line feed in whitespace `index`, as if a line break had just been
    /// typed there.
    pub fn force_line_feed_at(&mut self, index: usize) {
        self.forced_line_feed = Some(index);
    }

    /// Keep formatting disabled until this processor is dropped.
    pub(crate) fn hold(&mut self, guard: FormattingDisabled) {
        self.guard = Some(guard);
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    pub fn chain(&self) -> &LeafChain {
        &self.chain
    }

    pub fn settings(&self) -> &CodeStyleSettings {
        &self.settings
    }

    /// Number of whitespaces written to the model so far.
    pub fn changes(&self) -> usize {
        self.changes
    }

    pub fn take_error(&mut self) -> Option<FormatError> {
        self.error.take()
    }

    /// The resolved shape of whitespace `index`. `None` until that gap has been resolved.
    pub fn indent_info(&self, index: usize) -> Option<IndentInfo> {
        match self.results.get(index).copied().flatten()? {
            Resolution::Computed(info) => Some(info),
            Resolution::Verbatim => Some(self.original_info(index)),
        }
    }

    /// The final text of whitespace `index`. `None` until that gap has been resolved.
    pub fn resolved_text(&self, index: usize) -> Option<String> {
        let ws = self.chain.whitespaces.get(index)?;
        match self.results[index]? {
            Resolution::Verbatim => Some(ws.original_text().to_string()),
            Resolution::Computed(info) => Some(self.text_for(index, &info)),
        }
    }

    /// The whole document as it reads after resolution, without touching any model.
    pub fn resolved_document(&self) -> Option<String> {
        let mut out = String::new();
        for (index, leaf) in self.chain.leaves.iter().enumerate() {
            out.push_str(&self.resolved_text(index)?);
            out.push_str(leaf.text());
        }
        out.push_str(&self.resolved_text(self.chain.trailing_whitespace())?);
        Some(out)
    }

    fn render(&self, info: &IndentInfo) -> String {
        info.render(&self.settings.indent, self.chain.line_separator())
    }

    /// Text for a computed gap. A same-line gap that already has the computed width keeps its
    /// original characters, tabs included.
    fn text_for(&self, index: usize, info: &IndentInfo) -> String {
        let ws = &self.chain.whitespaces[index];
        if index > 0
            && info.line_feeds == 0
            && !ws.contains_line_feeds()
            && *info == self.original_info(index)
        {
            return ws.original_text().to_string();
        }
        self.render(info)
    }

    fn original_info(&self, index: usize) -> IndentInfo {
        let ws = &self.chain.whitespaces[index];
        let text = ws.original_text();
        let tab_size = self.settings.indent.tab_size;
        match text.rfind(['\n', '\r']) {
            Some(pos) => IndentInfo::new(
                ws.original_line_feeds(),
                advance_column(0, &text[pos + 1..], tab_size),
                0,
            ),
            None => {
                let (prev_column, _) = self.previous_end(index);
                let width = advance_column(prev_column, text, tab_size) - prev_column;
                IndentInfo::new(0, 0, width)
            }
        }
    }

    fn previous_end(&self, index: usize) -> (u32, u32) {
        match index.checked_sub(1) {
            Some(prev) => (self.layout[prev].end_column, self.layout[prev].end_line),
            None => (0, 0),
        }
    }

    fn resolve_next(&mut self) {
        let index = self.position;
        if index == self.chain.trailing_whitespace() {
            let probe = self
                .chain
                .probe
                .as_ref()
                .filter(|probe| probe.whitespace == index && self.forced_line_feed == Some(index));
            let resolution = match probe {
                Some(probe) => {
                    let line_feeds = self.chain.whitespaces[index].original_line_feeds().max(1);
                    Resolution::Computed(IndentInfo::new(line_feeds, self.probe_column(probe), 0))
                }
                None => Resolution::Verbatim,
            };
            self.results[index] = Some(resolution);
            self.finish_resolving();
            return;
        }
        match self.resolve_whitespace(index) {
            Step::Next => self.position += 1,
            Step::Rollback(to) => self.rollback(to),
        }
    }

    fn resolve_whitespace(&mut self, index: usize) -> Step {
        let ws = &self.chain.whitespaces[index];
        let verbatim = ws.is_read_only() || ws.spacing().is_some_and(Spacing::is_read_only);
        let line_feeds_fixed = ws.are_line_feeds_read_only();
        let (prev_column, prev_line) = self.previous_end(index);

        for &wrap in &self.chain.leaves[index].wraps {
            self.wrap_states[wrap].first_leaf.get_or_insert(index);
        }

        let mut resolution = if verbatim {
            Resolution::Verbatim
        } else {
            let mut line_feeds = self.line_feeds(index);
            if line_feeds == 0 && index > 0 && !line_feeds_fixed && self.wants_wrap(index) {
                line_feeds = 1;
            }
            if self.forced_line_feed == Some(index) {
                line_feeds = line_feeds.max(1);
            }
            let info = if line_feeds > 0 || index == 0 {
                IndentInfo::new(line_feeds, self.indent_column(index), 0)
            } else {
                IndentInfo::new(0, 0, self.spaces(index, prev_column))
            };
            Resolution::Computed(info)
        };

        match self.align(index, resolution, prev_column, prev_line) {
            Ok(aligned) => resolution = aligned,
            Err(anchor) => return Step::Rollback(anchor),
        }

        let info = match resolution {
            Resolution::Computed(info) => info,
            Resolution::Verbatim => self.original_info(index),
        };
        let starts_line = index == 0 || info.line_feeds > 0;
        let start_column = if starts_line {
            info.column()
        } else {
            prev_column + info.spaces
        };
        let start_line = prev_line + info.line_feeds;
        let leaf_text = self.chain.leaves[index].text();
        let tab_size = self.settings.indent.tab_size;
        let first_line_end = first_line_end_column(start_column, leaf_text, tab_size);
        self.layout[index] = LeafLayout {
            start_column,
            end_column: advance_column(start_column, leaf_text, tab_size),
            end_line: start_line + count_line_feeds(leaf_text),
            starts_line,
        };
        self.results[index] = Some(resolution);

        tracing::trace!(
            target = "nova.format",
            whitespace = index,
            ?resolution,
            column = start_column,
            "resolved whitespace"
        );

        if info.line_feeds > 0 {
            for &wrap in &self.chain.leaves[index].wraps {
                self.wrap_states[wrap].wrapped_at.get_or_insert(index);
            }
        }

        if first_line_end > self.settings.right_margin {
            if let Some(decision) = self.find_wrap_point(index) {
                if self.take_rollback() {
                    return Step::Rollback(self.commit_wrap(decision));
                }
            }
        }
        Step::Next
    }

    fn line_feeds(&self, index: usize) -> u32 {
        let ws = &self.chain.whitespaces[index];
        let original = ws.original_line_feeds();
        if ws.are_line_feeds_read_only() {
            return original;
        }
        let Some(spacing) = ws.spacing() else {
            return original.min(self.settings.keep_blank_lines_in_code + 1);
        };
        let rule = spacing.rule();
        let max_line_feeds = rule
            .keep_blank_lines
            .unwrap_or(self.settings.keep_blank_lines_in_code)
            + 1;
        let multiline = spacing
            .dependency()
            .is_some_and(|range| self.dependency_is_multiline(range, index));
        let min = spacing.min_line_feeds(multiline);
        let kept = if rule.keep_line_breaks && self.settings.keep_line_breaks {
            original.min(max_line_feeds)
        } else {
            0
        };
        let line_feeds = min.max(kept);
        if line_feeds == 0 {
            return 0;
        }
        line_feeds
            .max(rule.preferred_line_feeds)
            .min(max_line_feeds)
            .max(min)
    }

    /// Whether `range` renders on several lines, judged by the gaps resolved so far. Gaps at or
    /// after `current` are not resolved yet and count as single-line.
    fn dependency_is_multiline(&self, range: TextRange, current: usize) -> bool {
        let leaves = &self.chain.leaves;
        let first = leaves.partition_point(|leaf| leaf.range.end() <= range.start());
        let end = leaves.partition_point(|leaf| leaf.range.start() < range.end());
        if first >= end {
            return false;
        }
        if leaves[first..end].iter().any(|leaf| leaf.is_multiline()) {
            return true;
        }
        ((first + 1)..end)
            .filter(|&ws| ws < current)
            .any(|ws| self.indent_info(ws).is_some_and(|info| info.line_feeds > 0))
    }

    fn spaces(&self, index: usize, prev_column: u32) -> u32 {
        let ws = &self.chain.whitespaces[index];
        let width = (!ws.contains_line_feeds()).then(|| {
            advance_column(prev_column, ws.original_text(), self.settings.indent.tab_size)
                - prev_column
        });
        let Some(spacing) = ws.spacing() else {
            return width.unwrap_or(0);
        };
        let rule = spacing.rule();
        let mut spaces = rule.clamp_spaces(width.unwrap_or(rule.min_spaces));
        if rule.safe && spaces == 0 && !ws.original_text().is_empty() {
            spaces = 1;
        }
        spaces
    }

    /// Column of leaf `index` when it starts a line.
    fn indent_column(&self, index: usize) -> u32 {
        if self.forced_line_feed == Some(index) {
            if let Some(probe) = self.chain.probe.as_ref().filter(|p| p.whitespace == index) {
                return self.probe_column(probe);
            }
        }

        let ws = &self.chain.whitespaces[index];
        let keep_first_column = ws
            .spacing()
            .is_some_and(|spacing| spacing.rule().keep_first_column);
        if keep_first_column && ws.contains_line_feeds() {
            let text = ws.original_text();
            let after_break = text.rfind(['\n', '\r']).map_or(text, |pos| &text[pos + 1..]);
            if after_break.is_empty() {
                return 0;
            }
        }

        let options = &self.settings.indent;
        let leaf = &self.chain.leaves[index];
        let mut own = 0;
        for &block in &leaf.starting_blocks {
            let node = &self.chain.nodes[block];
            if let Some(indent) = node.indent {
                own += indent.columns(options, node.first_of_indent_run);
                if indent.is_absolute(options) {
                    return own;
                }
            }
        }

        let outermost = leaf.outermost_starting_block();
        let Some(parent) = self.chain.nodes[outermost].parent else {
            return own;
        };
        let relative = self.chain.nodes[outermost]
            .indent
            .is_some_and(|indent| indent.relative_to_direct_parent);
        let base = if relative {
            self.block_start_column(parent)
        } else {
            self.base_column(parent)
        };
        base + own
    }

    /// Column of a child that would be inserted at the probed gap.
    fn probe_column(&self, probe: &IndentProbe) -> u32 {
        let options = &self.settings.indent;
        if let Some(column) = probe.alignment.and_then(|a| self.alignment_column(a)) {
            return column;
        }
        let own = probe.indent.map_or(0, |indent| indent.columns(options, false));
        match probe.indent {
            Some(indent) if indent.is_absolute(options) => own,
            Some(indent) if indent.relative_to_direct_parent => {
                self.block_start_column(probe.parent) + own
            }
            _ => self.base_column(probe.parent) + own,
        }
    }

    /// Column the children of `block` measure their indent from.
    fn base_column(&self, block: usize) -> u32 {
        let node = &self.chain.nodes[block];
        let Some(parent) = node.parent else {
            return self.block_start_column(block);
        };
        if self.layout[node.first_leaf].starts_line {
            return self.block_start_column(block);
        }
        let enforced = node
            .indent
            .filter(|indent| indent.enforce_indent_to_children)
            .map_or(0, |indent| {
                indent.columns(&self.settings.indent, node.first_of_indent_run)
            });
        self.base_column(parent) + enforced
    }

    fn block_start_column(&self, block: usize) -> u32 {
        self.layout[self.chain.nodes[block].first_leaf].start_column
    }

    /// Column of the nearest placed member of `group` or its parent groups.
    fn alignment_column(&self, group: usize) -> Option<u32> {
        let mut current = Some(group);
        while let Some(group) = current {
            let state = &self.alignment_states[group];
            if let Some(column) = state.anchor.map(|anchor| anchor.column).or(state.target) {
                return Some(column);
            }
            current = self.chain.alignments[group].parent;
        }
        None
    }

    /// Move leaf `index` to its alignment group's column. `Err(leaf)` asks for a rollback to the
    /// group's first member after the group column was raised.
    fn align(
        &mut self,
        index: usize,
        resolution: Resolution,
        prev_column: u32,
        prev_line: u32,
    ) -> Result<Resolution, usize> {
        let Some(group) = self.chain.leaves[index].alignment else {
            return Ok(resolution);
        };
        let (mut info, fixed) = match resolution {
            Resolution::Computed(info) => (info, false),
            Resolution::Verbatim => (self.original_info(index), true),
        };
        let starts_line = index == 0 || info.line_feeds > 0;
        let natural = if starts_line {
            info.column()
        } else {
            prev_column + info.spaces
        };
        let line = prev_line + info.line_feeds;

        let move_to = |info: &mut IndentInfo, column: u32| {
            if starts_line {
                info.indent_spaces = column;
                info.spaces = 0;
            } else {
                info.spaces += column.saturating_sub(natural);
            }
        };

        let state = self.alignment_states[group];
        let Some(anchor) = state.anchor else {
            let fallback = state.target.or_else(|| {
                self.chain.alignments[group]
                    .parent
                    .and_then(|parent| self.alignment_column(parent))
            });
            let mut column = natural;
            if let Some(target) = fallback.filter(|_| !fixed) {
                if target > natural || (starts_line && state.target.is_none()) {
                    move_to(&mut info, target);
                    column = target;
                }
            }
            self.alignment_states[group].anchor = Some(Anchor {
                leaf: index,
                column,
                line,
                movable: !fixed,
            });
            return Ok(if fixed {
                resolution
            } else {
                Resolution::Computed(info)
            });
        };

        if fixed || anchor.line == line || natural == anchor.column {
            return Ok(resolution);
        }
        if natural < anchor.column {
            move_to(&mut info, anchor.column);
            return Ok(Resolution::Computed(info));
        }
        let backward_shift = self.chain.alignments[group].allow_backward_shift;
        if backward_shift && anchor.movable && self.take_rollback() {
            let target = self.alignment_states[group].target.map_or(natural, |t| t.max(natural));
            self.alignment_states[group].target = Some(target);
            tracing::debug!(
                target = "nova.format",
                leaf = index,
                anchor = anchor.leaf,
                column = target,
                "alignment group shifted right"
            );
            return Err(anchor.leaf);
        }
        if starts_line && !backward_shift {
            info.indent_spaces = anchor.column;
            info.spaces = 0;
        }
        Ok(Resolution::Computed(info))
    }

    fn wrap_enabled(&self, wrap: usize) -> bool {
        match self.chain.wraps[wrap].parent {
            Some(parent) => self.wrap_states[parent].wrapped_at.is_some(),
            None => true,
        }
    }

    fn is_first_element(&self, wrap: usize, leaf: usize) -> bool {
        self.wrap_states[wrap].first_leaf == Some(leaf)
            && !self.chain.wraps[wrap].wrap_first_element
    }

    fn wants_wrap(&self, index: usize) -> bool {
        for &wrap in &self.chain.leaves[index].wraps {
            if !self.wrap_enabled(wrap) || self.is_first_element(wrap, index) {
                continue;
            }
            let wants = match self.chain.wraps[wrap].kind {
                WrapKind::None => false,
                WrapKind::Always => true,
                WrapKind::ChopDownIfLong => self.wrap_states[wrap].chopped,
                WrapKind::Normal => self.forced_wraps[index],
            };
            if wants {
                return true;
            }
        }
        false
    }

    /// The last gap on the current line where a break may still be inserted.
    fn find_wrap_point(&self, index: usize) -> Option<WrapDecision> {
        let mut leaf = index;
        loop {
            let layout = &self.layout[leaf];
            if layout.starts_line {
                return None;
            }
            let ws = &self.chain.whitespaces[leaf];
            let writable = !ws.are_line_feeds_read_only()
                && !ws.spacing().is_some_and(Spacing::is_read_only);
            if writable {
                for &wrap in &self.chain.leaves[leaf].wraps {
                    if !self.wrap_enabled(wrap) || self.is_first_element(wrap, leaf) {
                        continue;
                    }
                    match self.chain.wraps[wrap].kind {
                        WrapKind::Normal if !self.forced_wraps[leaf] => {
                            return Some(WrapDecision::Force(leaf));
                        }
                        WrapKind::ChopDownIfLong if !self.wrap_states[wrap].chopped => {
                            let first_leaf = self.wrap_states[wrap].first_leaf.unwrap_or(leaf);
                            return Some(WrapDecision::Chop { wrap, first_leaf });
                        }
                        _ => {}
                    }
                }
            }
            if leaf == 0 || self.chain.leaves[leaf - 1].is_multiline() {
                return None;
            }
            leaf -= 1;
        }
    }

    fn commit_wrap(&mut self, decision: WrapDecision) -> usize {
        let to = match decision {
            WrapDecision::Force(leaf) => {
                self.forced_wraps[leaf] = true;
                leaf
            }
            WrapDecision::Chop { wrap, first_leaf } => {
                self.wrap_states[wrap].chopped = true;
                first_leaf
            }
        };
        tracing::debug!(target = "nova.format", leaf = to, "line exceeds right margin, wrapping");
        to
    }

    fn take_rollback(&mut self) -> bool {
        if self.rollbacks_left == 0 {
            return false;
        }
        self.rollbacks_left -= 1;
        if self.rollbacks_left == 0 {
            tracing::warn!(
                target = "nova.format",
                "rollback budget exhausted; remaining alignment and wrap constraints are not enforced"
            );
        }
        true
    }

    fn rollback(&mut self, to: usize) {
        self.position = to;
        for result in &mut self.results[to..] {
            *result = None;
        }
        for state in &mut self.wrap_states {
            if state.first_leaf.is_some_and(|leaf| leaf >= to) {
                state.first_leaf = None;
            }
            if state.wrapped_at.is_some_and(|leaf| leaf >= to) {
                state.wrapped_at = None;
            }
        }
        for state in &mut self.alignment_states {
            if state.anchor.is_some_and(|anchor| anchor.leaf >= to) {
                state.anchor = None;
            }
        }
    }

    fn finish_resolving(&mut self) {
        self.state = if self.model.is_some() {
            ProcessorState::Applying
        } else {
            ProcessorState::Done
        };
        tracing::debug!(
            target = "nova.format",
            whitespaces = self.results.len(),
            state = ?self.state,
            "whitespace resolution finished"
        );
    }

    fn apply_next(&mut self) {
        let index = self.apply_cursor;
        if index >= self.results.len() {
            if let Some(model) = self.model.as_deref_mut() {
                model.commit_changes();
            }
            self.state = ProcessorState::Done;
            tracing::debug!(target = "nova.format", changes = self.changes, "formatting applied");
            return;
        }
        self.apply_cursor += 1;

        let Some(Resolution::Computed(info)) = self.results[index] else {
            return;
        };
        let text = self.text_for(index, &info);
        let ws = &self.chain.whitespaces[index];
        if text == ws.original_text() {
            return;
        }
        let original = ws.range();
        let start = i64::from(u32::from(original.start())) + self.shift;
        let range = TextRange::at((start as u32).into(), original.len());
        let delta = text.len() as i64 - i64::from(u32::from(original.len()));

        let Some(model) = self.model.as_deref_mut() else {
            return;
        };
        match model.replace_whitespace(range, &text) {
            Ok(()) => {
                self.shift += delta;
                self.changes += 1;
            }
            Err(err) => {
                tracing::warn!(
                    target = "nova.format",
                    whitespace = index,
                    error = %err,
                    "failed to write whitespace; stopping"
                );
                model.commit_changes();
                self.error = Some(err);
                self.state = ProcessorState::Stopped;
            }
        }
    }
}

impl SequentialTask for FormatProcessor<'_> {
    fn prepare(&mut self) {
        if self.state == ProcessorState::NotStarted {
            self.state = ProcessorState::Resolving;
            tracing::debug!(
                target = "nova.format",
                leaves = self.chain.leaf_count(),
                preview = self.model.is_none(),
                "format processor started"
            );
        }
    }

    fn iteration(&mut self) -> bool {
        match self.state {
            ProcessorState::NotStarted => {
                self.prepare();
                self.resolve_next();
            }
            ProcessorState::Resolving => self.resolve_next(),
            ProcessorState::Applying => self.apply_next(),
            ProcessorState::Done | ProcessorState::Stopped => {}
        }
        self.is_done()
    }

    fn is_done(&self) -> bool {
        matches!(self.state, ProcessorState::Done | ProcessorState::Stopped)
    }

    fn stop(&mut self) {
        if !self.is_done() {
            tracing::debug!(
                target = "nova.format",
                position = self.position,
                changes = self.changes,
                "format processor stopped"
            );
            if self.state == ProcessorState::Applying {
                if let Some(model) = self.model.as_deref_mut() {
                    model.commit_changes();
                }
            }
            self.state = ProcessorState::Stopped;
        }
    }

    fn progress(&self) -> Option<f64> {
        let total = self.results.len() as f64;
        let resolved = self.position as f64 / total;
        let applied = self.apply_cursor as f64 / total;
        let fraction = match self.state {
            ProcessorState::NotStarted => 0.0,
            ProcessorState::Resolving if self.model.is_some() => resolved / 2.0,
            ProcessorState::Resolving => resolved,
            ProcessorState::Applying => 0.5 + applied / 2.0,
            ProcessorState::Done | ProcessorState::Stopped => 1.0,
        };
        Some(fraction.min(1.0))
    }
}

impl std::fmt::Debug for FormatProcessor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatProcessor")
            .field("state", &self.state)
            .field("position", &self.position)
            .field("leaves", &self.chain.leaf_count())
            .field("changes", &self.changes)
            .field("holds_guard", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}
