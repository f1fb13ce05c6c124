//! Code style settings consumed by the formatter.
//!
//! Settings are plain data: the formatter never persists them. They can be built in code,
//! deserialized from TOML, or queried by option name.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndentOptions {
    pub indent_size: u32,
    pub continuation_indent_size: u32,
    pub tab_size: u32,
    pub use_tabs: bool,
    pub label_indent_size: u32,
    pub label_indent_absolute: bool,
}

impl Default for IndentOptions {
    fn default() -> Self {
        Self {
            indent_size: 4,
            continuation_indent_size: 8,
            tab_size: 4,
            use_tabs: false,
            label_indent_size: 0,
            label_indent_absolute: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodeStyleSettings {
    pub indent: IndentOptions,
    /// Maximum blank lines kept between tokens when a spacing rule does not say otherwise.
    pub keep_blank_lines_in_code: u32,
    /// Global switch: when `false`, no spacing rule may keep an original line break.
    pub keep_line_breaks: bool,
    /// Column limit used by wrap decisions.
    pub right_margin: u32,
}

impl Default for CodeStyleSettings {
    fn default() -> Self {
        Self {
            indent: IndentOptions::default(),
            keep_blank_lines_in_code: 2,
            keep_line_breaks: true,
            right_margin: 120,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse style settings: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("`{option}` must be greater than zero")]
    MustBePositive { option: &'static str },
}

/// A single named style option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleOption {
    Int(u32),
    Bool(bool),
}

impl CodeStyleSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: CodeStyleSettings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.indent.tab_size == 0 {
            return Err(SettingsError::MustBePositive {
                option: "indent.tab_size",
            });
        }
        if self.right_margin == 0 {
            return Err(SettingsError::MustBePositive {
                option: "right_margin",
            });
        }
        Ok(())
    }

    /// Look an option up by its TOML key (`indent.*` keys use their dotted name).
    pub fn option(&self, name: &str) -> Option<StyleOption> {
        let indent = &self.indent;
        let value = match name {
            "indent.indent_size" => StyleOption::Int(indent.indent_size),
            "indent.continuation_indent_size" => StyleOption::Int(indent.continuation_indent_size),
            "indent.tab_size" => StyleOption::Int(indent.tab_size),
            "indent.use_tabs" => StyleOption::Bool(indent.use_tabs),
            "indent.label_indent_size" => StyleOption::Int(indent.label_indent_size),
            "indent.label_indent_absolute" => StyleOption::Bool(indent.label_indent_absolute),
            "keep_blank_lines_in_code" => StyleOption::Int(self.keep_blank_lines_in_code),
            "keep_line_breaks" => StyleOption::Bool(self.keep_line_breaks),
            "right_margin" => StyleOption::Int(self.right_margin),
            _ => return None,
        };
        Some(value)
    }
}
