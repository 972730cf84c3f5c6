//! Detection output types. `DetectionResult` is exactly what the cache stores.

use std::fmt;

use autoscan_core::types::SmallVec2;
use serde::{Deserialize, Serialize};

/// One structural heuristic. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DetectionRule {
    /// A base class names a declarative-base marker, directly or one hop away.
    DeclarativeBase,
    /// A class-level `__tablename__` / `__table__` assignment.
    TableName,
    /// A class-level column constructor call or `Mapped[...]` annotation.
    MappedAttribute,
    /// The base comes from a declarative-base factory or decorator.
    DeclarativeFactory,
    /// The class is passed to an imperative mapping call in the same module.
    ImperativeMapping,
    /// `table=True` in the class keywords.
    TableKeyword,
}

impl DetectionRule {
    pub const ALL: [DetectionRule; 6] = [
        Self::DeclarativeBase,
        Self::TableName,
        Self::MappedAttribute,
        Self::DeclarativeFactory,
        Self::ImperativeMapping,
        Self::TableKeyword,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DeclarativeBase => "declarative_base",
            Self::TableName => "table_name",
            Self::MappedAttribute => "mapped_attribute",
            Self::DeclarativeFactory => "declarative_factory",
            Self::ImperativeMapping => "imperative_mapping",
            Self::TableKeyword => "table_keyword",
        }
    }
}

impl fmt::Display for DetectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A class classified as a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMatch {
    pub class_name: String,
    /// Relative path of the defining file.
    pub file: String,
    /// Every rule that fired, in priority order.
    pub rules: SmallVec2<DetectionRule>,
    /// First positional base as written in source.
    pub parent: Option<String>,
    /// 1-based line of the `class` keyword.
    pub line: u32,
}

impl ClassMatch {
    /// The highest-priority rule that fired.
    pub fn primary_rule(&self) -> Option<DetectionRule> {
        self.rules.first().copied()
    }
}

/// Per-file detection output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Relative path of the scanned file.
    pub path: String,
    /// Matches in source order.
    pub matches: Vec<ClassMatch>,
    /// Present when the file could not be parsed; `matches` is then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    /// Classes dropped because of a literal abstract marker.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abstract_classes: Vec<String>,
}

impl DetectionResult {
    pub fn empty(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn parse_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            parse_error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn has_parse_error(&self) -> bool {
        self.parse_error.is_some()
    }

    /// Re-anchor a cached result at `path`, the file's current relative path.
    pub fn relocate(&mut self, path: &str) {
        if self.path == path {
            return;
        }
        self.path = path.to_string();
        for class_match in &mut self.matches {
            class_match.file = path.to_string();
        }
    }
}
