//! Detector marker configuration.
//!
//! The heuristics never hard-code ORM names: every marker the detector looks
//! for comes from `DetectorMarkers`, whose defaults follow SQLAlchemy,
//! Flask-SQLAlchemy, and SQLModel conventions.

use serde::{Deserialize, Serialize};

/// File-layer detector settings. `None` means "not set in this layer".
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DetectorConfig {
    /// Base-class names that mark a declarative model. Default: `Base`, `Model`.
    pub declarative_bases: Option<Vec<String>>,
    /// Class attributes that designate a table. Default: `__tablename__`, `__table__`.
    pub table_attributes: Option<Vec<String>>,
    /// Column constructor call names. Default: `Column`, `mapped_column`.
    pub column_constructors: Option<Vec<String>>,
    /// Generic annotation wrappers. Default: `Mapped`.
    pub mapped_wrappers: Option<Vec<String>>,
    /// Declarative base factory functions. Default: `declarative_base`.
    pub base_factories: Option<Vec<String>>,
    /// As-declarative class decorators. Default: `as_declarative`.
    pub declarative_decorators: Option<Vec<String>>,
    /// Imperative mapping functions. Default: `map_imperatively`.
    pub imperative_mappers: Option<Vec<String>>,
    /// Class keyword that marks a table model when literally `True`. Default: `table`.
    pub table_keyword: Option<String>,
    /// Class attribute that excludes a class when literally `True`. Default: `__abstract__`.
    pub abstract_attribute: Option<String>,
}

impl DetectorConfig {
    /// Merge `other` into `self`; set values in `other` win.
    pub fn merge(&mut self, other: &DetectorConfig) {
        if other.declarative_bases.is_some() {
            self.declarative_bases = other.declarative_bases.clone();
        }
        if other.table_attributes.is_some() {
            self.table_attributes = other.table_attributes.clone();
        }
        if other.column_constructors.is_some() {
            self.column_constructors = other.column_constructors.clone();
        }
        if other.mapped_wrappers.is_some() {
            self.mapped_wrappers = other.mapped_wrappers.clone();
        }
        if other.base_factories.is_some() {
            self.base_factories = other.base_factories.clone();
        }
        if other.declarative_decorators.is_some() {
            self.declarative_decorators = other.declarative_decorators.clone();
        }
        if other.imperative_mappers.is_some() {
            self.imperative_mappers = other.imperative_mappers.clone();
        }
        if other.table_keyword.is_some() {
            self.table_keyword = other.table_keyword.clone();
        }
        if other.abstract_attribute.is_some() {
            self.abstract_attribute = other.abstract_attribute.clone();
        }
    }

    /// Resolve unset fields to the built-in markers.
    pub fn resolve(&self) -> DetectorMarkers {
        let defaults = DetectorMarkers::default();
        DetectorMarkers {
            declarative_bases: self
                .declarative_bases
                .clone()
                .unwrap_or(defaults.declarative_bases),
            table_attributes: self
                .table_attributes
                .clone()
                .unwrap_or(defaults.table_attributes),
            column_constructors: self
                .column_constructors
                .clone()
                .unwrap_or(defaults.column_constructors),
            mapped_wrappers: self
                .mapped_wrappers
                .clone()
                .unwrap_or(defaults.mapped_wrappers),
            base_factories: self
                .base_factories
                .clone()
                .unwrap_or(defaults.base_factories),
            declarative_decorators: self
                .declarative_decorators
                .clone()
                .unwrap_or(defaults.declarative_decorators),
            imperative_mappers: self
                .imperative_mappers
                .clone()
                .unwrap_or(defaults.imperative_mappers),
            table_keyword: self.table_keyword.clone().unwrap_or(defaults.table_keyword),
            abstract_attribute: self
                .abstract_attribute
                .clone()
                .unwrap_or(defaults.abstract_attribute),
        }
    }
}

/// Resolved marker set consumed by the model detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectorMarkers {
    pub declarative_bases: Vec<String>,
    pub table_attributes: Vec<String>,
    pub column_constructors: Vec<String>,
    pub mapped_wrappers: Vec<String>,
    pub base_factories: Vec<String>,
    pub declarative_decorators: Vec<String>,
    pub imperative_mappers: Vec<String>,
    pub table_keyword: String,
    pub abstract_attribute: String,
}

impl Default for DetectorMarkers {
    fn default() -> Self {
        Self {
            declarative_bases: strings(&["Base", "Model"]),
            table_attributes: strings(&["__tablename__", "__table__"]),
            column_constructors: strings(&["Column", "mapped_column"]),
            mapped_wrappers: strings(&["Mapped"]),
            base_factories: strings(&["declarative_base"]),
            declarative_decorators: strings(&["as_declarative"]),
            imperative_mappers: strings(&["map_imperatively"]),
            table_keyword: "table".to_string(),
            abstract_attribute: "__abstract__".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
