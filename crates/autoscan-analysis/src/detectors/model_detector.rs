//! Structural model detector.
//!
//! Every class definition in the file (nested ones included) is checked
//! against the rules in `DetectionRule` order. All markers come from
//! `DetectorMarkers`. Expressions are compared as written and never
//! evaluated, so anything that is not literally recognisable is a non-match.

use std::path::Path;

use autoscan_core::config::DetectorMarkers;
use autoscan_core::types::{FxHashMap, FxHashSet, SmallVec2};
use tree_sitter::Node;

use super::types::{ClassMatch, DetectionResult, DetectionRule};
use crate::parsers::{parse_python, ParsedSource};

/// Classifies class definitions as ORM models.
#[derive(Debug, Clone)]
pub struct ModelDetector {
    markers: DetectorMarkers,
    verbose: bool,
}

impl ModelDetector {
    pub fn new(markers: DetectorMarkers) -> Self {
        Self {
            markers,
            verbose: false,
        }
    }

    /// Log every match with the rules that fired.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn markers(&self) -> &DetectorMarkers {
        &self.markers
    }

    /// Parse `bytes` and detect models. Parse failures become a result with
    /// `parse_error` set and no matches.
    pub fn detect(&self, relative_path: &str, bytes: &[u8]) -> DetectionResult {
        match parse_python(bytes, Path::new(relative_path)) {
            Ok(parsed) => self.detect_parsed(relative_path, &parsed),
            Err(err) => {
                tracing::debug!(path = relative_path, error = %err, "parse failed");
                DetectionResult::parse_failed(relative_path, err.to_string())
            }
        }
    }

    /// Detect models in an already parsed file.
    pub fn detect_parsed(&self, relative_path: &str, parsed: &ParsedSource) -> DetectionResult {
        let module = ModuleSyntax::collect(&parsed.source, parsed.tree.root_node(), &self.markers);
        let mut result = DetectionResult::empty(relative_path);

        for class in &module.classes {
            if self.is_abstract(&module, class) {
                result.abstract_classes.push(class.name.to_string());
                continue;
            }
            let rules = self.rules_for(&module, class);
            if rules.is_empty() {
                continue;
            }

            if self.verbose {
                let fired: Vec<&str> = rules.iter().map(DetectionRule::name).collect();
                tracing::info!(
                    path = relative_path,
                    class = class.name,
                    rules = ?fired,
                    "model detected"
                );
            }
            result.matches.push(ClassMatch {
                class_name: class.name.to_string(),
                file: relative_path.to_string(),
                rules,
                parent: class
                    .bases
                    .first()
                    .map(|base| module.text(*base).trim().to_string()),
                line: class.node.start_position().row as u32 + 1,
            });
        }

        result
    }

    fn rules_for(&self, module: &ModuleSyntax<'_>, class: &ClassSyntax<'_>) -> SmallVec2<DetectionRule> {
        let mut rules = SmallVec2::new();
        for rule in DetectionRule::ALL {
            let fired = match rule {
                DetectionRule::DeclarativeBase => self.inherits_declarative_base(module, class),
                DetectionRule::TableName => self.has_table_attribute(module, class),
                DetectionRule::MappedAttribute => self.has_mapped_attribute(module, class),
                DetectionRule::DeclarativeFactory => self.uses_declarative_factory(module, class),
                DetectionRule::ImperativeMapping => module.imperatively_mapped.contains(class.name),
                DetectionRule::TableKeyword => self.has_table_keyword(module, class),
            };
            if fired {
                rules.push(rule);
            }
        }
        rules
    }

    fn inherits_declarative_base(&self, module: &ModuleSyntax<'_>, class: &ClassSyntax<'_>) -> bool {
        class.bases.iter().any(|base| {
            let text = module.text(*base);
            self.is_base_marker(text)
                || module.parent_class(class, text).is_some_and(|parent| {
                    parent
                        .bases
                        .iter()
                        .any(|grandparent| self.is_base_marker(module.text(*grandparent)))
                })
        })
    }

    fn has_table_attribute(&self, module: &ModuleSyntax<'_>, class: &ClassSyntax<'_>) -> bool {
        class.assignments.iter().any(|assignment| {
            assignment
                .child_by_field_name("left")
                .is_some_and(|left| contains(&self.markers.table_attributes, module.text(left)))
        })
    }

    fn has_mapped_attribute(&self, module: &ModuleSyntax<'_>, class: &ClassSyntax<'_>) -> bool {
        class.assignments.iter().any(|assignment| {
            let column_call = assignment
                .child_by_field_name("right")
                .filter(|right| right.kind() == "call")
                .and_then(|call| module.callee(call))
                .is_some_and(|callee| contains(&self.markers.column_constructors, callee));
            let mapped_annotation = assignment
                .child_by_field_name("type")
                .is_some_and(|annotation| {
                    contains(&self.markers.mapped_wrappers, annotation_head(module.text(annotation)))
                });
            column_call || mapped_annotation
        })
    }

    fn uses_declarative_factory(&self, module: &ModuleSyntax<'_>, class: &ClassSyntax<'_>) -> bool {
        let factory_base = class.bases.iter().any(|base| match base.kind() {
            "call" => module
                .callee(*base)
                .is_some_and(|callee| contains(&self.markers.base_factories, callee)),
            "identifier" => module.factory_bindings.contains(module.text(*base)),
            _ => false,
        });

        factory_base
            || self.is_declarative_decorated(module, class)
            || class.bases.iter().any(|base| {
                module
                    .parent_class(class, module.text(*base))
                    .is_some_and(|parent| self.is_declarative_decorated(module, parent))
            })
    }

    fn is_declarative_decorated(&self, module: &ModuleSyntax<'_>, class: &ClassSyntax<'_>) -> bool {
        class.decorators.iter().any(|decorator| {
            let name = if decorator.kind() == "call" {
                module.callee(*decorator)
            } else {
                Some(last_segment(module.text(*decorator)))
            };
            name.is_some_and(|name| contains(&self.markers.declarative_decorators, name))
        })
    }

    fn has_table_keyword(&self, module: &ModuleSyntax<'_>, class: &ClassSyntax<'_>) -> bool {
        class.keywords.iter().any(|keyword| {
            let name = keyword
                .child_by_field_name("name")
                .map(|name| module.text(name));
            let value = keyword.child_by_field_name("value");
            name == Some(self.markers.table_keyword.as_str())
                && value.is_some_and(|value| value.kind() == "true")
        })
    }

    fn is_abstract(&self, module: &ModuleSyntax<'_>, class: &ClassSyntax<'_>) -> bool {
        class.assignments.iter().any(|assignment| {
            let left = assignment.child_by_field_name("left").map(|n| module.text(n));
            let right = assignment.child_by_field_name("right");
            left == Some(self.markers.abstract_attribute.as_str())
                && right.is_some_and(|right| right.kind() == "true")
        })
    }

    fn is_base_marker(&self, text: &str) -> bool {
        let compacted = compact(text);
        self.markers
            .declarative_bases
            .iter()
            .any(|marker| *marker == compacted || marker == last_segment(&compacted))
    }
}

/// A class definition with the parts the rules look at.
struct ClassSyntax<'a> {
    node: Node<'a>,
    name: &'a str,
    /// Positional bases.
    bases: Vec<Node<'a>>,
    /// `keyword_argument` nodes in the class header.
    keywords: Vec<Node<'a>>,
    /// Decorator expressions.
    decorators: Vec<Node<'a>>,
    /// Class-level `assignment` nodes.
    assignments: Vec<Node<'a>>,
}

/// Module-wide facts gathered in one pass.
struct ModuleSyntax<'a> {
    source: &'a str,
    /// Class definitions in source order.
    classes: Vec<ClassSyntax<'a>>,
    /// First class defined under each name.
    by_name: FxHashMap<&'a str, usize>,
    /// Module-level names bound to a declarative-base factory call.
    factory_bindings: FxHashSet<&'a str>,
    /// Names passed first to an imperative mapping call.
    imperatively_mapped: FxHashSet<&'a str>,
}

impl<'a> ModuleSyntax<'a> {
    fn collect(source: &'a str, root: Node<'a>, markers: &DetectorMarkers) -> Self {
        let mut module = Self {
            source,
            classes: Vec::new(),
            by_name: FxHashMap::default(),
            factory_bindings: FxHashSet::default(),
            imperatively_mapped: FxHashSet::default(),
        };

        for statement in named_children(root) {
            if statement.kind() == "expression_statement" {
                for assignment in named_children(statement) {
                    module.record_factory_binding(assignment, markers);
                }
            }
        }

        // Pre-order walk keeps classes in source order.
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "class_definition" => module.record_class(node),
                "call" => module.record_imperative_mapping(node, markers),
                _ => {}
            }
            for i in (0..node.named_child_count()).rev() {
                if let Some(child) = node.named_child(i) {
                    stack.push(child);
                }
            }
        }

        module
    }

    fn record_factory_binding(&mut self, assignment: Node<'a>, markers: &DetectorMarkers) {
        let mut targets = Vec::new();
        let mut current = assignment;
        while current.kind() == "assignment" {
            if let Some(left) = current.child_by_field_name("left") {
                targets.push(left);
            }
            match current.child_by_field_name("right") {
                Some(right) => current = right,
                None => return,
            }
        }
        let is_factory_call = current.kind() == "call"
            && self
                .callee(current)
                .is_some_and(|callee| contains(&markers.base_factories, callee));
        if !is_factory_call {
            return;
        }
        for target in targets {
            if target.kind() == "identifier" {
                let name = self.text(target);
                self.factory_bindings.insert(name);
            }
        }
    }

    fn record_imperative_mapping(&mut self, call: Node<'a>, markers: &DetectorMarkers) {
        let is_mapper = self
            .callee(call)
            .is_some_and(|callee| contains(&markers.imperative_mappers, callee));
        if !is_mapper {
            return;
        }
        let first_positional = call
            .child_by_field_name("arguments")
            .and_then(|args| positional(args).into_iter().next());
        if let Some(argument) = first_positional.filter(|arg| arg.kind() == "identifier") {
            let name = self.text(argument);
            self.imperatively_mapped.insert(name);
        }
    }

    fn record_class(&mut self, node: Node<'a>) {
        let Some(name) = node.child_by_field_name("name").map(|n| self.text(n)) else {
            return;
        };

        let (bases, keywords) = match node.child_by_field_name("superclasses") {
            Some(args) => (
                positional(args),
                named_children(args)
                    .into_iter()
                    .filter(|arg| arg.kind() == "keyword_argument")
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let decorators = node
            .parent()
            .filter(|parent| parent.kind() == "decorated_definition")
            .map(|parent| {
                named_children(parent)
                    .into_iter()
                    .filter(|child| child.kind() == "decorator")
                    .filter_map(|decorator| decorator.named_child(0))
                    .collect()
            })
            .unwrap_or_default();

        let assignments = node
            .child_by_field_name("body")
            .map(|body| {
                named_children(body)
                    .into_iter()
                    .filter(|statement| statement.kind() == "expression_statement")
                    .flat_map(named_children)
                    .filter(|expr| expr.kind() == "assignment")
                    .collect()
            })
            .unwrap_or_default();

        self.by_name.entry(name).or_insert(self.classes.len());
        self.classes.push(ClassSyntax {
            node,
            name,
            bases,
            keywords,
            decorators,
            assignments,
        });
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Last name segment of a call's function expression.
    fn callee(&self, call: Node<'_>) -> Option<&'a str> {
        call.child_by_field_name("function")
            .map(|function| last_segment(self.text(function)))
    }

    /// A different class in this file named `base_text`.
    fn parent_class(&self, class: &ClassSyntax<'_>, base_text: &str) -> Option<&ClassSyntax<'a>> {
        self.by_name
            .get(base_text.trim())
            .map(|index| &self.classes[*index])
            .filter(|parent| parent.node.id() != class.node.id())
    }
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Positional arguments of an `argument_list`, skipping keywords, splats and comments.
fn positional(args: Node<'_>) -> Vec<Node<'_>> {
    named_children(args)
        .into_iter()
        .filter(|arg| {
            !matches!(
                arg.kind(),
                "keyword_argument" | "list_splat" | "dictionary_splat" | "comment"
            )
        })
        .collect()
}

fn contains(markers: &[String], name: &str) -> bool {
    markers.iter().any(|marker| marker == name)
}

fn last_segment(text: &str) -> &str {
    text.rsplit('.').next().unwrap_or(text).trim()
}

fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}

/// `so.Mapped[int]` -> `Mapped`; string annotations are unquoted first.
fn annotation_head(annotation: &str) -> &str {
    let unquoted = annotation.trim().trim_matches(|c| c == '"' || c == '\'');
    let head = unquoted.split('[').next().unwrap_or(unquoted);
    last_segment(head)
}
