//! Python parser. Bytes in, syntax tree out; nothing is evaluated.

use std::cell::RefCell;
use std::path::Path;

use autoscan_core::errors::ParseError;
use tree_sitter::{Parser, Tree};

use super::error_tolerant::count_errors;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

thread_local! {
    static PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

/// A successfully parsed file: decoded text plus its syntax tree.
pub struct ParsedSource {
    pub source: String,
    pub tree: Tree,
}

/// Parse one file's bytes.
///
/// A leading UTF-8 BOM is stripped. Invalid UTF-8 and any ERROR or MISSING
/// node are parse errors; the caller records them against the file.
pub fn parse_python(bytes: &[u8], path: &Path) -> Result<ParsedSource, ParseError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let source = std::str::from_utf8(bytes)
        .map_err(|e| ParseError::InvalidEncoding {
            path: path.to_path_buf(),
            offset: e.valid_up_to(),
        })?
        .to_string();

    let tree = parse_tree(&source).map_err(|message| ParseError::TreeSitterError {
        path: path.to_path_buf(),
        message,
    })?;

    let root = tree.root_node();
    if root.has_error() {
        let (error_count, ranges) = count_errors(root);
        let first = ranges.first().copied().unwrap_or_default();
        return Err(ParseError::Syntax {
            path: path.to_path_buf(),
            line: first.start.line + 1,
            column: first.start.column + 1,
            error_count,
        });
    }

    Ok(ParsedSource { source, tree })
}

/// Parse with this thread's parser, creating it on first use.
pub(crate) fn parse_tree(source: &str) -> Result<Tree, String> {
    PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(new_parser()?);
        }
        slot.as_mut()
            .and_then(|parser| parser.parse(source, None))
            .ok_or_else(|| "parser returned no tree".to_string())
    })
}

fn new_parser() -> Result<Parser, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| e.to_string())?;
    Ok(parser)
}
