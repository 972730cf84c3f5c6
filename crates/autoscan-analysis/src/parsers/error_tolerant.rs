//! Locating ERROR and MISSING nodes in a tree-sitter tree.

use tree_sitter::Node;

use super::types::Range;

/// Count ERROR and MISSING nodes, returning their ranges in document order.
pub fn count_errors(root: Node) -> (u32, Vec<Range>) {
    let mut count = 0u32;
    let mut ranges = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            count += 1;
            ranges.push(Range::from_ts_node(&node));
        }
        if !node.has_error() {
            continue;
        }
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
    (count, ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::python::parse_tree;

    #[test]
    fn clean_source_has_no_errors() {
        let tree = parse_tree("class A:\n    pass\n").unwrap();
        assert_eq!(count_errors(tree.root_node()).0, 0);
    }

    #[test]
    fn broken_source_reports_first_error_position() {
        let tree = parse_tree("x = 1\nclass A(:\n    pass\n").unwrap();
        let (count, ranges) = count_errors(tree.root_node());
        assert!(count >= 1);
        assert_eq!(ranges[0].start.line, 1);
    }
}
