use autoscan_analysis::module_path;
use autoscan_analysis::orchestrator::choose_mode;
use autoscan_analysis::scanner::PathFilter;
use autoscan_analysis::ExecutionMode;
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

proptest! {
    #[test]
    fn exclusion_beats_inclusion(
        dir in segment(),
        rest in prop::collection::vec(segment(), 0..4),
        file in segment(),
    ) {
        let includes = vec!["**/*.py".to_string()];
        let excludes = vec![format!("{dir}/**")];
        let filter = PathFilter::new(&includes, &excludes).unwrap();

        let mut parts = vec![dir.clone()];
        parts.extend(rest);
        parts.push(format!("{file}.py"));
        let relative = parts.join("/");

        prop_assert!(!filter.is_included(&relative), "{} should be excluded", relative);
        prop_assert!(filter.is_dir_excluded(&dir));
    }

    #[test]
    fn unexcluded_python_files_are_included(
        parts in prop::collection::vec(segment(), 0..4),
        file in segment(),
    ) {
        let filter = PathFilter::new(&["**/*.py".to_string()], &[]).unwrap();
        let mut parts = parts;
        parts.push(format!("{file}.py"));
        prop_assert!(filter.is_included(&parts.join("/")));
    }

    #[test]
    fn module_path_joins_segments_with_dots(
        parts in prop::collection::vec(segment(), 1..5),
    ) {
        let relative = format!("{}.py", parts.join("/"));
        prop_assert_eq!(module_path(&relative), Some(parts.join(".")));

        let package = format!("{}/__init__.py", parts.join("/"));
        prop_assert_eq!(module_path(&package), Some(parts.join(".")));
    }

    #[test]
    fn explicit_mode_ignores_file_count(
        threshold in 0usize..500,
        count in 0usize..1000,
        forced in any::<bool>(),
    ) {
        let expected = if forced { ExecutionMode::Parallel } else { ExecutionMode::Serial };
        prop_assert_eq!(choose_mode(Some(forced), threshold, count), expected);

        let auto = choose_mode(None, threshold, count);
        prop_assert_eq!(auto == ExecutionMode::Parallel, count >= threshold);
    }
}
