//! Project selection filters.
//!
//! Filters are opt-in: an empty list selects everything. A single filter can
//! be a project name, a glob over the project's path inside the repositories
//! area, or a plain substring of that path, whichever the user finds most
//! convenient to type.

use glob::{MatchOptions, Pattern};

/// Glob semantics for path filters: `*` and `?` stop at `/`, `**` crosses it.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Decide whether a project is selected by the given filters.
///
/// `relative_path` must be slash-normalized. Each filter is tried as an exact
/// (case-insensitive) name match first, then as a glob over the relative
/// path, then as a substring of it; the first hit selects the project.
pub fn matches(name: &str, relative_path: &str, filters: &[String]) -> bool {
    if filters.is_empty() {
        return true;
    }

    filters.iter().any(|filter| {
        if name.eq_ignore_ascii_case(filter) {
            return true;
        }

        if let Ok(pattern) = Pattern::new(filter) {
            if pattern.matches_with(relative_path, GLOB_OPTIONS) {
                return true;
            }
        }

        relative_path
            .to_ascii_lowercase()
            .contains(&filter.to_ascii_lowercase())
    })
}
