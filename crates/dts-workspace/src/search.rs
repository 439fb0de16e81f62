use std::path::{Path, PathBuf};

/// Looks for `filename` in `start` and then in each of its ancestors.
///
/// Returns the first candidate path accepted by `accept`.
pub(crate) fn find_in_ancestors(
    start: &Path,
    filename: &str,
    mut accept: impl FnMut(&Path) -> bool,
) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| accept(candidate))
}
