//! Identifier normalization and file-kind predicates.
//!
//! Every cache structure is keyed by a normalized, root-relative identifier
//! with forward slashes. Two lookups with the same identifier must always
//! address the same logical template regardless of how the caller supplied
//! the path, so normalization happens at every pipeline entry point before
//! any cache access.

use std::path::{Component, Path, PathBuf};

use crate::constants::{STYLE_EXTENSION, TEMPLATE_EXTENSION};

/// Normalize a caller-supplied path into a template identifier.
///
/// Relative paths are resolved against `root`; absolute paths are taken
/// as-is. The result is the lexically-cleaned path relative to `root`,
/// joined with forward slashes on every platform. A path that does not live
/// under `root` keeps its cleaned absolute form and resolves as written at
/// fetch time, so out-of-root templates can be addressed explicitly without
/// aliasing any root-relative cache entry.
pub fn normalize_id(root: &Path, path: &Path) -> String {
    let absolute =
        if path.is_absolute() { lexical_clean(path) } else { lexical_clean(&root.join(path)) };
    let root = lexical_clean(root);
    let relative = absolute.strip_prefix(&root).unwrap_or(&absolute);

    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Collapse `.` and `..` components without touching the filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push(Component::ParentDir);
                }
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// Whether an identifier denotes a directive-bearing template file.
pub fn is_template(id: &str) -> bool {
    has_extension(id, TEMPLATE_EXTENSION)
}

/// Whether an identifier denotes a stylesheet.
pub fn is_stylesheet(id: &str) -> bool {
    has_extension(id, STYLE_EXTENSION)
}

fn has_extension(id: &str, extension: &str) -> bool {
    Path::new(id).extension().and_then(|ext| ext.to_str()) == Some(extension)
}
