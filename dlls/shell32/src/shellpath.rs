//! Shell Path Helper Functions
//!
//! Path component helpers and executable search, working on both `\`
//! and `/` separated paths.
//!
//! # Features
//!
//! - File name and extension extraction
//! - Case-insensitive directory entry lookup
//! - Program name resolution (SearchPath semantics)
//!
//! # References
//!
//! - `public/sdk/inc/shlwapi.h` - Path* functions
//! - `public/sdk/inc/winbase.h` - SearchPath

use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Path Components
// ============================================================================

/// Check for a path separator
pub fn is_path_sep(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Check whether a string names a path rather than a bare program
pub fn has_path_separator(s: &str) -> bool {
    s.chars().any(is_path_sep)
}

/// Final component of a path (PathFindFileName)
pub fn path_find_file_name(path: &str) -> &str {
    path.rfind(is_path_sep)
        .map(|pos| &path[pos + 1..])
        .unwrap_or(path)
}

/// Byte offset of the extension dot in the file name (PathFindExtension)
pub fn path_find_extension(path: &str) -> Option<usize> {
    let name_start = path.len() - path_find_file_name(path).len();
    path[name_start..].rfind('.').map(|pos| name_start + pos)
}

/// Path without its extension (PathRemoveExtension)
pub fn path_remove_extension(path: &str) -> &str {
    match path_find_extension(path) {
        Some(dot) => &path[..dot],
        None => path,
    }
}

/// Item display name for a target: file name without extension
pub fn display_name_for(target: &Path) -> String {
    let path = target.to_string_lossy();
    path_remove_extension(path_find_file_name(&path)).to_string()
}

/// Convert a Windows-style path argument to a host path
pub fn host_path(path: &str) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(path)
    } else {
        PathBuf::from(path.replace('\\', "/"))
    }
}

// ============================================================================
// Directory Lookup
// ============================================================================

/// Find a directory entry by name, ignoring ASCII case
///
/// An exact match wins; otherwise the directory is scanned.
pub fn find_entry_ignore_case(dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = dir.join(name);
    if exact.exists() {
        return Some(exact);
    }

    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().eq_ignore_ascii_case(name) {
            return Some(entry.path());
        }
    }

    None
}

// ============================================================================
// Executable Search
// ============================================================================

/// Resolve a bare program name to an executable file
///
/// A name with an extension is looked up as given. A name without one is
/// tried with each of `extensions` in turn. Directories are searched in
/// order and the first regular file found wins.
pub fn find_executable<P: AsRef<Path>>(
    name: &str,
    search_path: &[P],
    extensions: &[String],
) -> Option<PathBuf> {
    if name.is_empty() || has_path_separator(name) {
        return None;
    }

    let candidates: Vec<String> = if path_find_extension(name).is_some() {
        vec![name.to_string()]
    } else {
        extensions.iter().map(|ext| format!("{}{}", name, ext)).collect()
    };

    for dir in search_path {
        for candidate in candidates.iter() {
            if let Some(path) = find_entry_ignore_case(dir.as_ref(), candidate) {
                if path.is_file() {
                    return Some(path);
                }
            }
        }
    }

    None
}
