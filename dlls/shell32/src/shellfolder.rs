//! Programs Folder
//!
//! Program groups are directories directly below the Programs root and
//! items are `<name>.lnk` shell links inside them. Names are matched
//! case-insensitively the way the Windows file system would.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::progman::{ProgmanError, Result};
use crate::shelllink::ShellLink;
use crate::shellpath::{find_entry_ignore_case, is_path_sep};

/// Extension of item files
pub const LINK_EXTENSION: &str = ".lnk";

/// A group found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    /// Directory name as stored on disk
    pub name: String,
    pub path: PathBuf,
}

/// Group and item store rooted at a Programs folder
#[derive(Debug, Clone)]
pub struct ProgramsFolder {
    root: PathBuf,
}

impl ProgramsFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject names that are empty or would leave their parent directory
    pub fn validate_name(command: &'static str, name: &str) -> Result<()> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('\0')
            || name.chars().any(is_path_sep)
        {
            return Err(ProgmanError::invalid(command, name));
        }
        Ok(())
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Look up an existing group
    pub fn find_group(&self, name: &str) -> Option<GroupEntry> {
        let path = find_entry_ignore_case(&self.root, name)?;
        if !path.is_dir() {
            return None;
        }
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(GroupEntry { name, path })
    }

    /// Create a group unless it already exists
    ///
    /// Returns the group and whether its directory was created.
    pub fn create_group(&self, name: &str) -> Result<(GroupEntry, bool)> {
        if let Some(group) = self.find_group(name) {
            return Ok((group, false));
        }

        let path = self.root.join(name);
        fs::create_dir_all(&path)?;
        Ok((
            GroupEntry {
                name: name.to_string(),
                path,
            },
            true,
        ))
    }

    /// Remove a group and everything in it
    pub fn delete_group(&self, name: &str) -> Result<GroupEntry> {
        let group = self
            .find_group(name)
            .ok_or_else(|| ProgmanError::not_found("group", name))?;
        fs::remove_dir_all(&group.path)?;
        Ok(group)
    }

    /// Group names sorted case-insensitively
    ///
    /// A Programs root that does not exist yet holds no groups.
    pub fn groups(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort_by_key(|name| name.to_ascii_lowercase());
        Ok(names)
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Look up an item file by display name
    pub fn find_item(&self, group: &GroupEntry, name: &str) -> Option<PathBuf> {
        let path = find_entry_ignore_case(&group.path, &format!("{}{}", name, LINK_EXTENSION))?;
        path.is_file().then_some(path)
    }

    /// Write an item, replacing one with the same display name
    ///
    /// Returns true if an existing item was replaced.
    pub fn write_item(&self, group: &GroupEntry, name: &str, link: &ShellLink) -> Result<bool> {
        let (path, replaced) = match self.find_item(group, name) {
            Some(existing) => (existing, true),
            None => (group.path.join(format!("{}{}", name, LINK_EXTENSION)), false),
        };
        link.save(&path)?;
        Ok(replaced)
    }

    /// Remove an item by display name
    pub fn delete_item(&self, group: &GroupEntry, name: &str) -> Result<PathBuf> {
        let path = self
            .find_item(group, name)
            .ok_or_else(|| ProgmanError::not_found("item", name))?;
        fs::remove_file(&path)?;
        Ok(path)
    }

    /// Display names of the items in a group, sorted case-insensitively
    pub fn items(&self, group: &GroupEntry) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&group.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let split = file_name.len().saturating_sub(LINK_EXTENSION.len());
            if file_name.is_char_boundary(split)
                && file_name[split..].eq_ignore_ascii_case(LINK_EXTENSION)
            {
                names.push(file_name[..split].to_string());
            }
        }
        names.sort_by_key(|name| name.to_ascii_lowercase());
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder() -> (tempfile::TempDir, ProgramsFolder) {
        let dir = tempfile::tempdir().unwrap();
        let folder = ProgramsFolder::new(dir.path().join("Programs"));
        (dir, folder)
    }

    #[test]
    fn test_validate_name() {
        assert!(ProgramsFolder::validate_name("CreateGroup", "Group1").is_ok());
        assert!(ProgramsFolder::validate_name("AddItem", "a[b,c]d").is_ok());
        assert!(ProgramsFolder::validate_name("AddItem", "foo bar").is_ok());

        for bad in ["", ".", "..", "a\\b", "../escape", "nul\0byte"] {
            assert!(
                matches!(
                    ProgramsFolder::validate_name("CreateGroup", bad),
                    Err(ProgmanError::InvalidArgument { .. })
                ),
                "{:?} accepted",
                bad
            );
        }
    }

    #[test]
    fn test_create_group_is_idempotent() {
        let (_dir, folder) = folder();

        let (group, created) = folder.create_group("Group1").unwrap();
        assert!(created);
        assert!(group.path.is_dir());

        let (again, created) = folder.create_group("GROUP1").unwrap();
        assert!(!created);
        assert_eq!(again.path, group.path);
        assert_eq!(folder.groups().unwrap(), vec!["Group1".to_string()]);
    }

    #[test]
    fn test_delete_group() {
        let (_dir, folder) = folder();
        let (group, _) = folder.create_group("Group1").unwrap();
        fs::write(group.path.join("item.lnk"), b"x").unwrap();

        let deleted = folder.delete_group("group1").unwrap();
        assert_eq!(deleted.name, "Group1");
        assert!(!group.path.exists());

        assert!(matches!(
            folder.delete_group("Group1"),
            Err(ProgmanError::NotFound { kind: "group", .. })
        ));
    }

    #[test]
    fn test_groups_skip_files_and_missing_root() {
        let (_dir, folder) = folder();
        assert!(folder.groups().unwrap().is_empty());

        folder.create_group("beta").unwrap();
        folder.create_group("Alpha").unwrap();
        fs::write(folder.root().join("desktop.ini"), b"").unwrap();

        assert_eq!(folder.groups().unwrap(), vec!["Alpha".to_string(), "beta".to_string()]);
        assert!(folder.find_group("desktop.ini").is_none());
    }

    #[test]
    fn test_items() {
        let (dir, folder) = folder();
        let (group, _) = folder.create_group("Group1").unwrap();
        let target = dir.path().join("notepad.exe");
        fs::write(&target, b"MZ").unwrap();
        let link = ShellLink::for_target(&target).unwrap();

        assert!(!folder.write_item(&group, "notepad", &link).unwrap());
        assert!(folder.write_item(&group, "Notepad", &link).unwrap());
        assert_eq!(folder.items(&group).unwrap(), vec!["notepad".to_string()]);

        assert!(folder.find_item(&group, "NOTEPAD").is_some());
        assert!(folder.find_item(&group, "notepad.exe").is_none());

        folder.delete_item(&group, "notepad").unwrap();
        assert!(matches!(
            folder.delete_item(&group, "notepad"),
            Err(ProgmanError::NotFound { kind: "item", .. })
        ));
    }
}
