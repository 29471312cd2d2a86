//! Program Manager session state
//!
//! The current group is the group that AddItem and DeleteItem act on.
//! It is owned by the server instance, not by a conversation, so a
//! group shown over one connection stays current for the next one.

/// Session state guarded by the server's session lock
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    /// Name of the current group, as found on disk
    current_group: Option<String>,
}

impl Session {
    /// Create a session with no current group
    pub const fn new() -> Self {
        Self { current_group: None }
    }

    /// Current group name, if any
    pub fn current_group(&self) -> Option<&str> {
        self.current_group.as_deref()
    }

    /// Make `name` the current group
    pub fn set_current_group(&mut self, name: &str) {
        if self.current_group.as_deref() != Some(name) {
            log::debug!("[PROGMAN] current group -> {}", name);
        }
        self.current_group = Some(name.to_string());
    }

    /// Forget the current group if it is `name`
    ///
    /// Returns true if the current group was cleared.
    pub fn clear_if_current(&mut self, name: &str) -> bool {
        let is_current = self
            .current_group
            .as_deref()
            .is_some_and(|current| current.eq_ignore_ascii_case(name));

        if is_current {
            log::debug!("[PROGMAN] current group cleared ({})", name);
            self.current_group = None;
        }

        is_current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_has_no_current_group() {
        let session = Session::new();
        assert_eq!(session.current_group(), None);
    }

    #[test]
    fn test_set_and_replace_current_group() {
        let mut session = Session::new();
        session.set_current_group("Group1");
        session.set_current_group("Group2");
        assert_eq!(session.current_group(), Some("Group2"));
    }

    #[test]
    fn test_clear_only_matching_group() {
        let mut session = Session::new();
        session.set_current_group("Group2");

        assert!(!session.clear_if_current("Group1"));
        assert_eq!(session.current_group(), Some("Group2"));

        assert!(session.clear_if_current("group2"));
        assert_eq!(session.current_group(), None);
    }
}
