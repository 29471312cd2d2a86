//! Program Manager command table
//!
//! Command names are matched case-insensitively against a static table.
//! Each entry carries the accepted argument counts so a whole
//! transaction can be validated before anything executes.

use super::error::{ProgmanError, Result};
use super::parser::Command;

// ============================================================================
// Command Kinds
// ============================================================================

/// Known Program Manager commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// CreateGroup(GroupName)
    CreateGroup,
    /// ShowGroup(GroupName, ShowCommand)
    ShowGroup,
    /// DeleteGroup(GroupName)
    DeleteGroup,
    /// AddItem(CmdLine[, Name])
    AddItem,
    /// DeleteItem(ItemName)
    DeleteItem,
}

/// Lowercase name to command lookup table
static COMMAND_TABLE: &[(&str, CommandKind)] = &[
    ("creategroup", CommandKind::CreateGroup),
    ("showgroup", CommandKind::ShowGroup),
    ("deletegroup", CommandKind::DeleteGroup),
    ("additem", CommandKind::AddItem),
    ("deleteitem", CommandKind::DeleteItem),
];

impl CommandKind {
    /// Look up a command by name, ignoring case
    pub fn lookup(name: &str) -> Option<CommandKind> {
        let lower = name.to_ascii_lowercase();
        COMMAND_TABLE
            .iter()
            .find(|(key, _)| *key == lower)
            .map(|&(_, kind)| kind)
    }

    /// Canonical spelling
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::CreateGroup => "CreateGroup",
            CommandKind::ShowGroup => "ShowGroup",
            CommandKind::DeleteGroup => "DeleteGroup",
            CommandKind::AddItem => "AddItem",
            CommandKind::DeleteItem => "DeleteItem",
        }
    }

    /// Inclusive range of accepted argument counts
    pub fn arity(self) -> (usize, usize) {
        match self {
            CommandKind::CreateGroup => (1, 1),
            CommandKind::ShowGroup => (2, 2),
            CommandKind::DeleteGroup => (1, 1),
            CommandKind::AddItem => (1, 2),
            CommandKind::DeleteItem => (1, 1),
        }
    }

    fn arity_text(self) -> &'static str {
        match self.arity() {
            (1, 1) => "1",
            (2, 2) => "2",
            _ => "1 or 2",
        }
    }
}

// ============================================================================
// Validated Commands
// ============================================================================

/// A command whose name and arity have been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCommand {
    pub kind: CommandKind,
    pub args: Vec<String>,
}

impl ValidCommand {
    /// Argument at `index`; callers only ask for indices inside the arity
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(String::as_str).unwrap_or("")
    }

    /// Optional trailing argument
    pub fn opt_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Resolve a parsed command against the table
///
/// A known name written without an argument list is rejected the same
/// way as a wrong argument count.
pub fn validate(command: Command) -> Result<ValidCommand> {
    let kind = CommandKind::lookup(&command.name)
        .ok_or_else(|| ProgmanError::UnknownCommand(command.name.clone()))?;

    let (min, max) = kind.arity();
    let got = command.arity();

    if !command.has_arg_list || got < min || got > max {
        return Err(ProgmanError::ArityMismatch {
            command: kind.name(),
            expected: kind.arity_text(),
            got,
        });
    }

    Ok(ValidCommand {
        kind,
        args: command.args,
    })
}
