//! Program Manager Command Interpreter
//!
//! Executes the bracketed command language Program Manager accepts over
//! DDE:
//!
//! ```text
//! [CreateGroup(Accessories)][AddItem(notepad.exe,"Text Editor")]
//! ```
//!
//! Commands run in order, each as soon as it has been parsed. A
//! malformed, unknown or wrongly sized command ends the sequence; the
//! commands before it keep their effects. A command that fails while
//! running does not stop the ones after it. Either way the transaction
//! fails.
//!
//! # Commands
//!
//! - `CreateGroup(name)`
//! - `ShowGroup(name, show_cmd)`
//! - `DeleteGroup(name)`
//! - `AddItem(cmdline[, name])`
//! - `DeleteItem(name)`

pub mod command;
mod dispatch;
pub mod error;
pub mod parser;
pub mod session;
pub mod tokenizer;

use spin::Mutex;

use crate::config::ProgmanConfig;
use crate::dde::{DMLERR_NOTPROCESSED, DMLERR_NO_ERROR};
use crate::shellfolder::ProgramsFolder;
use crate::window::WindowManager;

use command::{CommandKind, ValidCommand};
use dispatch::Dispatcher;
use parser::parse_command;
use session::Session;
use tokenizer::{decode_payload, Tokenizer};

pub use error::{ProgmanError, Result};

// ============================================================================
// Transaction Report
// ============================================================================

/// Outcome of one execute transaction
#[derive(Debug, Default)]
pub struct TransactionReport {
    /// Syntax, dispatch or arity failure that ended the sequence
    aborted: Option<ProgmanError>,
    /// Per-command results, in order
    results: Vec<(CommandKind, Result<()>)>,
}

impl TransactionReport {
    /// Whether the whole sequence ran and every command succeeded
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.results.iter().all(|(_, result)| result.is_ok())
    }

    /// Legacy DDEML code for the whole transaction
    pub fn dde_code(&self) -> u32 {
        if self.is_success() {
            DMLERR_NO_ERROR
        } else {
            self.first_error()
                .map(ProgmanError::dde_code)
                .unwrap_or(DMLERR_NOTPROCESSED)
        }
    }

    /// Failure that stopped the sequence early, if any
    pub fn aborted(&self) -> Option<&ProgmanError> {
        self.aborted.as_ref()
    }

    /// Commands that executed, with their results
    pub fn results(&self) -> &[(CommandKind, Result<()>)] {
        &self.results
    }

    /// Number of commands that executed
    pub fn executed(&self) -> usize {
        self.results.len()
    }

    /// First failure in sequence order
    pub fn first_error(&self) -> Option<&ProgmanError> {
        self.results
            .iter()
            .find_map(|(_, result)| result.as_ref().err())
            .or(self.aborted.as_ref())
    }
}

// ============================================================================
// Server
// ============================================================================

/// Program Manager instance shared by all conversations
pub struct ProgmanServer {
    config: ProgmanConfig,
    folder: ProgramsFolder,
    windows: WindowManager,
    session: Mutex<Session>,
}

impl ProgmanServer {
    /// Create a server for the configured Programs root
    pub fn new(config: ProgmanConfig) -> Self {
        let folder = ProgramsFolder::new(config.programs_root());
        log::info!("[PROGMAN] Program Manager initialized ({})", folder.root().display());

        Self {
            config,
            folder,
            windows: WindowManager::new(),
            session: Mutex::new(Session::new()),
        }
    }

    pub fn config(&self) -> &ProgmanConfig {
        &self.config
    }

    /// Group and item store
    pub fn folder(&self) -> &ProgramsFolder {
        &self.folder
    }

    /// Group window table
    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    /// Name of the current group
    pub fn current_group(&self) -> Option<String> {
        self.session.lock().current_group().map(str::to_string)
    }

    /// Names of all groups under the Programs root
    pub fn group_names(&self) -> Result<Vec<String>> {
        let _session = self.session.lock();
        self.folder.groups()
    }

    /// Execute a raw DDE payload
    pub fn execute_transaction(&self, data: &[u8]) -> TransactionReport {
        self.execute_str(&decode_payload(data))
    }

    /// Execute a transaction string
    pub fn execute_str(&self, text: &str) -> TransactionReport {
        let mut report = TransactionReport::default();

        // Held for the whole transaction, filesystem work included, so
        // transactions from different conversations never interleave.
        // A contending thread spins until this one finishes.
        let mut session = self.session.lock();
        let mut dispatcher = Dispatcher {
            config: &self.config,
            folder: &self.folder,
            windows: &self.windows,
            session: &mut *session,
        };

        for token in Tokenizer::new(text) {
            let command = match token
                .map_err(|err| ProgmanError::MalformedSyntax(err.to_string()))
                .and_then(prepare_command)
            {
                Ok(command) => command,
                Err(err) => {
                    log::warn!(
                        "[PROGMAN] transaction stopped after {} command(s): {}",
                        report.executed(),
                        err
                    );
                    report.aborted = Some(err);
                    return report;
                }
            };

            let result = dispatcher.run(&command);
            if let Err(err) = &result {
                if err.is_resource_failure() {
                    log::error!("[PROGMAN] {} failed: {}", command.kind.name(), err);
                } else {
                    log::warn!("[PROGMAN] {} failed: {}", command.kind.name(), err);
                }
            }
            report.results.push((command.kind, result));
        }

        if report.results.is_empty() {
            log::warn!("[PROGMAN] transaction has no commands");
            report.aborted = Some(ProgmanError::MalformedSyntax("no commands".to_string()));
        }

        report
    }
}

/// Parse one command body and check it against the dispatch table
fn prepare_command(body: &str) -> Result<ValidCommand> {
    let parsed = parse_command(body)
        .map_err(|err| ProgmanError::MalformedSyntax(format!("[{}]: {}", body, err)))?;
    command::validate(parsed)
}
