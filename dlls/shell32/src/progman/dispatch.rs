//! Program Manager command handlers
//!
//! One handler per `CommandKind`. A command runs as soon as it is parsed,
//! with the session lock held. Handlers report their own failure and
//! never undo what an earlier command did.

use std::fs;
use std::path::PathBuf;

use super::command::{CommandKind, ValidCommand};
use super::error::{ProgmanError, Result};
use super::session::Session;
use crate::config::ProgmanConfig;
use crate::shellfolder::{GroupEntry, ProgramsFolder};
use crate::shelllink::ShellLink;
use crate::shellpath::{display_name_for, find_executable, has_path_separator, host_path};
use crate::window::{group_window_title, ShowCommand, WindowManager, WindowStyle, CABINET_CLASS};

/// Everything a handler may touch
pub(crate) struct Dispatcher<'a> {
    pub config: &'a ProgmanConfig,
    pub folder: &'a ProgramsFolder,
    pub windows: &'a WindowManager,
    pub session: &'a mut Session,
}

impl Dispatcher<'_> {
    /// Execute one validated command
    pub fn run(&mut self, command: &ValidCommand) -> Result<()> {
        log::debug!("[PROGMAN] {}({})", command.kind.name(), command.args.join(","));

        match command.kind {
            CommandKind::CreateGroup => self.create_group(command.arg(0)),
            CommandKind::ShowGroup => self.show_group(command.arg(0), command.arg(1)),
            CommandKind::DeleteGroup => self.delete_group(command.arg(0)),
            CommandKind::AddItem => self.add_item(command.arg(0), command.opt_arg(1)),
            CommandKind::DeleteItem => self.delete_item(command.arg(0)),
        }
    }

    // ========================================================================
    // Groups
    // ========================================================================

    fn create_group(&mut self, name: &str) -> Result<()> {
        ProgramsFolder::validate_name("CreateGroup", name)?;

        let (group, created) = self.folder.create_group(name)?;
        if created {
            log::info!("[PROGMAN] group created: {}", group.name);
        } else {
            log::debug!("[PROGMAN] group {} already exists", group.name);
        }

        self.session.set_current_group(&group.name);
        self.surface_window(&group.name, ShowCommand::ShowNormal)
    }

    fn show_group(&mut self, name: &str, flag: &str) -> Result<()> {
        ProgramsFolder::validate_name("ShowGroup", name)?;

        let flag: i32 = flag
            .parse()
            .map_err(|_| ProgmanError::invalid("ShowGroup", flag))?;

        let group = self
            .folder
            .find_group(name)
            .ok_or_else(|| ProgmanError::not_found("group", name))?;

        // Hidden or unknown display states still bring the window up
        let cmd = ShowCommand::from_raw(flag)
            .filter(|&cmd| cmd != ShowCommand::Hide)
            .unwrap_or(ShowCommand::ShowNormal);

        self.session.set_current_group(&group.name);
        self.surface_window(&group.name, cmd)
    }

    fn delete_group(&mut self, name: &str) -> Result<()> {
        ProgramsFolder::validate_name("DeleteGroup", name)?;

        let group = self.folder.delete_group(name)?;
        log::info!("[PROGMAN] group deleted: {}", group.name);

        if let Some(hwnd) = self.windows.find_window(Some(CABINET_CLASS), &self.title(&group.name)) {
            self.windows.destroy_window(hwnd)?;
        }

        self.session.clear_if_current(&group.name);
        Ok(())
    }

    fn title(&self, group: &str) -> String {
        group_window_title(self.folder.root(), group, self.config.full_path_title)
    }

    fn surface_window(&self, group: &str, cmd: ShowCommand) -> Result<()> {
        let title = self.title(group);
        let hwnd = match self.windows.find_window(Some(CABINET_CLASS), &title) {
            Some(hwnd) => hwnd,
            None => self
                .windows
                .create_window(CABINET_CLASS, &title, WindowStyle::OVERLAPPEDWINDOW)?,
        };
        self.windows.show_window(hwnd, cmd)?;
        Ok(())
    }

    // ========================================================================
    // Items
    // ========================================================================

    fn current_group(&self, command: &'static str) -> Result<GroupEntry> {
        let name = self
            .session
            .current_group()
            .ok_or(ProgmanError::MissingCurrentGroup(command))?;

        self.folder
            .find_group(name)
            .ok_or_else(|| ProgmanError::not_found("group", name))
    }

    fn add_item(&mut self, program: &str, name: Option<&str>) -> Result<()> {
        let group = self.current_group("AddItem")?;
        let target = self.resolve_target(program)?;

        let name = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => display_name_for(&target),
        };
        ProgramsFolder::validate_name("AddItem", &name)?;

        let link = ShellLink::for_target(&target)?.with_description(name.as_str());
        let replaced = self.folder.write_item(&group, &name, &link)?;

        if replaced {
            log::debug!("[PROGMAN] item {} in {} replaced", name, group.name);
        } else {
            log::info!("[PROGMAN] item added: {} -> {}", name, target.display());
        }
        Ok(())
    }

    /// Resolve an AddItem command line to an existing file
    fn resolve_target(&self, program: &str) -> Result<PathBuf> {
        if program.is_empty() {
            return Err(ProgmanError::invalid("AddItem", program));
        }

        if has_path_separator(program) {
            let path = host_path(program);
            if !path.is_file() {
                return Err(ProgmanError::not_found("file", program));
            }
            return Ok(fs::canonicalize(&path)?);
        }

        find_executable(
            program,
            &self.config.search_path,
            &self.config.executable_extensions,
        )
        .ok_or_else(|| ProgmanError::not_found("program", program))
    }

    fn delete_item(&mut self, name: &str) -> Result<()> {
        let group = self.current_group("DeleteItem")?;
        ProgramsFolder::validate_name("DeleteItem", name)?;

        let path = self.folder.delete_item(&group, name)?;
        log::info!("[PROGMAN] item deleted: {}", path.display());
        Ok(())
    }
}
