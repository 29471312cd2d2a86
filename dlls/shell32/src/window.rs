//! Group Window Table
//!
//! Explorer windows opened for program groups. Each group shown through
//! Program Manager gets one top-level window of class `CabinetWClass`
//! titled with the group name (or its full path when the cabinet state
//! asks for full path titles).
//!
//! # Features
//!
//! - Handle allocation with index+type encoding
//! - Find by class and title (FindWindow semantics)
//! - Show commands (SW_*) and visibility tracking
//! - Z-order on activation
//!
//! # References
//!
//! - `public/sdk/inc/winuser.h` - FindWindow, ShowWindow, DestroyWindow

use core::sync::atomic::{AtomicU32, Ordering};
use std::path::Path;

use bitflags::bitflags;
use spin::Mutex;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Explorer folder window class
pub const CABINET_CLASS: &str = "CabinetWClass";

/// Maximum number of group windows
pub const MAX_WINDOWS: usize = 256;

/// Object type tag stored in the handle's high byte
const WINDOW_OBJECT_TYPE: u32 = 1;

// ============================================================================
// Handle
// ============================================================================

/// Window handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hwnd(u32);

impl Hwnd {
    pub const NULL: Hwnd = Hwnd(0);

    const fn new(index: u16) -> Self {
        Hwnd((WINDOW_OBJECT_TYPE << 24) | index as u32)
    }

    /// Slot index
    pub const fn index(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Check if handle is valid
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Raw handle value
    pub const fn raw(self) -> u32 {
        self.0
    }
}

// ============================================================================
// Show Commands and Styles
// ============================================================================

/// ShowWindow commands (SW_*)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ShowCommand {
    #[default]
    Hide = 0,
    ShowNormal = 1,
    ShowMinimized = 2,
    ShowMaximized = 3,
    ShowNoActivate = 4,
    Show = 5,
    Minimize = 6,
    ShowMinNoActive = 7,
    ShowNA = 8,
    Restore = 9,
    ShowDefault = 10,
    ForceMinimize = 11,
}

impl ShowCommand {
    /// Decode an SW_* value
    pub fn from_raw(value: i32) -> Option<Self> {
        Some(match value {
            0 => ShowCommand::Hide,
            1 => ShowCommand::ShowNormal,
            2 => ShowCommand::ShowMinimized,
            3 => ShowCommand::ShowMaximized,
            4 => ShowCommand::ShowNoActivate,
            5 => ShowCommand::Show,
            6 => ShowCommand::Minimize,
            7 => ShowCommand::ShowMinNoActive,
            8 => ShowCommand::ShowNA,
            9 => ShowCommand::Restore,
            10 => ShowCommand::ShowDefault,
            11 => ShowCommand::ForceMinimize,
            _ => return None,
        })
    }
}

bitflags! {
    /// Window styles (WS_*)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WindowStyle: u32 {
        const OVERLAPPED = 0x00000000;
        const MINIMIZE = 0x20000000;
        const VISIBLE = 0x10000000;
        const MAXIMIZE = 0x01000000;
        const CAPTION = 0x00C00000;
        const SYSMENU = 0x00080000;
        const THICKFRAME = 0x00040000;
        const MINIMIZEBOX = 0x00020000;
        const MAXIMIZEBOX = 0x00010000;
        const OVERLAPPEDWINDOW = Self::CAPTION.bits()
            | Self::SYSMENU.bits()
            | Self::THICKFRAME.bits()
            | Self::MINIMIZEBOX.bits()
            | Self::MAXIMIZEBOX.bits();
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Window table failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window table full")]
    TableFull,

    #[error("invalid window handle {0:#x}")]
    InvalidHandle(u32),
}

// ============================================================================
// Window
// ============================================================================

/// Snapshot of a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub hwnd: Hwnd,
    pub class_name: String,
    pub title: String,
    pub style: WindowStyle,
    /// Last show command applied
    pub show_cmd: ShowCommand,
    pub z_order: u32,
}

impl Window {
    pub fn is_visible(&self) -> bool {
        self.style.contains(WindowStyle::VISIBLE)
    }

    fn apply(&mut self, cmd: ShowCommand) {
        self.show_cmd = cmd;
        match cmd {
            ShowCommand::Hide => {
                self.style.remove(WindowStyle::VISIBLE);
            }
            ShowCommand::ShowMinimized
            | ShowCommand::Minimize
            | ShowCommand::ShowMinNoActive
            | ShowCommand::ForceMinimize => {
                self.style.insert(WindowStyle::VISIBLE | WindowStyle::MINIMIZE);
                self.style.remove(WindowStyle::MAXIMIZE);
            }
            ShowCommand::ShowMaximized => {
                self.style.insert(WindowStyle::VISIBLE | WindowStyle::MAXIMIZE);
                self.style.remove(WindowStyle::MINIMIZE);
            }
            _ => {
                self.style.insert(WindowStyle::VISIBLE);
                self.style.remove(WindowStyle::MINIMIZE | WindowStyle::MAXIMIZE);
            }
        }
    }
}

/// Title of a group's window
pub fn group_window_title(programs_root: &Path, group: &str, full_path_title: bool) -> String {
    if full_path_title {
        let root = programs_root.to_string_lossy();
        let root = root.trim_end_matches(['\\', '/']);
        format!("{}\\{}", root, group)
    } else {
        group.to_string()
    }
}

// ============================================================================
// Window Manager
// ============================================================================

/// Window table owned by one Program Manager server
pub struct WindowManager {
    slots: Mutex<Vec<Option<Window>>>,
    next_z_order: AtomicU32,
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowManager {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            next_z_order: AtomicU32::new(1),
        }
    }

    /// Create a top-level window
    ///
    /// Slot 0 is never used so a handle of zero stays invalid.
    pub fn create_window(
        &self,
        class_name: &str,
        title: &str,
        style: WindowStyle,
    ) -> Result<Hwnd, WindowError> {
        let mut slots = self.slots.lock();

        if slots.is_empty() {
            slots.push(None);
        }

        let index = match slots.iter().skip(1).position(Option::is_none) {
            Some(free) => free + 1,
            None if slots.len() < MAX_WINDOWS => {
                slots.push(None);
                slots.len() - 1
            }
            None => return Err(WindowError::TableFull),
        };

        let hwnd = Hwnd::new(index as u16);
        slots[index] = Some(Window {
            hwnd,
            class_name: class_name.to_string(),
            title: title.to_string(),
            style,
            show_cmd: if style.contains(WindowStyle::VISIBLE) {
                ShowCommand::ShowNormal
            } else {
                ShowCommand::Hide
            },
            z_order: self.next_z_order.fetch_add(1, Ordering::Relaxed),
        });

        log::debug!("[PROGMAN] window {:#x} created: {} \"{}\"", hwnd.raw(), class_name, title);
        Ok(hwnd)
    }

    /// Find a window by class and title, ignoring ASCII case
    ///
    /// A `None` class matches any class.
    pub fn find_window(&self, class_name: Option<&str>, title: &str) -> Option<Hwnd> {
        let slots = self.slots.lock();
        slots
            .iter()
            .flatten()
            .filter(|w| class_name.map_or(true, |class| w.class_name.eq_ignore_ascii_case(class)))
            .find(|w| w.title.eq_ignore_ascii_case(title))
            .map(|w| w.hwnd)
    }

    /// Apply a show command; returns whether the window was visible
    pub fn show_window(&self, hwnd: Hwnd, cmd: ShowCommand) -> Result<bool, WindowError> {
        let z_order = self.next_z_order.fetch_add(1, Ordering::Relaxed);
        self.with_window_mut(hwnd, |wnd| {
            let was_visible = wnd.is_visible();
            wnd.apply(cmd);
            if wnd.is_visible() {
                wnd.z_order = z_order;
            }
            was_visible
        })
    }

    /// Destroy a window
    pub fn destroy_window(&self, hwnd: Hwnd) -> Result<(), WindowError> {
        let mut slots = self.slots.lock();
        let slot = slots
            .get_mut(hwnd.index() as usize)
            .filter(|slot| slot.as_ref().is_some_and(|w| w.hwnd == hwnd))
            .ok_or(WindowError::InvalidHandle(hwnd.raw()))?;

        *slot = None;
        log::debug!("[PROGMAN] window {:#x} destroyed", hwnd.raw());
        Ok(())
    }

    /// Window snapshot
    pub fn get_window(&self, hwnd: Hwnd) -> Option<Window> {
        let slots = self.slots.lock();
        slots
            .get(hwnd.index() as usize)
            .and_then(Option::as_ref)
            .filter(|w| w.hwnd == hwnd)
            .cloned()
    }

    pub fn is_window_visible(&self, hwnd: Hwnd) -> bool {
        self.get_window(hwnd).is_some_and(|w| w.is_visible())
    }

    /// Number of live windows
    pub fn count(&self) -> usize {
        self.slots.lock().iter().flatten().count()
    }

    fn with_window_mut<F, R>(&self, hwnd: Hwnd, f: F) -> Result<R, WindowError>
    where
        F: FnOnce(&mut Window) -> R,
    {
        let mut slots = self.slots.lock();
        match slots.get_mut(hwnd.index() as usize) {
            Some(Some(wnd)) if wnd.hwnd == hwnd => Ok(f(wnd)),
            _ => Err(WindowError::InvalidHandle(hwnd.raw())),
        }
    }
}
