//! SHELL32 - Windows Shell Library
//!
//! User-mode implementation of the parts of shell32.dll that unmodified
//! applications reach through the Program Manager DDE interface.
//!
//! # Components
//!
//! - **progman**: Program Manager command interpreter (CreateGroup, AddItem, ...)
//! - **dde**: DDEML conversation table and transaction routing
//! - **shellfolder**: Group directories and items under the Programs folder
//! - **shelllink**: Shell link (.lnk) reader and writer
//! - **shellpath**: Executable search and path helpers
//! - **window**: Explorer window table for group windows
//! - **config**: Programs folder and title configuration
//!
//! # References
//!
//! Based on Windows Server 2003:
//! - `shell/shell32/dde.cpp` - Program Manager DDE
//! - `public/sdk/inc/ddeml.h` - DDE Management Library
//! - `public/sdk/inc/shlobj.h` - Shell links and special folders

pub mod config;
pub mod dde;
pub mod progman;
pub mod shellfolder;
pub mod shelllink;
pub mod shellpath;
pub mod window;

pub use config::ProgmanConfig;
pub use dde::DdeServer;
pub use progman::{ProgmanError, ProgmanServer, TransactionReport};

/// Service and topic name of the Program Manager DDE server
pub const PROGMAN_SERVICE: &str = "PROGMAN";
