//! KERNEL32 - Windows Base API
//!
//! Handle-based process primitives whose objects live behind a handle
//! broker rather than in the calling process.
//!
//! # Components
//!
//! - **pipe**: CreatePipe and the in-process pipe broker
//! - **error**: Win32 error codes and the per-thread last error
//!
//! # References
//!
//! - `public/sdk/inc/winbase.h` - CreatePipe, SECURITY_ATTRIBUTES
//! - `public/sdk/inc/winerror.h` - Win32 error codes

pub mod error;
pub mod pipe;

pub use error::{get_last_error, set_last_error, Win32Error};
pub use pipe::{create_pipe, HandleBroker, LocalBroker, SecurityAttributes};

/// Object handle
pub type HANDLE = usize;

/// Null handle value
pub const NULL_HANDLE: HANDLE = 0;

/// Win32 BOOL
pub type BOOL = i32;

pub const TRUE: BOOL = 1;
pub const FALSE: BOOL = 0;
