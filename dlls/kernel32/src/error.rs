//! Win32 Error Codes
//!
//! Errors carry the raw `ERROR_*` value so that a broker's failure can
//! be handed to the caller unchanged.

use std::cell::Cell;

use thiserror::Error;

/// Win32 error codes (ERROR_*)
pub mod codes {
    pub const ERROR_SUCCESS: u32 = 0;
    pub const ERROR_ACCESS_DENIED: u32 = 5;
    pub const ERROR_INVALID_HANDLE: u32 = 6;
    pub const ERROR_NOT_ENOUGH_MEMORY: u32 = 8;
    pub const ERROR_INVALID_PARAMETER: u32 = 87;
    pub const ERROR_BROKEN_PIPE: u32 = 109;
    pub const ERROR_NO_SYSTEM_RESOURCES: u32 = 1450;
}

/// A failed Win32 call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{} ({})", error_name(.0), .0)]
pub struct Win32Error(pub u32);

impl Win32Error {
    pub const ACCESS_DENIED: Win32Error = Win32Error(codes::ERROR_ACCESS_DENIED);
    pub const INVALID_HANDLE: Win32Error = Win32Error(codes::ERROR_INVALID_HANDLE);
    pub const NOT_ENOUGH_MEMORY: Win32Error = Win32Error(codes::ERROR_NOT_ENOUGH_MEMORY);
    pub const INVALID_PARAMETER: Win32Error = Win32Error(codes::ERROR_INVALID_PARAMETER);
    pub const BROKEN_PIPE: Win32Error = Win32Error(codes::ERROR_BROKEN_PIPE);
    pub const NO_SYSTEM_RESOURCES: Win32Error = Win32Error(codes::ERROR_NO_SYSTEM_RESOURCES);

    /// Raw ERROR_* value
    pub const fn code(self) -> u32 {
        self.0
    }
}

/// Symbolic name of an error code
fn error_name(code: &u32) -> &'static str {
    match *code {
        codes::ERROR_SUCCESS => "ERROR_SUCCESS",
        codes::ERROR_ACCESS_DENIED => "ERROR_ACCESS_DENIED",
        codes::ERROR_INVALID_HANDLE => "ERROR_INVALID_HANDLE",
        codes::ERROR_NOT_ENOUGH_MEMORY => "ERROR_NOT_ENOUGH_MEMORY",
        codes::ERROR_INVALID_PARAMETER => "ERROR_INVALID_PARAMETER",
        codes::ERROR_BROKEN_PIPE => "ERROR_BROKEN_PIPE",
        codes::ERROR_NO_SYSTEM_RESOURCES => "ERROR_NO_SYSTEM_RESOURCES",
        _ => "Win32 error",
    }
}

thread_local! {
    static LAST_ERROR: Cell<u32> = const { Cell::new(codes::ERROR_SUCCESS) };
}

/// GetLastError
pub fn get_last_error() -> u32 {
    LAST_ERROR.with(Cell::get)
}

/// SetLastError
pub fn set_last_error(code: u32) {
    LAST_ERROR.with(|last| last.set(code));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_code() {
        assert_eq!(Win32Error::BROKEN_PIPE.to_string(), "ERROR_BROKEN_PIPE (109)");
        assert_eq!(Win32Error(1234).to_string(), "Win32 error (1234)");
    }

    #[test]
    fn test_last_error_is_per_thread() {
        set_last_error(codes::ERROR_INVALID_HANDLE);
        assert_eq!(get_last_error(), codes::ERROR_INVALID_HANDLE);

        let other = std::thread::spawn(get_last_error).join().unwrap();
        assert_eq!(other, codes::ERROR_SUCCESS);
    }
}
