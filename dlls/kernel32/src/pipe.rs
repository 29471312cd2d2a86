//! Anonymous Pipes
//!
//! CreatePipe is a single request to the handle broker: the caller
//! decides whether the new handles are inheritable and the broker
//! returns a read handle and a write handle for one byte-stream pipe.
//!
//! Pipe semantics of the in-process broker:
//! - Byte stream, one reader end and one writer end
//! - Writes are truncated to the free buffer space
//! - Reading an empty pipe returns 0 bytes
//! - Writing after the read end closed fails with ERROR_BROKEN_PIPE

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use spin::Mutex;

use crate::error::{set_last_error, Win32Error};
use crate::{BOOL, FALSE, HANDLE, TRUE};

/// Buffer size used when the caller passes 0
pub const DEFAULT_PIPE_SIZE: u32 = 4096;

/// Maximum open handles per broker
pub const MAX_HANDLES: usize = 1024;

/// Handle values are multiples of this
const HANDLE_ALIGN: usize = 4;

// ============================================================================
// Security Attributes
// ============================================================================

/// SECURITY_ATTRIBUTES
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityAttributes {
    /// nLength, size of the structure in bytes
    pub length: u32,
    /// lpSecurityDescriptor
    pub security_descriptor: usize,
    /// bInheritHandle
    pub inherit_handle: bool,
}

/// sizeof(SECURITY_ATTRIBUTES)
pub const SECURITY_ATTRIBUTES_SIZE: u32 = core::mem::size_of::<SecurityAttributes>() as u32;

impl SecurityAttributes {
    pub const fn new(inherit_handle: bool) -> Self {
        Self {
            length: SECURITY_ATTRIBUTES_SIZE,
            security_descriptor: 0,
            inherit_handle,
        }
    }

    /// Whether handles created with these attributes are inheritable
    ///
    /// A structure claiming a length smaller than its real size is ignored.
    pub fn inherit(attributes: Option<&SecurityAttributes>) -> bool {
        attributes.is_some_and(|sa| sa.length >= SECURITY_ATTRIBUTES_SIZE && sa.inherit_handle)
    }
}

// ============================================================================
// Broker Protocol
// ============================================================================

/// create_pipe request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatePipeRequest {
    pub inherit: bool,
    /// Suggested buffer size, 0 for the default
    pub size: u32,
}

/// create_pipe reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatePipeReply {
    pub handle_read: HANDLE,
    pub handle_write: HANDLE,
}

/// Owner of kernel objects and the handles that name them
pub trait HandleBroker {
    fn create_pipe(&self, request: CreatePipeRequest) -> Result<CreatePipeReply, Win32Error>;
}

/// Create an anonymous pipe
///
/// Returns `(read, write)`. A broker failure is returned unchanged.
pub fn create_pipe<B: HandleBroker + ?Sized>(
    broker: &B,
    attributes: Option<&SecurityAttributes>,
    size: u32,
) -> Result<(HANDLE, HANDLE), Win32Error> {
    let request = CreatePipeRequest {
        inherit: SecurityAttributes::inherit(attributes),
        size,
    };

    let reply = broker.create_pipe(request)?;
    Ok((reply.handle_read, reply.handle_write))
}

/// CreatePipe with BOOL return and last-error reporting
pub fn create_pipe_api<B: HandleBroker + ?Sized>(
    broker: &B,
    read_pipe: &mut HANDLE,
    write_pipe: &mut HANDLE,
    attributes: Option<&SecurityAttributes>,
    size: u32,
) -> BOOL {
    match create_pipe(broker, attributes, size) {
        Ok((read, write)) => {
            *read_pipe = read;
            *write_pipe = write;
            TRUE
        }
        Err(err) => {
            set_last_error(err.code());
            FALSE
        }
    }
}

// ============================================================================
// Local Broker
// ============================================================================

/// Pipe end a handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeEnd {
    Read,
    Write,
}

struct PipeObject {
    buffer: VecDeque<u8>,
    capacity: usize,
    read_open: bool,
    write_open: bool,
}

struct HandleEntry {
    pipe: Arc<Mutex<PipeObject>>,
    end: PipeEnd,
    inherit: bool,
}

/// In-process handle broker
pub struct LocalBroker {
    handles: Mutex<BTreeMap<HANDLE, HandleEntry>>,
    next_handle: AtomicUsize,
}

impl Default for LocalBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBroker {
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(BTreeMap::new()),
            next_handle: AtomicUsize::new(HANDLE_ALIGN),
        }
    }

    fn allocate_handle(&self) -> HANDLE {
        self.next_handle.fetch_add(HANDLE_ALIGN, Ordering::Relaxed)
    }

    fn entry<F, R>(&self, handle: HANDLE, f: F) -> Result<R, Win32Error>
    where
        F: FnOnce(&HandleEntry) -> Result<R, Win32Error>,
    {
        let handles = self.handles.lock();
        let entry = handles.get(&handle).ok_or(Win32Error::INVALID_HANDLE)?;
        f(entry)
    }

    /// WriteFile on a pipe write handle; returns bytes written
    pub fn write(&self, handle: HANDLE, data: &[u8]) -> Result<usize, Win32Error> {
        self.entry(handle, |entry| {
            if entry.end != PipeEnd::Write {
                return Err(Win32Error::ACCESS_DENIED);
            }

            let mut pipe = entry.pipe.lock();
            if !pipe.read_open {
                return Err(Win32Error::BROKEN_PIPE);
            }

            let available = pipe.capacity.saturating_sub(pipe.buffer.len());
            let len = data.len().min(available);
            pipe.buffer.extend(&data[..len]);
            Ok(len)
        })
    }

    /// ReadFile on a pipe read handle; returns bytes read
    pub fn read(&self, handle: HANDLE, buffer: &mut [u8]) -> Result<usize, Win32Error> {
        self.entry(handle, |entry| {
            if entry.end != PipeEnd::Read {
                return Err(Win32Error::ACCESS_DENIED);
            }

            let mut pipe = entry.pipe.lock();
            if pipe.buffer.is_empty() && !pipe.write_open {
                log::trace!("[KERNEL32] read {:#x}: end of pipe", handle);
            }

            let len = buffer.len().min(pipe.buffer.len());
            for (slot, byte) in buffer.iter_mut().zip(pipe.buffer.drain(..len)) {
                *slot = byte;
            }
            Ok(len)
        })
    }

    /// Bytes waiting in the pipe behind `handle`
    pub fn bytes_available(&self, handle: HANDLE) -> Result<usize, Win32Error> {
        self.entry(handle, |entry| Ok(entry.pipe.lock().buffer.len()))
    }

    /// Whether `handle` would be inherited by a child process
    pub fn is_inheritable(&self, handle: HANDLE) -> Result<bool, Win32Error> {
        self.entry(handle, |entry| Ok(entry.inherit))
    }

    /// CloseHandle
    pub fn close_handle(&self, handle: HANDLE) -> Result<(), Win32Error> {
        let entry = self
            .handles
            .lock()
            .remove(&handle)
            .ok_or(Win32Error::INVALID_HANDLE)?;

        let mut pipe = entry.pipe.lock();
        match entry.end {
            PipeEnd::Read => {
                pipe.read_open = false;
                pipe.buffer.clear();
            }
            PipeEnd::Write => pipe.write_open = false,
        }

        log::trace!("[KERNEL32] handle {:#x} closed", handle);
        Ok(())
    }

    /// Number of open handles
    pub fn handle_count(&self) -> usize {
        self.handles.lock().len()
    }
}

impl HandleBroker for LocalBroker {
    fn create_pipe(&self, request: CreatePipeRequest) -> Result<CreatePipeReply, Win32Error> {
        let mut handles = self.handles.lock();
        if handles.len() + 2 > MAX_HANDLES {
            return Err(Win32Error::NO_SYSTEM_RESOURCES);
        }

        let capacity = match request.size {
            0 => DEFAULT_PIPE_SIZE,
            size => size,
        } as usize;

        let pipe = Arc::new(Mutex::new(PipeObject {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            read_open: true,
            write_open: true,
        }));

        let handle_read = self.allocate_handle();
        let handle_write = self.allocate_handle();

        handles.insert(
            handle_read,
            HandleEntry {
                pipe: Arc::clone(&pipe),
                end: PipeEnd::Read,
                inherit: request.inherit,
            },
        );
        handles.insert(
            handle_write,
            HandleEntry {
                pipe,
                end: PipeEnd::Write,
                inherit: request.inherit,
            },
        );

        log::debug!(
            "[KERNEL32] pipe created: read {:#x} write {:#x} size {} inherit {}",
            handle_read,
            handle_write,
            capacity,
            request.inherit
        );

        Ok(CreatePipeReply {
            handle_read,
            handle_write,
        })
    }
}
