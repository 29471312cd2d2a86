//! Program Manager DDE Server
//!
//! DDEML conversation endpoint for the `PROGMAN` service. Clients
//! connect on the `PROGMAN` topic and send execute transactions holding
//! bracketed command strings, or request the `Groups` item to list the
//! program groups.
//!
//! # Features
//!
//! - Bounded conversation table
//! - XTYP_EXECUTE routing to the command interpreter
//! - XTYP_REQUEST for the group list
//! - DDEML error codes
//!
//! # References
//!
//! - `public/sdk/inc/ddeml.h` - DDE Management Library

use std::sync::Arc;

use spin::Mutex;

use crate::progman::ProgmanServer;
use crate::PROGMAN_SERVICE;

// ============================================================================
// DDEML Error Codes (DMLERR_*)
// ============================================================================

/// No error
pub const DMLERR_NO_ERROR: u32 = 0;

/// First error code
pub const DMLERR_FIRST: u32 = 0x4000;

/// Advise ack timeout
pub const DMLERR_ADVACKTIMEOUT: u32 = DMLERR_FIRST;

/// Busy
pub const DMLERR_BUSY: u32 = DMLERR_FIRST + 1;

/// Data ack timeout
pub const DMLERR_DATAACKTIMEOUT: u32 = DMLERR_FIRST + 2;

/// DLL not initialized
pub const DMLERR_DLL_NOT_INITIALIZED: u32 = DMLERR_FIRST + 3;

/// DLL usage error
pub const DMLERR_DLL_USAGE: u32 = DMLERR_FIRST + 4;

/// Execute ack timeout
pub const DMLERR_EXECACKTIMEOUT: u32 = DMLERR_FIRST + 5;

/// Invalid parameter
pub const DMLERR_INVALIDPARAMETER: u32 = DMLERR_FIRST + 6;

/// Low memory
pub const DMLERR_LOW_MEMORY: u32 = DMLERR_FIRST + 7;

/// Memory error
pub const DMLERR_MEMORY_ERROR: u32 = DMLERR_FIRST + 8;

/// Not processed
pub const DMLERR_NOTPROCESSED: u32 = DMLERR_FIRST + 9;

/// No conversation established
pub const DMLERR_NO_CONV_ESTABLISHED: u32 = DMLERR_FIRST + 10;

/// Server died
pub const DMLERR_SERVER_DIED: u32 = DMLERR_FIRST + 14;

/// System error
pub const DMLERR_SYS_ERROR: u32 = DMLERR_FIRST + 15;

// ============================================================================
// DDEML Transaction Types (XTYP_*)
// ============================================================================

/// Execute transaction
pub const XTYP_EXECUTE: u32 = 0x0050 | 0x4000 | 0x0002;

/// Poke transaction
pub const XTYP_POKE: u32 = 0x0090 | 0x4000 | 0x0002;

/// Request transaction
pub const XTYP_REQUEST: u32 = 0x00B0 | 0x2000 | 0x0002;

// ============================================================================
// Handle Types
// ============================================================================

/// DDE conversation handle
pub type HCONV = usize;

/// DDE data handle
pub type HDDEDATA = usize;

/// Null HCONV
pub const NULL_HCONV: HCONV = 0;

/// Null HDDEDATA
pub const NULL_HDDEDATA: HDDEDATA = 0;

/// Data handle returned for a processed execute
pub const HDDEDATA_TRUE: HDDEDATA = 1;

/// Maximum conversations
pub const MAX_CONVERSATIONS: usize = 64;

/// Topic served next to the service name
pub const PROGMAN_TOPIC: &str = "PROGMAN";

/// Item listing the program groups
pub const GROUPS_ITEM: &str = "Groups";

/// Name of a DDEML error code
pub fn dmlerr_name(code: u32) -> &'static str {
    match code {
        DMLERR_NO_ERROR => "DMLERR_NO_ERROR",
        DMLERR_ADVACKTIMEOUT => "DMLERR_ADVACKTIMEOUT",
        DMLERR_BUSY => "DMLERR_BUSY",
        DMLERR_DATAACKTIMEOUT => "DMLERR_DATAACKTIMEOUT",
        DMLERR_DLL_NOT_INITIALIZED => "DMLERR_DLL_NOT_INITIALIZED",
        DMLERR_DLL_USAGE => "DMLERR_DLL_USAGE",
        DMLERR_EXECACKTIMEOUT => "DMLERR_EXECACKTIMEOUT",
        DMLERR_INVALIDPARAMETER => "DMLERR_INVALIDPARAMETER",
        DMLERR_LOW_MEMORY => "DMLERR_LOW_MEMORY",
        DMLERR_MEMORY_ERROR => "DMLERR_MEMORY_ERROR",
        DMLERR_NOTPROCESSED => "DMLERR_NOTPROCESSED",
        DMLERR_NO_CONV_ESTABLISHED => "DMLERR_NO_CONV_ESTABLISHED",
        DMLERR_SERVER_DIED => "DMLERR_SERVER_DIED",
        DMLERR_SYS_ERROR => "DMLERR_SYS_ERROR",
        _ => "DMLERR_UNKNOWN",
    }
}

// ============================================================================
// Conversation
// ============================================================================

/// Conversation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvState {
    /// Not connected
    Disconnected,
    /// Connected
    Connected,
}

/// DDE Conversation
#[derive(Debug, Clone, Copy)]
struct Conversation {
    /// Conversation handle
    handle: HCONV,
    /// State
    state: ConvState,
    /// Error of the last transaction
    last_error: u32,
    /// Transactions completed on this conversation
    transactions: u32,
}

impl Conversation {
    const fn new() -> Self {
        Self {
            handle: NULL_HCONV,
            state: ConvState::Disconnected,
            last_error: DMLERR_NO_ERROR,
            transactions: 0,
        }
    }
}

struct ConversationTable {
    entries: [Conversation; MAX_CONVERSATIONS],
    next_handle: HCONV,
}

/// Outcome of a client transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    /// Data handle: nonzero on success
    pub hdata: HDDEDATA,
    /// Returned data for request transactions
    pub data: Option<Vec<u8>>,
    /// DDEML error code
    pub error: u32,
}

impl TransactionResult {
    fn failed(error: u32) -> Self {
        Self {
            hdata: NULL_HDDEDATA,
            data: None,
            error,
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// DDE endpoint for the PROGMAN service
pub struct DdeServer {
    progman: Arc<ProgmanServer>,
    conversations: Mutex<ConversationTable>,
}

impl DdeServer {
    /// Register the PROGMAN service for `progman`
    pub fn new(progman: Arc<ProgmanServer>) -> Self {
        log::info!("[PROGMAN] DDE service {} registered", PROGMAN_SERVICE);
        Self {
            progman,
            conversations: Mutex::new(ConversationTable {
                entries: [const { Conversation::new() }; MAX_CONVERSATIONS],
                next_handle: 1,
            }),
        }
    }

    /// Interpreter behind this endpoint
    pub fn progman(&self) -> &Arc<ProgmanServer> {
        &self.progman
    }

    /// Connect to a service/topic pair (DdeConnect)
    pub fn connect(&self, service: &str, topic: &str) -> Result<HCONV, u32> {
        if !service.eq_ignore_ascii_case(PROGMAN_SERVICE) || !topic.eq_ignore_ascii_case(PROGMAN_TOPIC) {
            log::debug!("[PROGMAN] connect refused: {}|{}", service, topic);
            return Err(DMLERR_NO_CONV_ESTABLISHED);
        }

        let mut table = self.conversations.lock();
        let handle = table.next_handle;

        let slot = table
            .entries
            .iter_mut()
            .find(|conv| conv.state == ConvState::Disconnected)
            .ok_or(DMLERR_LOW_MEMORY)?;

        *slot = Conversation {
            handle,
            state: ConvState::Connected,
            ..Conversation::new()
        };
        table.next_handle += 1;

        log::debug!("[PROGMAN] conversation {:#x} connected", handle);
        Ok(handle)
    }

    /// Terminate a conversation (DdeDisconnect)
    pub fn disconnect(&self, hconv: HCONV) -> bool {
        let mut table = self.conversations.lock();
        match find_conversation(&mut table, hconv) {
            Some(conv) => {
                log::debug!(
                    "[PROGMAN] conversation {:#x} disconnected after {} transaction(s)",
                    hconv,
                    conv.transactions
                );
                *conv = Conversation::new();
                true
            }
            None => false,
        }
    }

    /// Number of open conversations
    pub fn conversation_count(&self) -> usize {
        let table = self.conversations.lock();
        table
            .entries
            .iter()
            .filter(|conv| conv.state == ConvState::Connected)
            .count()
    }

    /// Error of the last transaction on a conversation (DdeGetLastError)
    pub fn last_error(&self, hconv: HCONV) -> u32 {
        let mut table = self.conversations.lock();
        find_conversation(&mut table, hconv)
            .map(|conv| conv.last_error)
            .unwrap_or(DMLERR_NO_CONV_ESTABLISHED)
    }

    /// Run an execute transaction and return its DDEML code
    pub fn execute(&self, hconv: HCONV, data: &[u8]) -> u32 {
        self.client_transaction(hconv, data, None, XTYP_EXECUTE).error
    }

    /// Request the value of an item
    pub fn request(&self, hconv: HCONV, item: &str) -> Result<Vec<u8>, u32> {
        let result = self.client_transaction(hconv, &[], Some(item), XTYP_REQUEST);
        match result.data {
            Some(data) if result.error == DMLERR_NO_ERROR => Ok(data),
            _ => Err(result.error),
        }
    }

    /// DdeClientTransaction
    pub fn client_transaction(
        &self,
        hconv: HCONV,
        data: &[u8],
        item: Option<&str>,
        xtype: u32,
    ) -> TransactionResult {
        if !self.is_connected(hconv) {
            return TransactionResult::failed(DMLERR_NO_CONV_ESTABLISHED);
        }

        let result = match xtype {
            XTYP_EXECUTE => {
                let report = self.progman.execute_transaction(data);
                match report.dde_code() {
                    DMLERR_NO_ERROR => TransactionResult {
                        hdata: HDDEDATA_TRUE,
                        data: None,
                        error: DMLERR_NO_ERROR,
                    },
                    code => TransactionResult::failed(code),
                }
            }
            XTYP_REQUEST => match item {
                Some(item) if item.eq_ignore_ascii_case(GROUPS_ITEM) => self.groups_reply(),
                _ => TransactionResult::failed(DMLERR_NOTPROCESSED),
            },
            _ => {
                log::warn!("[PROGMAN] unsupported transaction type {:#x}", xtype);
                TransactionResult::failed(DMLERR_NOTPROCESSED)
            }
        };

        let mut table = self.conversations.lock();
        if let Some(conv) = find_conversation(&mut table, hconv) {
            conv.last_error = result.error;
            conv.transactions += 1;
        }

        result
    }

    fn is_connected(&self, hconv: HCONV) -> bool {
        let mut table = self.conversations.lock();
        find_conversation(&mut table, hconv).is_some()
    }

    fn groups_reply(&self) -> TransactionResult {
        match self.progman.group_names() {
            Ok(names) => {
                let mut data = names.join("\r\n").into_bytes();
                data.push(0);
                TransactionResult {
                    hdata: HDDEDATA_TRUE,
                    data: Some(data),
                    error: DMLERR_NO_ERROR,
                }
            }
            Err(err) => {
                log::warn!("[PROGMAN] group list failed: {}", err);
                TransactionResult::failed(err.dde_code())
            }
        }
    }
}

fn find_conversation(table: &mut ConversationTable, hconv: HCONV) -> Option<&mut Conversation> {
    if hconv == NULL_HCONV {
        return None;
    }
    table
        .entries
        .iter_mut()
        .find(|conv| conv.state == ConvState::Connected && conv.handle == hconv)
}
