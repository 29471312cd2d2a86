//! CFGMGR32 - Configuration Manager
//!
//! Device instance ID enumeration. No device tree is exposed to
//! applications, so every list is empty: a lone terminating NUL after
//! the (absent) last ID, i.e. two NUL characters.
//!
//! # References
//!
//! - `public/sdk/inc/cfgmgr32.h` - CM_Get_Device_ID_List

use bitflags::bitflags;

/// Configuration Manager return code
pub type CONFIGRET = u32;

pub const CR_SUCCESS: CONFIGRET = 0x00000000;
pub const CR_INVALID_POINTER: CONFIGRET = 0x00000003;
pub const CR_BUFFER_SMALL: CONFIGRET = 0x0000001A;

/// Characters in an empty multi-string list
pub const EMPTY_LIST_LEN: u32 = 2;

bitflags! {
    /// CM_GETIDLIST_FILTER_* flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IdListFilter: u32 {
        const ENUMERATOR = 0x00000001;
        const SERVICE = 0x00000002;
        const EJECTRELATIONS = 0x00000004;
        const REMOVALRELATIONS = 0x00000008;
        const POWERRELATIONS = 0x00000010;
        const BUSRELATIONS = 0x00000020;
        const DONOTGENERATE = 0x10000040;
        const TRANSPORTRELATIONS = 0x00000080;
        const PRESENT = 0x00000100;
        const CLASS = 0x00000200;
    }
}

/// CM_Get_Device_ID_ListA
pub fn cm_get_device_id_list_a(filter: Option<&str>, buffer: &mut [u8], flags: u32) -> CONFIGRET {
    log::warn!(
        "[CFGMGR32] FIXME CM_Get_Device_ID_ListA({:?}, {}, {:?}) stub",
        filter,
        buffer.len(),
        IdListFilter::from_bits_retain(flags)
    );

    if buffer.len() < EMPTY_LIST_LEN as usize {
        return CR_BUFFER_SMALL;
    }

    buffer[..2].fill(0);
    CR_SUCCESS
}

/// CM_Get_Device_ID_ListW
pub fn cm_get_device_id_list_w(filter: Option<&[u16]>, buffer: &mut [u16], flags: u32) -> CONFIGRET {
    log::warn!(
        "[CFGMGR32] FIXME CM_Get_Device_ID_ListW({:?}, {}, {:?}) stub",
        filter.map(String::from_utf16_lossy),
        buffer.len(),
        IdListFilter::from_bits_retain(flags)
    );

    if buffer.len() < EMPTY_LIST_LEN as usize {
        return CR_BUFFER_SMALL;
    }

    buffer[..2].fill(0);
    CR_SUCCESS
}

/// CM_Get_Device_ID_List_SizeA
pub fn cm_get_device_id_list_size_a(len: Option<&mut u32>, filter: Option<&str>, flags: u32) -> CONFIGRET {
    log::debug!(
        "[CFGMGR32] CM_Get_Device_ID_List_SizeA({:?}, {:?})",
        filter,
        IdListFilter::from_bits_retain(flags)
    );

    let Some(len) = len else {
        return CR_INVALID_POINTER;
    };

    *len = EMPTY_LIST_LEN;
    CR_SUCCESS
}
