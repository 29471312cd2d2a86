//! Shell Link (.lnk) Files
//!
//! Reader and writer for the binary shell link format used for Program
//! Manager items. A link written here contains:
//!
//! ```text
//! +--------------------+
//! | ShellLinkHeader    |  76 bytes, CLSID 00021401-0000-0000-C000-000000000046
//! +--------------------+
//! | LinkInfo           |  VolumeID + LocalBasePath (ANSI and Unicode)
//! +--------------------+
//! | StringData         |  name, relative path, working dir, args, icon
//! +--------------------+
//! | TerminalBlock      |  4 zero bytes
//! +--------------------+
//! ```
//!
//! # References
//!
//! - `public/sdk/inc/shlobj.h` - IShellLink
//! - `public/sdk/inc/shlguid.h` - CLSID_ShellLink

use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bitflags::bitflags;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Size of the ShellLinkHeader
pub const SHELL_LINK_HEADER_SIZE: u32 = 0x0000_004C;

/// CLSID_ShellLink in on-disk byte order
pub const CLSID_SHELL_LINK: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

/// LinkInfo header size including the Unicode offsets
const LINK_INFO_HEADER_SIZE: u32 = 0x24;

/// VolumeID size with an empty ANSI label
const VOLUME_ID_SIZE: u32 = 0x11;

/// DRIVE_FIXED
pub const DRIVE_FIXED: u32 = 3;

/// SW_SHOWNORMAL
pub const SW_SHOWNORMAL: u32 = 1;

/// Read-only
pub const FILE_ATTRIBUTE_READONLY: u32 = 0x00000001;

/// Directory
pub const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x00000010;

/// Archive
pub const FILE_ATTRIBUTE_ARCHIVE: u32 = 0x00000020;

/// Normal
pub const FILE_ATTRIBUTE_NORMAL: u32 = 0x00000080;

/// Seconds between 1601-01-01 and 1970-01-01
const FILETIME_UNIX_EPOCH_SECS: u64 = 11_644_473_600;

bitflags! {
    /// ShellLinkHeader LinkFlags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LinkFlags: u32 {
        const HAS_LINK_TARGET_ID_LIST = 0x0000_0001;
        const HAS_LINK_INFO = 0x0000_0002;
        const HAS_NAME = 0x0000_0004;
        const HAS_RELATIVE_PATH = 0x0000_0008;
        const HAS_WORKING_DIR = 0x0000_0010;
        const HAS_ARGUMENTS = 0x0000_0020;
        const HAS_ICON_LOCATION = 0x0000_0040;
        const IS_UNICODE = 0x0000_0080;
        const FORCE_NO_LINK_INFO = 0x0000_0100;
    }
}

bitflags! {
    /// LinkInfo LinkInfoFlags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LinkInfoFlags: u32 {
        const VOLUME_ID_AND_LOCAL_BASE_PATH = 0x0000_0001;
        const COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX = 0x0000_0002;
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Shell link encode/decode failure
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("{field} is too long ({len} UTF-16 units)")]
    TooLong { field: &'static str, len: usize },

    #[error("not a shell link")]
    BadHeader,

    #[error("shell link truncated at offset {0}")]
    Truncated(usize),
}

// ============================================================================
// Shell Link
// ============================================================================

/// Decoded shell link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellLink {
    /// Absolute target path
    pub target_path: String,
    /// Description (NAME_STRING)
    pub description: Option<String>,
    /// Path relative to the link
    pub relative_path: Option<String>,
    /// Working directory
    pub working_dir: Option<String>,
    /// Command line arguments
    pub arguments: Option<String>,
    /// Icon file
    pub icon_location: Option<String>,
    /// Icon index within the icon file
    pub icon_index: i32,
    /// Show command for the launched program
    pub show_cmd: u32,
    /// Hotkey (virtual key | modifiers << 8)
    pub hotkey: u16,
    /// Target file attributes
    pub file_attributes: u32,
    /// Target creation time (FILETIME)
    pub creation_time: u64,
    /// Target last access time (FILETIME)
    pub access_time: u64,
    /// Target last write time (FILETIME)
    pub write_time: u64,
    /// Target size, low 32 bits
    pub file_size: u32,
}

impl ShellLink {
    /// Link to `target_path` with no metadata
    pub fn new(target_path: impl Into<String>) -> Self {
        Self {
            target_path: target_path.into(),
            description: None,
            relative_path: None,
            working_dir: None,
            arguments: None,
            icon_location: None,
            icon_index: 0,
            show_cmd: SW_SHOWNORMAL,
            hotkey: 0,
            file_attributes: FILE_ATTRIBUTE_NORMAL,
            creation_time: 0,
            access_time: 0,
            write_time: 0,
            file_size: 0,
        }
    }

    /// Link to an existing file, copying its metadata
    ///
    /// The working directory is the target's directory and the icon is
    /// taken from the target itself.
    pub fn for_target(target: &Path) -> io::Result<Self> {
        let meta = fs::metadata(target)?;
        let target_str = target.to_string_lossy().into_owned();

        let mut link = Self::new(target_str.clone());

        link.file_attributes = if meta.is_dir() {
            FILE_ATTRIBUTE_DIRECTORY
        } else {
            FILE_ATTRIBUTE_ARCHIVE
        };
        if meta.permissions().readonly() {
            link.file_attributes |= FILE_ATTRIBUTE_READONLY;
        }

        link.creation_time = meta.created().map(filetime).unwrap_or(0);
        link.access_time = meta.accessed().map(filetime).unwrap_or(0);
        link.write_time = meta.modified().map(filetime).unwrap_or(0);
        link.file_size = meta.len() as u32;

        link.working_dir = target
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned())
            .filter(|dir| !dir.is_empty());
        link.icon_location = Some(target_str);

        Ok(link)
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn flags(&self) -> LinkFlags {
        let mut flags = LinkFlags::HAS_LINK_INFO | LinkFlags::IS_UNICODE;
        flags.set(LinkFlags::HAS_NAME, self.description.is_some());
        flags.set(LinkFlags::HAS_RELATIVE_PATH, self.relative_path.is_some());
        flags.set(LinkFlags::HAS_WORKING_DIR, self.working_dir.is_some());
        flags.set(LinkFlags::HAS_ARGUMENTS, self.arguments.is_some());
        flags.set(LinkFlags::HAS_ICON_LOCATION, self.icon_location.is_some());
        flags
    }

    /// Encode as .lnk bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, LinkError> {
        let flags = self.flags();
        let mut out = Vec::with_capacity(256);

        // ShellLinkHeader
        put_u32(&mut out, SHELL_LINK_HEADER_SIZE);
        out.extend_from_slice(&CLSID_SHELL_LINK);
        put_u32(&mut out, flags.bits());
        put_u32(&mut out, self.file_attributes);
        put_u64(&mut out, self.creation_time);
        put_u64(&mut out, self.access_time);
        put_u64(&mut out, self.write_time);
        put_u32(&mut out, self.file_size);
        put_u32(&mut out, self.icon_index as u32);
        put_u32(&mut out, self.show_cmd);
        put_u16(&mut out, self.hotkey);
        put_u16(&mut out, 0);
        put_u32(&mut out, 0);
        put_u32(&mut out, 0);

        write_link_info(&mut out, &self.target_path);

        let strings = [
            ("description", &self.description),
            ("relative path", &self.relative_path),
            ("working directory", &self.working_dir),
            ("arguments", &self.arguments),
            ("icon location", &self.icon_location),
        ];
        for (field, value) in strings.iter() {
            if let Some(value) = value {
                put_string_data(&mut out, field, value)?;
            }
        }

        // TerminalBlock
        put_u32(&mut out, 0);

        Ok(out)
    }

    /// Decode .lnk bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, LinkError> {
        let mut r = Reader::new(data);

        if r.u32()? != SHELL_LINK_HEADER_SIZE || r.take(16)? != CLSID_SHELL_LINK {
            return Err(LinkError::BadHeader);
        }

        let flags = LinkFlags::from_bits_truncate(r.u32()?);
        let mut link = Self::new(String::new());
        link.file_attributes = r.u32()?;
        link.creation_time = r.u64()?;
        link.access_time = r.u64()?;
        link.write_time = r.u64()?;
        link.file_size = r.u32()?;
        link.icon_index = r.u32()? as i32;
        link.show_cmd = r.u32()?;
        link.hotkey = r.u16()?;
        r.take(10)?;

        if flags.contains(LinkFlags::HAS_LINK_TARGET_ID_LIST) {
            let size = r.u16()? as usize;
            r.take(size)?;
        }

        if flags.contains(LinkFlags::HAS_LINK_INFO) {
            let start = r.pos;
            let size = r.u32()? as usize;
            let info = data.get(start..start + size).ok_or(LinkError::Truncated(start))?;
            link.target_path = read_link_info(info)?;
            r.pos = start + size;
        }

        let unicode = flags.contains(LinkFlags::IS_UNICODE);
        let mut read_string = |present: bool| -> Result<Option<String>, LinkError> {
            if present {
                r.string_data(unicode).map(Some)
            } else {
                Ok(None)
            }
        };

        link.description = read_string(flags.contains(LinkFlags::HAS_NAME))?;
        link.relative_path = read_string(flags.contains(LinkFlags::HAS_RELATIVE_PATH))?;
        link.working_dir = read_string(flags.contains(LinkFlags::HAS_WORKING_DIR))?;
        link.arguments = read_string(flags.contains(LinkFlags::HAS_ARGUMENTS))?;
        link.icon_location = read_string(flags.contains(LinkFlags::HAS_ICON_LOCATION))?;

        Ok(link)
    }

    /// Write the link to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<(), LinkError> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read a link file
    pub fn load(path: &Path) -> Result<Self, LinkError> {
        Self::from_bytes(&fs::read(path)?)
    }
}

/// SystemTime as a FILETIME value
pub fn filetime(time: SystemTime) -> u64 {
    let since_unix = time.duration_since(UNIX_EPOCH).unwrap_or_default();
    (since_unix.as_secs() + FILETIME_UNIX_EPOCH_SECS) * 10_000_000
        + u64::from(since_unix.subsec_nanos() / 100)
}

// ============================================================================
// LinkInfo
// ============================================================================

fn write_link_info(out: &mut Vec<u8>, target: &str) {
    let ansi: Vec<u8> = target
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect();
    let wide: Vec<u16> = target.encode_utf16().collect();

    let volume_offset = LINK_INFO_HEADER_SIZE;
    let base_path_offset = volume_offset + VOLUME_ID_SIZE;
    let suffix_offset = base_path_offset + ansi.len() as u32 + 1;
    let base_path_unicode_offset = suffix_offset + 1;
    let suffix_unicode_offset = base_path_unicode_offset + (wide.len() as u32 + 1) * 2;
    let total = suffix_unicode_offset + 2;

    put_u32(out, total);
    put_u32(out, LINK_INFO_HEADER_SIZE);
    put_u32(out, LinkInfoFlags::VOLUME_ID_AND_LOCAL_BASE_PATH.bits());
    put_u32(out, volume_offset);
    put_u32(out, base_path_offset);
    put_u32(out, 0);
    put_u32(out, suffix_offset);
    put_u32(out, base_path_unicode_offset);
    put_u32(out, suffix_unicode_offset);

    // VolumeID with an empty label
    put_u32(out, VOLUME_ID_SIZE);
    put_u32(out, DRIVE_FIXED);
    put_u32(out, 0);
    put_u32(out, 0x10);
    out.push(0);

    out.extend_from_slice(&ansi);
    out.push(0);
    out.push(0);

    for unit in wide {
        put_u16(out, unit);
    }
    put_u16(out, 0);
    put_u16(out, 0);
}

fn read_link_info(info: &[u8]) -> Result<String, LinkError> {
    let mut r = Reader::new(info);
    let _size = r.u32()?;
    let header_size = r.u32()?;
    let flags = LinkInfoFlags::from_bits_truncate(r.u32()?);
    let _volume_offset = r.u32()?;
    let base_path_offset = r.u32()? as usize;
    let _network_offset = r.u32()?;
    let suffix_offset = r.u32()? as usize;

    if !flags.contains(LinkInfoFlags::VOLUME_ID_AND_LOCAL_BASE_PATH) {
        return Ok(String::new());
    }

    if header_size >= LINK_INFO_HEADER_SIZE {
        let base_unicode_offset = r.u32()? as usize;
        let suffix_unicode_offset = r.u32()? as usize;
        if base_unicode_offset != 0 {
            let mut path = wide_z(info, base_unicode_offset)?;
            if suffix_unicode_offset != 0 {
                path.push_str(&wide_z(info, suffix_unicode_offset)?);
            }
            return Ok(path);
        }
    }

    let mut path = ansi_z(info, base_path_offset)?;
    if suffix_offset != 0 {
        path.push_str(&ansi_z(info, suffix_offset)?);
    }
    Ok(path)
}

fn ansi_z(data: &[u8], offset: usize) -> Result<String, LinkError> {
    let tail = data.get(offset..).ok_or(LinkError::Truncated(offset))?;
    let end = tail.iter().position(|&b| b == 0).ok_or(LinkError::Truncated(offset))?;
    Ok(tail[..end].iter().map(|&b| b as char).collect())
}

fn wide_z(data: &[u8], offset: usize) -> Result<String, LinkError> {
    let tail = data.get(offset..).ok_or(LinkError::Truncated(offset))?;
    let units: Vec<u16> = tail
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

// ============================================================================
// Encoding Helpers
// ============================================================================

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_string_data(out: &mut Vec<u8>, field: &'static str, value: &str) -> Result<(), LinkError> {
    let units: Vec<u16> = value.encode_utf16().collect();
    let count = u16::try_from(units.len()).map_err(|_| LinkError::TooLong {
        field,
        len: units.len(),
    })?;

    put_u16(out, count);
    for unit in units {
        put_u16(out, unit);
    }
    Ok(())
}

/// Little-endian cursor over link bytes
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], LinkError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + len)
            .ok_or(LinkError::Truncated(self.pos))?;
        self.pos += len;
        Ok(bytes)
    }

    fn u16(&mut self) -> Result<u16, LinkError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, LinkError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, LinkError> {
        let lo = self.u32()? as u64;
        let hi = self.u32()? as u64;
        Ok(lo | (hi << 32))
    }

    fn string_data(&mut self, unicode: bool) -> Result<String, LinkError> {
        let count = self.u16()? as usize;
        if unicode {
            let bytes = self.take(count * 2)?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            Ok(String::from_utf16_lossy(&units))
        } else {
            Ok(self.take(count)?.iter().map(|&b| b as char).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let bytes = ShellLink::new("C:\\windows\\notepad.exe").to_bytes().unwrap();

        assert_eq!(&bytes[0..4], &[0x4C, 0, 0, 0]);
        assert_eq!(&bytes[4..20], &CLSID_SHELL_LINK);

        let flags = LinkFlags::from_bits_truncate(u32::from_le_bytes([
            bytes[20], bytes[21], bytes[22], bytes[23],
        ]));
        assert!(flags.contains(LinkFlags::HAS_LINK_INFO | LinkFlags::IS_UNICODE));
        assert!(!flags.contains(LinkFlags::HAS_NAME));

        // LinkInfo follows the header, terminal block ends the file
        let link_info_size = u32::from_le_bytes([bytes[76], bytes[77], bytes[78], bytes[79]]);
        assert_eq!(bytes.len(), 76 + link_info_size as usize + 4);
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_link_for_target_records_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("notepad.exe");
        fs::write(&target, b"MZ\x90\x00").unwrap();

        let link = ShellLink::for_target(&target).unwrap().with_description("Notepad");
        let path = dir.path().join("Notepad.lnk");
        link.save(&path).unwrap();

        let loaded = ShellLink::load(&path).unwrap();
        assert_eq!(loaded.target_path, target.to_string_lossy());
        assert_eq!(loaded.description.as_deref(), Some("Notepad"));
        assert_eq!(loaded.working_dir, Some(dir.path().to_string_lossy().into_owned()));
        assert_eq!(loaded.icon_location, Some(target.to_string_lossy().into_owned()));
        assert_eq!(loaded.file_size, 4);
        assert_eq!(loaded.file_attributes & FILE_ATTRIBUTE_ARCHIVE, FILE_ATTRIBUTE_ARCHIVE);
        assert_eq!(loaded.show_cmd, SW_SHOWNORMAL);
        assert!(loaded.write_time > 0);
    }

    #[test]
    fn test_non_ascii_target_survives_in_unicode_path() {
        let link = ShellLink::new("/apps/caf\u{e9}.exe");
        let decoded = ShellLink::from_bytes(&link.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.target_path, "/apps/caf\u{e9}.exe");
    }

    #[test]
    fn test_rejects_foreign_files() {
        assert!(matches!(ShellLink::from_bytes(b"MZ\x90\x00"), Err(LinkError::BadHeader)));
        assert!(matches!(ShellLink::from_bytes(b"L\0"), Err(LinkError::Truncated(0))));

        let mut bytes = ShellLink::new("x").to_bytes().unwrap();
        bytes[4] = 0xFF;
        assert!(matches!(ShellLink::from_bytes(&bytes), Err(LinkError::BadHeader)));

        let bytes = ShellLink::new("x").with_description("y").to_bytes().unwrap();
        assert!(matches!(
            ShellLink::from_bytes(&bytes[..bytes.len() - 8]),
            Err(LinkError::Truncated(_))
        ));
    }

    #[test]
    fn test_filetime_epoch() {
        assert_eq!(filetime(UNIX_EPOCH), FILETIME_UNIX_EPOCH_SECS * 10_000_000);
    }
}
