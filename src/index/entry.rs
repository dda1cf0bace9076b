//! Staged-index entry representation
//!
//! Each entry records the subset of a version-2 index record that change
//! detection needs: the two stored timestamps, the mode word, the
//! truncated size and the blob object id. Device, inode, uid and gid are
//! skipped at parse time and never consulted.
//!
//! ## Entry Format
//!
//! Entries are stored big-endian with a 62-byte fixed prefix followed by
//! the path and NUL padding to an 8-byte boundary. The low 12 bits of the
//! flags word carry the path length; 0xFFF means "longer than fits, scan
//! for the NUL".

use crate::error::StatusError;
use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;
use derive_new::new;
use std::fmt;

/// Object-type nibble, shifted into place within the mode word.
pub const OBJECT_TYPE_MASK: u32 = 0b1111 << 12;
pub const REGULAR_FILE: u32 = 0b1000 << 12;
pub const SYMBOLIC_LINK: u32 = 0b1010 << 12;
pub const GITLINK: u32 = 0b1110 << 12;

/// Size of the fixed portion of an entry, up through the flags word.
pub(crate) const ENTRY_PREFIX_SIZE: usize = 62;

/// Entries are NUL-padded so their total length is a multiple of this.
pub(crate) const ENTRY_BLOCK: usize = 8;

/// Path lengths at or above this value are stored as 0xFFF and recovered
/// by scanning for the terminating NUL.
pub(crate) const NAME_LENGTH_MASK: u16 = 0xFFF;

/// A 20-byte blob object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectId(pub [u8; 20]);

impl ObjectId {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// The object type recorded in an entry's mode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    Symlink,
    Gitlink,
}

/// One record of the staged index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// Metadata change time, as stored (seconds, nanoseconds).
    pub ctime_secs: u32,
    pub ctime_nanos: u32,
    /// Content modification time, as stored (seconds, nanoseconds).
    pub mtime_secs: u32,
    pub mtime_nanos: u32,
    /// Object type in the upper nibble, permission bits in the low 9.
    pub mode: u32,
    /// Blob size from stat(2), truncated to 32 bits.
    pub size: u32,
    /// Blob object id.
    pub oid: ObjectId,
}

impl IndexEntry {
    /// The recognized object type, or an error for any other nibble.
    pub fn kind(&self, path: &str) -> Result<EntryKind, StatusError> {
        match self.mode & OBJECT_TYPE_MASK {
            REGULAR_FILE => Ok(EntryKind::Regular),
            SYMBOLIC_LINK => Ok(EntryKind::Symlink),
            GITLINK => Ok(EntryKind::Gitlink),
            _ => Err(StatusError::UnknownObjectType {
                path: path.to_string(),
                mode: self.mode,
            }),
        }
    }

    /// The stored executable bit.
    pub fn executable(&self) -> bool {
        self.mode & 0o100 != 0
    }

    /// Encode this entry as version-2 index bytes for the given path.
    ///
    /// The skipped fields (dev, ino, uid, gid) are written as zero.
    /// Primarily fixture support: the engine reads indexes, it never
    /// writes one back to a repository.
    pub fn encode(&self, path: &str) -> Bytes {
        let mut out = Vec::with_capacity(ENTRY_PREFIX_SIZE + path.len() + ENTRY_BLOCK);

        put_u32(&mut out, self.ctime_secs);
        put_u32(&mut out, self.ctime_nanos);
        put_u32(&mut out, self.mtime_secs);
        put_u32(&mut out, self.mtime_nanos);
        out.extend_from_slice(&[0; 8]); // dev + ino
        put_u32(&mut out, self.mode);
        out.extend_from_slice(&[0; 8]); // uid + gid
        put_u32(&mut out, self.size);
        out.extend_from_slice(self.oid.as_bytes());

        let name_length = path.len().min(NAME_LENGTH_MASK as usize) as u16;
        let mut flags = [0u8; 2];
        NetworkEndian::write_u16(&mut flags, name_length);
        out.extend_from_slice(&flags);
        out.extend_from_slice(path.as_bytes());

        // At least one NUL, then pad to the block size.
        out.push(0);
        while out.len() % ENTRY_BLOCK != 0 {
            out.push(0);
        }

        Bytes::from(out)
    }
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    let mut buf = [0u8; 4];
    NetworkEndian::write_u32(&mut buf, value);
    out.extend_from_slice(&buf);
}
