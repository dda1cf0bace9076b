//! Staged-index parsing
//!
//! Reads the binary `.git/index` file (version 2 only) into a map from
//! repository-relative forward-slash path to [`IndexEntry`]. The parser
//! is zero-copy over the input bytes: the file is memory-mapped under a
//! shared lock, decoded in place, and both the map and the lock are
//! released before the call returns.
//!
//! ## File Format
//!
//! - Header: `DIRC`, big-endian version, big-endian entry count.
//! - Entries: 62-byte fixed prefix, then the path, then NUL padding to
//!   an 8-byte boundary.
//! - Trailing SHA-1 checksum: neither read nor validated here.
//!
//! The entry count in the header is untrusted input; callers can cap
//! pre-allocation so a forged count cannot exhaust memory before the
//! first entry fails to decode.

mod entry;

pub use entry::{
    EntryKind, GITLINK, IndexEntry, OBJECT_TYPE_MASK, ObjectId, REGULAR_FILE, SYMBOLIC_LINK,
};

use crate::cancel::CancelHandle;
use crate::error::{Result, StatusError};
use byteorder::{ByteOrder, NetworkEndian};
use bytes::{BufMut, Bytes, BytesMut};
use entry::{ENTRY_BLOCK, ENTRY_PREFIX_SIZE, NAME_LENGTH_MASK};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Mapping from repository-relative forward-slash path to its staged
/// entry. Built once per status call, read-only afterwards.
pub type IndexMap = HashMap<String, IndexEntry>;

pub(crate) const HEADER_SIZE: usize = 12;
pub(crate) const SIGNATURE: &[u8; 4] = b"DIRC";
pub(crate) const VERSION: u32 = 2;

/// Parse the staged index at `path`.
///
/// The file is mapped read-only under a shared advisory lock; both are
/// dropped before returning. An empty or truncated file is a bad-index
/// error, not an empty map.
pub fn parse_index(path: &Path, cancel: &CancelHandle) -> Result<IndexMap> {
    let metadata = std::fs::metadata(path).map_err(|e| StatusError::io(path, e))?;
    if !metadata.is_file() {
        return Err(StatusError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    let mut file = std::fs::File::open(path).map_err(|e| StatusError::io(path, e))?;
    let guard = file_guard::lock(&mut file, file_guard::Lock::Shared, 0, 1)
        .map_err(|e| StatusError::io(path, e))?;

    if metadata.len() == 0 {
        return parse_index_from_bytes(&[], None, cancel);
    }

    let map = unsafe { memmap2::Mmap::map(&**guard) }.map_err(|e| StatusError::io(path, e))?;
    parse_index_from_bytes(&map, None, cancel)
}

/// Parse a staged index already loaded into memory.
///
/// `max_prealloc_entries` caps how many entries are reserved up front
/// from the untrusted header count; `None` reserves the advertised
/// count. The cap never rejects an index, it only bounds the initial
/// allocation.
pub fn parse_index_from_bytes(
    data: &[u8],
    max_prealloc_entries: Option<usize>,
    cancel: &CancelHandle,
) -> Result<IndexMap> {
    if data.len() < HEADER_SIZE {
        return Err(StatusError::TruncatedIndexHeader(data.len()));
    }

    if &data[0..4] != SIGNATURE {
        return Err(StatusError::BadIndexSignature);
    }

    let version = NetworkEndian::read_u32(&data[4..8]);
    if version != VERSION {
        return Err(StatusError::UnsupportedIndexVersion(version));
    }

    let entry_count = NetworkEndian::read_u32(&data[8..12]);

    let prealloc = match max_prealloc_entries {
        Some(cap) => (entry_count as usize).min(cap),
        None => entry_count as usize,
    };
    let mut entries = IndexMap::with_capacity(prealloc);

    let mut cursor = Cursor {
        data,
        pos: HEADER_SIZE,
    };

    for index in 0..entry_count {
        cancel.check()?;

        let ctime_secs = cursor.read_u32(index, "64-bit metadata changed time (ctime)")?;
        let ctime_nanos = cursor.read_u32(index, "64-bit metadata changed time (ctime)")?;
        let mtime_secs = cursor.read_u32(index, "64-bit modified time")?;
        let mtime_nanos = cursor.read_u32(index, "64-bit modified time")?;
        cursor.skip(8, index, "64-bit dev and ino")?;
        let mode = cursor.read_u32(index, "32-bit mode")?;
        cursor.skip(8, index, "64-bit uid and gid")?;
        let size = cursor.read_u32(index, "32-bit file size")?;

        let oid_bytes = cursor.take(20, index, "20-byte SHA-1 hash")?;
        let mut oid = ObjectId::default();
        oid.0.copy_from_slice(oid_bytes);

        let flags = cursor.read_u16(index, "2-byte flags field")?;
        let name_length = flags & NAME_LENGTH_MASK;

        let path_bytes = if name_length == NAME_LENGTH_MASK {
            cursor.take_path_until_nul(index)?
        } else {
            cursor.take_sized_path(name_length as usize, index)?
        };

        let path = std::str::from_utf8(path_bytes)
            .map_err(|_| StatusError::bad_entry(index, "path name is not valid UTF-8"))?
            .to_string();

        let entry = IndexEntry::new(
            ctime_secs,
            ctime_nanos,
            mtime_secs,
            mtime_nanos,
            mode,
            size,
            oid,
        );
        // Reject unrecognized object types while we still know the
        // entry index.
        entry.kind(&path)?;

        entries.insert(path, entry);
    }

    Ok(entries)
}

/// Encode a full index (header, entries, trailing SHA-1 checksum).
///
/// The inverse of [`parse_index_from_bytes`] for every map it can
/// produce. Fixture support: the engine itself never writes an index.
pub fn encode_index(entries: &[(String, IndexEntry)]) -> Bytes {
    let mut out = BytesMut::new();
    out.put_slice(SIGNATURE);
    out.put_u32(VERSION);
    out.put_u32(entries.len() as u32);

    for (path, entry) in entries {
        out.put_slice(&entry.encode(path));
    }

    let mut digest = Sha1::new();
    digest.update(&out[..]);
    let checksum = digest.finalize();
    out.put_slice(&checksum);

    out.freeze()
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize, index: u32, field: &str) -> Result<&'a [u8]> {
        if self.data.len() - self.pos < n {
            return Err(StatusError::bad_entry(
                index,
                format!("invalid size, unable to read {field}"),
            ));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn skip(&mut self, n: usize, index: u32, field: &str) -> Result<()> {
        self.take(n, index, field).map(|_| ())
    }

    fn read_u32(&mut self, index: u32, field: &str) -> Result<u32> {
        self.take(4, index, field).map(NetworkEndian::read_u32)
    }

    fn read_u16(&mut self, index: u32, field: &str) -> Result<u16> {
        self.take(2, index, field).map(NetworkEndian::read_u16)
    }

    /// Short-path case: the flags word told us the exact length, the
    /// padding rounds the entry to the block size and must be all NUL.
    fn take_sized_path(&mut self, name_length: usize, index: u32) -> Result<&'a [u8]> {
        let path = self.take(
            name_length,
            index,
            &format!("path name of size {name_length}"),
        )?;

        let mut padding = ENTRY_BLOCK - ((ENTRY_PREFIX_SIZE + name_length) % ENTRY_BLOCK);
        if padding == 0 {
            padding = ENTRY_BLOCK;
        }

        let pad = self.take(padding, index, &format!("path name null bytes of size {padding}"))?;
        if pad.iter().any(|&b| b != 0) {
            return Err(StatusError::bad_entry(
                index,
                format!("non-null byte found in null padding of length {padding}"),
            ));
        }

        Ok(path)
    }

    /// Long-path case (name-length field saturated at 0xFFF): scan for
    /// the terminating NUL, then consume the remaining padding.
    fn take_path_until_nul(&mut self, index: u32) -> Result<&'a [u8]> {
        let rest = &self.data[self.pos..];
        let nul = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            StatusError::bad_entry(index, "unterminated path name, missing null byte")
        })?;
        if nul == 0 {
            return Err(StatusError::bad_entry(index, "empty path name"));
        }

        let path = &rest[..nul];
        self.pos += nul + 1; // path plus the NUL we just found

        let mut padding = ENTRY_BLOCK - ((ENTRY_PREFIX_SIZE + nul) % ENTRY_BLOCK);
        if padding == 0 {
            padding = ENTRY_BLOCK;
        }
        padding -= 1; // one NUL already consumed

        let pad = self.take(padding, index, &format!("path name null bytes of size {padding}"))?;
        if pad.iter().any(|&b| b != 0) {
            return Err(StatusError::bad_entry(
                index,
                format!("non-null byte found in null padding of length {padding}"),
            ));
        }

        Ok(path)
    }
}
