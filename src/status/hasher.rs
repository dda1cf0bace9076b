//! Blob hashing
//!
//! Reproduces Git's blob object id: SHA-1 over `"blob <size>\0"`
//! followed by the content. Symbolic links hash their target text, not
//! the target's data. Regular files get one CRLF→LF retry when the
//! direct hash misses, approximating `core.autocrlf` without consulting
//! attribute files.
//!
//! Every failure in here (open, map, readlink) degrades to "does not
//! match"; the comparator turns that into a content change rather than
//! aborting the call.

use crate::index::ObjectId;
use sha1::{Digest, Sha1};
use std::fs::Metadata;
use std::io;
use std::path::Path;

/// The Git blob object id over `data`.
pub fn blob_object_id(data: &[u8]) -> ObjectId {
    let mut digest = Sha1::new();
    digest.update(format!("blob {}\0", data.len()).as_bytes());
    digest.update(data);
    ObjectId(digest.finalize().into())
}

/// Does the stored id match the on-disk content, allowing the CRLF→LF
/// retry for regular files?
pub(crate) fn matches_with_line_ending_fallback(
    oid: &ObjectId,
    path: &Path,
    metadata: &Metadata,
) -> bool {
    if matches_file(oid, path, metadata) {
        return true;
    }

    // The retry re-reads the file with carriage returns stripped. It
    // only applies to regular files; a symlink's target text is taken
    // verbatim.
    if metadata.file_type().is_symlink() {
        return false;
    }

    let Ok(data) = read_file_data(path, metadata) else {
        return false;
    };
    let converted = convert_crlf_to_lf(data.as_ref());
    *oid == blob_object_id(&converted)
}

fn matches_file(oid: &ObjectId, path: &Path, metadata: &Metadata) -> bool {
    #[cfg(unix)]
    if metadata.file_type().is_symlink() {
        let Ok(target) = std::fs::read_link(path) else {
            return false;
        };
        use std::os::unix::ffi::OsStrExt;
        return *oid == blob_object_id(target.as_os_str().as_bytes());
    }

    let Ok(data) = read_file_data(path, metadata) else {
        return false;
    };
    *oid == blob_object_id(data.as_ref())
}

/// File contents, memory-mapped where the platform supports it.
enum FileData {
    #[cfg(unix)]
    Mapped(memmap2::Mmap),
    Owned(Vec<u8>),
}

impl AsRef<[u8]> for FileData {
    fn as_ref(&self) -> &[u8] {
        match self {
            #[cfg(unix)]
            FileData::Mapped(map) => map,
            FileData::Owned(data) => data,
        }
    }
}

fn read_file_data(path: &Path, metadata: &Metadata) -> io::Result<FileData> {
    if metadata.len() == 0 {
        return Ok(FileData::Owned(Vec::new()));
    }

    #[cfg(unix)]
    {
        let file = std::fs::File::open(path)?;
        let map = unsafe { memmap2::Mmap::map(&file) }?;
        Ok(FileData::Mapped(map))
    }

    #[cfg(not(unix))]
    {
        Ok(FileData::Owned(std::fs::read(path)?))
    }
}

/// Strip every 0x0D byte, producing LF-only line endings.
pub(crate) fn convert_crlf_to_lf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &byte in data {
        if byte != b'\r' {
            out.push(byte);
        }
    }
    out
}
