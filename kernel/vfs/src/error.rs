//! Errors surfaced at the VFS boundary.

use core::fmt;

use kernel_api_types::fs::FsResult;

/// Why a VFS operation produced nothing.
///
/// Callers may match on the variant, but the contract only promises *that*
/// an operation failed; device faults never show up here.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VfsError {
    /// No entry with that name or ordinal.
    NotFound,
    /// Directory operation on a file node.
    NotADirectory,
    /// File operation on a directory node.
    NotAFile,
    /// Fewer bytes were reachable than the node declares.
    Truncated,
    /// The node does not implement the operation.
    Unsupported,
    /// No volume is mounted in the slot.
    NotMounted,
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            VfsError::NotFound => "No such file or directory",
            VfsError::NotADirectory => "Not a directory",
            VfsError::NotAFile => "Is a directory",
            VfsError::Truncated => "File extends past the readable clusters",
            VfsError::Unsupported => "Operation not supported",
            VfsError::NotMounted => "No filesystem mounted",
        };
        f.write_str(msg)
    }
}

impl From<VfsError> for FsResult {
    fn from(err: VfsError) -> Self {
        match err {
            VfsError::NotFound => FsResult::NotFound,
            VfsError::NotADirectory => FsResult::NotDir,
            VfsError::NotAFile => FsResult::IsDir,
            VfsError::Truncated => FsResult::Truncated,
            VfsError::Unsupported => FsResult::Unsupported,
            VfsError::NotMounted => FsResult::NotMounted,
        }
    }
}

pub type VfsResult<T> = Result<T, VfsError>;
