/// Node type flag reported for every VFS node.
///
/// Values match the flags the shell masks against (`flags & 0x7`).
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    File      = 0x01,
    Directory = 0x02,
}

impl NodeType {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v & 0x7 {
            0x01 => Some(NodeType::File),
            0x02 => Some(NodeType::Directory),
            _ => None,
        }
    }

    pub const fn is_dir(self) -> bool {
        matches!(self, NodeType::Directory)
    }
}

/// Result codes returned across the filesystem boundary.
#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsResult {
    Ok          = 0,
    NotFound    = 1,
    IsDir       = 2,
    NotDir      = 3,
    Unsupported = 4,
    IoError     = 5,
    Truncated   = 6,
    NotMounted  = 7,
}

impl FsResult {
    pub fn from_u64(v: u64) -> Self {
        match v {
            0 => FsResult::Ok,
            1 => FsResult::NotFound,
            2 => FsResult::IsDir,
            3 => FsResult::NotDir,
            4 => FsResult::Unsupported,
            6 => FsResult::Truncated,
            7 => FsResult::NotMounted,
            _ => FsResult::IoError,
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, FsResult::Ok)
    }
}
