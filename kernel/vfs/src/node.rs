//! VFS nodes over a mounted FAT32 volume.
//!
//! A node is a decoded directory record plus a borrow of the volume it came
//! from. Operations a node does not support fall through to the trait's
//! defaults, which report the matching error instead of doing anything.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use bitflags::bitflags;
use kernel_api_types::fs::NodeType;

use crate::block::BlockReader;
use crate::dir::{Scan, ScanEntry, ShortName};
use crate::error::{VfsError, VfsResult};
use crate::mount::MountedVolume;

bitflags! {
    /// Operations a node actually implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const READ         = 1 << 0;
        const WRITE        = 1 << 1;
        const OPEN         = 1 << 2;
        const CLOSE        = 1 << 3;
        const LIST_ENTRIES = 1 << 4;
        const FIND_BY_NAME = 1 << 5;
    }
}

/// Identity and location of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub name:          ShortName,
    pub kind:          NodeType,
    /// Raw record position in the parent directory; 0 for the root.
    pub slot:          u32,
    /// Byte length from the record; always 0 for directories.
    pub length:        u32,
    pub start_cluster: u32,
}

/// One `list_entries` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub name: ShortName,
    pub slot: u32,
}

pub type BoxedNode<'v> = Box<dyn VfsNode<'v> + 'v>;

pub trait VfsNode<'v> {
    fn info(&self) -> &NodeInfo;

    fn capabilities(&self) -> Capabilities;

    fn name(&self) -> &ShortName {
        &self.info().name
    }

    fn kind(&self) -> NodeType {
        self.info().kind
    }

    fn length(&self) -> u32 {
        self.info().length
    }

    /// Copy file bytes starting at `offset` into `buf`, returning how many
    /// were copied.
    fn read(&self, _offset: u32, _buf: &mut [u8]) -> VfsResult<usize> {
        Err(VfsError::NotAFile)
    }

    /// The volume is mounted read-only.
    fn write(&self, _offset: u32, _buf: &[u8]) -> VfsResult<usize> {
        Err(VfsError::Unsupported)
    }

    fn open(&self) {}

    fn close(&self) {}

    /// The `ordinal`-th surviving record of this directory.
    fn list_entries(&self, _ordinal: u32) -> VfsResult<DirEntry> {
        Err(VfsError::NotADirectory)
    }

    /// Child whose display name equals `name` byte for byte.
    fn find_by_name(&self, _name: &str) -> VfsResult<BoxedNode<'v>> {
        Err(VfsError::NotADirectory)
    }
}

// ─── Files ────────────────────────────────────────────────────────────────────

pub struct FileNode<'v, D> {
    volume: &'v MountedVolume<D>,
    info:   NodeInfo,
}

impl<'v, D: BlockReader + 'v> VfsNode<'v> for FileNode<'v, D> {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ | Capabilities::FIND_BY_NAME
    }

    /// Without chain following only the first cluster is readable, so a read
    /// never returns more than one cluster's worth of bytes. Reads are clamped
    /// to the file length either way.
    fn read(&self, offset: u32, buf: &mut [u8]) -> VfsResult<usize> {
        let cluster_size = self.volume.geometry().cluster_size_bytes();
        let length = self.info.length as usize;
        let readable = if self.volume.options().follows_cluster_chains() {
            length
        } else {
            length.min(cluster_size)
        };
        let offset = offset as usize;
        let want = buf.len().min(readable.saturating_sub(offset));
        if want == 0 || cluster_size == 0 {
            return Ok(0);
        }

        let clusters = self.volume.clusters();
        let mut copied = 0;
        for cluster in clusters.chain(self.info.start_cluster).skip(offset / cluster_size) {
            let data = clusters.read_cluster(cluster);
            let within = (offset + copied) % cluster_size;
            let n = (cluster_size - within).min(want - copied);
            buf[copied..copied + n].copy_from_slice(&data[within..within + n]);
            copied += n;
            if copied == want {
                break;
            }
        }
        if copied < want {
            log::debug!("fat32: {} ended after {copied} of {want} bytes", self.info.name);
        }
        Ok(copied)
    }
}

/// Read a file from its first byte to its recorded length.
///
/// Fails with [`VfsError::Truncated`] when fewer bytes are readable, which is
/// the case for any file longer than a cluster unless the volume follows
/// cluster chains.
pub fn read_whole(node: &dyn VfsNode<'_>) -> VfsResult<Vec<u8>> {
    let length = node.length() as usize;
    let mut data = vec![0u8; length];
    let read = node.read(0, &mut data)?;
    if read < length {
        log::debug!("fat32: {} is {length} bytes, only {read} readable", node.name());
        return Err(VfsError::Truncated);
    }
    Ok(data)
}

// ─── Directories ──────────────────────────────────────────────────────────────

pub struct DirNode<'v, D> {
    volume: &'v MountedVolume<D>,
    info:   NodeInfo,
}

impl<'v, D: BlockReader + 'v> DirNode<'v, D> {
    pub(crate) fn root(volume: &'v MountedVolume<D>) -> Self {
        Self {
            volume,
            info: NodeInfo {
                name:          ShortName::root(),
                kind:          NodeType::Directory,
                slot:          0,
                length:        0,
                start_cluster: volume.geometry().root_cluster,
            },
        }
    }

    /// Feed surviving records to `visit` until it returns `Some`, the
    /// directory ends, or the readable clusters run out.
    fn scan_with<T>(&self, mut visit: impl FnMut(&ScanEntry) -> Option<T>) -> Option<T> {
        let clusters = self.volume.clusters();
        let (mut slot, mut ordinal) = (0, 0);
        for cluster in clusters.chain(self.info.start_cluster).take(self.volume.options().cluster_limit()) {
            let data = clusters.read_cluster(cluster);
            let mut entries = Scan::resume(&data, slot, ordinal);
            if let Some(found) = entries.by_ref().find_map(|entry| visit(&entry)) {
                return Some(found);
            }
            if entries.reached_end() {
                break;
            }
            slot = entries.next_slot();
            ordinal = entries.next_ordinal();
        }
        None
    }
}

fn child<'v, D: BlockReader + 'v>(volume: &'v MountedVolume<D>, name: ShortName, entry: &ScanEntry) -> BoxedNode<'v> {
    let record = &entry.record;
    let start_cluster = record.cluster();
    if record.is_dir() {
        let info = NodeInfo { name, kind: NodeType::Directory, slot: entry.slot, length: 0, start_cluster };
        Box::new(DirNode { volume, info })
    } else {
        let info = NodeInfo { name, kind: NodeType::File, slot: entry.slot, length: record.size, start_cluster };
        Box::new(FileNode { volume, info })
    }
}

impl<'v, D: BlockReader + 'v> VfsNode<'v> for DirNode<'v, D> {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::LIST_ENTRIES | Capabilities::FIND_BY_NAME
    }

    fn list_entries(&self, ordinal: u32) -> VfsResult<DirEntry> {
        self.scan_with(|entry| {
            (entry.ordinal == ordinal).then(|| DirEntry { name: entry.record.short_name(), slot: entry.slot })
        })
        .ok_or(VfsError::NotFound)
    }

    fn find_by_name(&self, name: &str) -> VfsResult<BoxedNode<'v>> {
        let volume = self.volume;
        let found = self.scan_with(|entry| {
            let short = entry.record.short_name();
            short.matches(name).then(|| child(volume, short, entry))
        });
        if found.is_none() {
            log::debug!("fat32: {name} not found in {}", self.info.name);
        }
        found.ok_or(VfsError::NotFound)
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
