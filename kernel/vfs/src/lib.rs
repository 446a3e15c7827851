// Read-only FAT32 volume exposed as VFS nodes.
// No_std when not testing; `cargo test -p vfs` runs the unit tests on the host.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod block;
pub mod cluster;
pub mod dir;
pub mod error;
pub mod geometry;
pub mod mount;
pub mod node;

#[cfg(test)]
mod image;

pub use block::{BlockReader, RamDisk, SECTOR_SIZE};
pub use dir::ShortName;
pub use error::{VfsError, VfsResult};
pub use geometry::VolumeGeometry;
pub use mount::{MountOptions, MountedVolume, VolumeSlot};
pub use node::{BoxedNode, Capabilities, DirEntry, DirNode, FileNode, NodeInfo, VfsNode, read_whole};
