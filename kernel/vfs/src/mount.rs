//! Mounting a volume and the single-volume slot the kernel keeps it in.
//!
//! Mounting reads sector 0 once and never fails: a device without a FAT32
//! boot sector still mounts, it just yields nodes built from garbage. The
//! device sits behind a `spin::Mutex`, which is not interrupt-safe; nodes
//! must not be used from interrupt context. Reads allocate a cluster-sized
//! buffer, so they must not run inside the allocator either.

use alloc::boxed::Box;

use spin::Mutex;

use crate::block::{BlockReader, SECTOR_SIZE};
use crate::cluster::ClusterTranslator;
use crate::error::{VfsError, VfsResult};
use crate::geometry::VolumeGeometry;
use crate::node::{BoxedNode, DirNode, VfsNode};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MountOptions {
    follow_cluster_chains: bool,
}

impl MountOptions {
    pub const fn new() -> Self {
        Self { follow_cluster_chains: false }
    }

    /// Walk the FAT when a directory or file runs past its first cluster.
    /// Off by default: only the first cluster of anything is read.
    pub const fn follow_cluster_chains(mut self, enabled: bool) -> Self {
        self.follow_cluster_chains = enabled;
        self
    }

    pub const fn follows_cluster_chains(&self) -> bool {
        self.follow_cluster_chains
    }

    /// How many clusters of a chain may be read.
    pub(crate) const fn cluster_limit(&self) -> usize {
        if self.follow_cluster_chains { usize::MAX } else { 1 }
    }
}

pub struct MountedVolume<D> {
    geometry: VolumeGeometry,
    options:  MountOptions,
    disk:     Mutex<D>,
}

impl<D: BlockReader> MountedVolume<D> {
    pub fn mount(mut disk: D, options: MountOptions) -> Self {
        let mut sector = [0u8; SECTOR_SIZE];
        disk.read(0, 1, &mut sector);
        let geometry = VolumeGeometry::parse(&sector);

        if !geometry.has_fat32_signature() {
            log::warn!("fat32: boot signature {:#04x} is not FAT32, mounting anyway", geometry.boot_signature);
        }
        if geometry.bytes_per_sector as usize != SECTOR_SIZE {
            log::warn!("fat32: volume declares {}-byte sectors, using {SECTOR_SIZE}", geometry.bytes_per_sector);
        }
        log::info!(
            "fat32: mounted \"{}\" ({} sectors, {} bytes/cluster, root cluster {}, data at LBA {})",
            core::str::from_utf8(geometry.label()).unwrap_or("?"),
            geometry.total_sectors(),
            geometry.cluster_size_bytes(),
            geometry.root_cluster,
            geometry.cluster_region_start(),
        );

        Self { geometry, options, disk: Mutex::new(disk) }
    }

    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    pub fn options(&self) -> MountOptions {
        self.options
    }

    pub fn clusters(&self) -> ClusterTranslator<'_, D> {
        ClusterTranslator::new(&self.geometry, &self.disk)
    }

    pub fn root(&self) -> DirNode<'_, D> {
        DirNode::root(self)
    }

    /// Resolve a `/`-separated path from the root. Empty components are
    /// ignored, so `""` and `"/"` both name the root.
    pub fn lookup(&self, path: &str) -> VfsResult<BoxedNode<'_>> {
        let mut node: BoxedNode<'_> = Box::new(self.root());
        for component in path.split('/').filter(|c| !c.is_empty()) {
            node = node.find_by_name(component)?;
        }
        Ok(node)
    }

    /// Unmount and hand the device back.
    pub fn into_disk(self) -> D {
        self.disk.into_inner()
    }
}

/// Holds at most one mounted volume.
pub struct VolumeSlot<D> {
    mounted: Option<MountedVolume<D>>,
}

impl<D> VolumeSlot<D> {
    pub const fn new() -> Self {
        Self { mounted: None }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }
}

impl<D: BlockReader> VolumeSlot<D> {
    /// Mount `disk` into the slot. If a volume is already mounted the slot is
    /// left untouched and `disk` is handed back.
    pub fn mount(&mut self, disk: D, options: MountOptions) -> Result<&MountedVolume<D>, D> {
        if self.mounted.is_some() {
            log::warn!("fat32: a volume is already mounted, unmount it first");
            return Err(disk);
        }
        Ok(self.mounted.insert(MountedVolume::mount(disk, options)))
    }

    pub fn unmount(&mut self) -> Option<D> {
        let volume = self.mounted.take()?;
        log::info!("fat32: unmounted");
        Some(volume.into_disk())
    }

    pub fn volume(&self) -> VfsResult<&MountedVolume<D>> {
        self.mounted.as_ref().ok_or(VfsError::NotMounted)
    }

    pub fn root(&self) -> VfsResult<DirNode<'_, D>> {
        self.volume().map(MountedVolume::root)
    }
}

impl<D> Default for VolumeSlot<D> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
