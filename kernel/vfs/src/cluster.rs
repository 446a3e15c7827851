//! Cluster number → sector translation and FAT chain walking.

use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;

use crate::block::{BlockReader, SECTOR_SIZE};
use crate::geometry::VolumeGeometry;

const FAT32_EOC:  u32 = 0x0FFF_FFF8;
const FAT32_BAD:  u32 = 0x0FFF_FFF7;
const FAT32_MASK: u32 = 0x0FFF_FFFF;

/// First cluster number that addresses data; 0 and 1 are reserved.
pub const FIRST_DATA_CLUSTER: u32 = 2;

pub struct ClusterTranslator<'v, D> {
    geometry: &'v VolumeGeometry,
    disk:     &'v Mutex<D>,
}

impl<'v, D: BlockReader> ClusterTranslator<'v, D> {
    pub(crate) fn new(geometry: &'v VolumeGeometry, disk: &'v Mutex<D>) -> Self {
        Self { geometry, disk }
    }

    pub fn cluster_lba(&self, cluster: u32) -> u32 {
        let index = cluster.wrapping_sub(FIRST_DATA_CLUSTER);
        self.geometry
            .cluster_region_start()
            .wrapping_add(index.wrapping_mul(self.geometry.sectors_per_cluster as u32))
    }

    /// Read one whole cluster.
    ///
    /// Issues a single device request and trusts it: if the device transfers
    /// less than asked, the tail of the buffer stays zeroed.
    pub fn read_cluster(&self, cluster: u32) -> Vec<u8> {
        let mut buf = vec![0u8; self.geometry.cluster_size_bytes()];
        if cluster < FIRST_DATA_CLUSTER {
            log::warn!("fat32: request for reserved cluster {cluster}, returning zeroes");
            return buf;
        }
        let lba = self.cluster_lba(cluster);
        log::trace!("fat32: read cluster {cluster} at LBA {lba}");
        self.disk.lock().read(lba, self.geometry.sectors_per_cluster, &mut buf);
        buf
    }

    /// Follow the FAT from `cluster`. `None` at end of chain, on a bad or free
    /// entry, or when the entry lies outside the FAT.
    pub fn next_cluster(&self, cluster: u32) -> Option<u32> {
        if (cluster as u64) >= self.geometry.fat_entry_count() {
            return None;
        }
        let byte_offset = cluster as usize * 4;
        let lba = self.geometry.fat_region_start().wrapping_add((byte_offset / SECTOR_SIZE) as u32);
        let off = byte_offset % SECTOR_SIZE;

        let mut sec = [0u8; SECTOR_SIZE];
        self.disk.lock().read(lba, 1, &mut sec);
        let entry = u32::from_le_bytes([sec[off], sec[off + 1], sec[off + 2], sec[off + 3]]) & FAT32_MASK;

        match entry {
            e if e >= FAT32_EOC => None,
            FAT32_BAD => None,
            e if e < FIRST_DATA_CLUSTER => None,
            e => Some(e),
        }
    }

    /// Iterate the cluster numbers of the chain starting at `start`.
    pub fn chain(&self, start: u32) -> ClusterChain<'_, 'v, D> {
        ClusterChain {
            translator: self,
            current:    (start >= FIRST_DATA_CLUSTER).then_some(start),
            started:    false,
            remaining:  self.geometry.fat_entry_count().max(1),
        }
    }
}

/// Lazily walks a cluster chain. The FAT is only consulted when the caller
/// asks for the cluster after the current one, so `chain(c).take(1)` never
/// touches it.
pub struct ClusterChain<'t, 'v, D> {
    translator: &'t ClusterTranslator<'v, D>,
    current:    Option<u32>,
    started:    bool,
    remaining:  u64,
}

impl<D: BlockReader> Iterator for ClusterChain<'_, '_, D> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let current = self.current?;
        self.current = if self.started {
            self.translator.next_cluster(current)
        } else {
            self.started = true;
            Some(current)
        };
        let cluster = self.current?;
        if self.remaining == 0 {
            log::warn!("fat32: cluster chain longer than the FAT, stopping after {current}");
            self.current = None;
            return None;
        }
        self.remaining -= 1;
        Some(cluster)
    }
}
