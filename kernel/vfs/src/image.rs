//! Test images: hand-laid-out volumes and `fatfs`-formatted ones.

extern crate std;

use std::cell::Cell;
use std::io::{Cursor, Write};
use std::rc::Rc;
use std::vec;
use std::vec::Vec;

use crate::block::{BlockReader, RamDisk, SECTOR_SIZE};
use crate::dir::{Attributes, DIR_RECORD_SIZE, DirRecord, encode_short_name};
use crate::geometry::VolumeGeometry;

pub const FAT32_EOC: u32 = 0x0FFF_FFFF;

/// Boot sector with a FAT32 extended BPB and 512-byte sectors.
pub fn boot_sector(
    sectors_per_cluster: u8,
    reserved_sectors: u16,
    fat_count: u8,
    sectors_per_fat: u32,
    root_cluster: u32,
) -> [u8; SECTOR_SIZE] {
    let mut sec = [0u8; SECTOR_SIZE];
    sec[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
    sec[3..11].copy_from_slice(b"MSWIN4.1");
    sec[11..13].copy_from_slice(&512u16.to_le_bytes());
    sec[13] = sectors_per_cluster;
    sec[14..16].copy_from_slice(&reserved_sectors.to_le_bytes());
    sec[16] = fat_count;
    sec[36..40].copy_from_slice(&sectors_per_fat.to_le_bytes());
    sec[44..48].copy_from_slice(&root_cluster.to_le_bytes());
    sec[66] = 0x29;
    sec[67..71].copy_from_slice(&0x1234_5678u32.to_le_bytes());
    sec[71..82].copy_from_slice(b"NO NAME    ");
    sec[82..90].copy_from_slice(b"FAT32   ");
    sec[510] = 0x55;
    sec[511] = 0xAA;
    sec
}

/// Builds a small volume byte by byte.
pub struct ImageBuilder {
    image:    Vec<u8>,
    geometry: VolumeGeometry,
}

impl ImageBuilder {
    pub fn new(
        sectors_per_cluster: u8,
        reserved_sectors: u16,
        fat_count: u8,
        sectors_per_fat: u32,
        root_cluster: u32,
        data_clusters: u32,
    ) -> Self {
        let boot = boot_sector(sectors_per_cluster, reserved_sectors, fat_count, sectors_per_fat, root_cluster);
        let geometry = VolumeGeometry::parse(&boot);
        let sectors = geometry.cluster_region_start() + data_clusters * sectors_per_cluster as u32;
        let mut image = vec![0u8; sectors as usize * SECTOR_SIZE];
        image[..SECTOR_SIZE].copy_from_slice(&boot);
        let mut builder = Self { image, geometry };
        builder.fat(0, 0x0FFF_FFF8).fat(1, FAT32_EOC).fat(root_cluster, FAT32_EOC);
        builder
    }

    /// 1 reserved sector, one 10-sector FAT, 1 sector per cluster, root at 2.
    pub fn reference() -> Self {
        Self::new(1, 1, 1, 10, 2, 32)
    }

    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    fn cluster_offset(&self, cluster: u32) -> usize {
        let lba = self.geometry.cluster_region_start() + (cluster - 2) * self.geometry.sectors_per_cluster as u32;
        lba as usize * SECTOR_SIZE
    }

    /// Set the FAT entry for `cluster` in every FAT copy.
    pub fn fat(&mut self, cluster: u32, value: u32) -> &mut Self {
        for copy in 0..self.geometry.fat_count as u32 {
            let fat_start = (self.geometry.fat_region_start() + copy * self.geometry.sectors_per_fat) as usize * SECTOR_SIZE;
            let off = fat_start + cluster as usize * 4;
            self.image[off..off + 4].copy_from_slice(&value.to_le_bytes());
        }
        self
    }

    /// Link `clusters` into one chain ending in end-of-chain.
    pub fn chain(&mut self, clusters: &[u32]) -> &mut Self {
        for pair in clusters.windows(2) {
            self.fat(pair[0], pair[1]);
        }
        if let Some(&last) = clusters.last() {
            self.fat(last, FAT32_EOC);
        }
        self
    }

    /// Raw 32-byte record at `slot` of the directory whose data starts at `dir_cluster`.
    /// Slots past the first cluster land in the following cluster on disk.
    pub fn raw_record(&mut self, dir_cluster: u32, slot: usize, raw: [u8; DIR_RECORD_SIZE]) -> &mut Self {
        let off = self.cluster_offset(dir_cluster) + slot * DIR_RECORD_SIZE;
        self.image[off..off + DIR_RECORD_SIZE].copy_from_slice(&raw);
        self
    }

    pub fn record(&mut self, dir_cluster: u32, slot: usize, name: &[u8; 11], attr: Attributes, cluster: u32, size: u32) -> &mut Self {
        self.raw_record(dir_cluster, slot, DirRecord::new(*name, attr, cluster, size).encode())
    }

    /// File record plus its contents, contiguous from `cluster`.
    pub fn file(&mut self, dir_cluster: u32, slot: usize, name: &str, cluster: u32, contents: &[u8]) -> &mut Self {
        let raw_name = encode_short_name(name).expect("test file name must be 8.3");
        self.record(dir_cluster, slot, &raw_name, Attributes::ARCHIVE, cluster, contents.len() as u32);
        self.data(cluster, contents)
    }

    pub fn dir(&mut self, dir_cluster: u32, slot: usize, name: &str, cluster: u32) -> &mut Self {
        let raw_name = encode_short_name(name).expect("test dir name must be 8.3");
        self.record(dir_cluster, slot, &raw_name, Attributes::DIRECTORY, cluster, 0);
        self.fat(cluster, FAT32_EOC)
    }

    pub fn data(&mut self, cluster: u32, contents: &[u8]) -> &mut Self {
        let off = self.cluster_offset(cluster);
        self.image[off..off + contents.len()].copy_from_slice(contents);
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.image.clone()
    }

    pub fn build(&self) -> RamDisk<Vec<u8>> {
        RamDisk::new(self.bytes())
    }
}

/// Wraps a device and counts the requests it sees.
pub struct CountingDisk<D> {
    pub inner: D,
    reads:     Rc<Cell<usize>>,
}

impl<D> CountingDisk<D> {
    pub fn new(inner: D) -> (Self, Rc<Cell<usize>>) {
        let reads = Rc::new(Cell::new(0));
        (Self { inner, reads: reads.clone() }, reads)
    }
}

impl<D: BlockReader> BlockReader for CountingDisk<D> {
    fn read(&mut self, lba: u32, count: u8, buf: &mut [u8]) {
        self.reads.set(self.reads.get() + 1);
        self.inner.read(lba, count, buf)
    }
    fn write(&mut self, lba: u32, count: u8, buf: &[u8]) {
        self.inner.write(lba, count, buf)
    }
}

// ─── fatfs-built images ───────────────────────────────────────────────────────

/// Format a FAT32 image with `fatfs` and populate it.
///
/// FAT32 needs ≥65 525 data clusters, so `fatfs` only picks it for disks of
/// roughly 34 MB and up. We use 40 MB.
pub fn fatfs_image(dirs: &[&str], files: &[(&str, &[u8])]) -> Vec<u8> {
    const SIZE: usize = 40 * 1024 * 1024;
    let mut cursor = Cursor::new(vec![0u8; SIZE]);
    fatfs::format_volume(
        &mut cursor,
        fatfs::FormatVolumeOptions::new().fat_type(fatfs::FatType::Fat32),
    ).expect("format_volume failed");
    {
        let fs = fatfs::FileSystem::new(&mut cursor, fatfs::FsOptions::new())
            .expect("FileSystem::new failed");
        let root = fs.root_dir();
        for dir in dirs {
            root.create_dir(dir).expect("create_dir failed");
        }
        for (path, content) in files {
            let mut f = root.create_file(path).expect("create_file failed");
            f.truncate().unwrap();
            f.write_all(content).unwrap();
        }
    }
    cursor.into_inner()
}

/// Sector 0 of an image, for reading its geometry before mounting.
pub fn geometry_of(image: &[u8]) -> VolumeGeometry {
    let mut sec = [0u8; SECTOR_SIZE];
    sec.copy_from_slice(&image[..SECTOR_SIZE]);
    VolumeGeometry::parse(&sec)
}
