//! Boot parameter block parsing.
//!
//! Parsing never fails. A sector that is not a FAT32 boot sector produces
//! nonsensical but deterministic numbers, so a missing volume cannot keep the
//! rest of the kernel from booting.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::block::SECTOR_SIZE;

/// Extended boot signature values accepted for FAT32.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
pub enum BootSignature {
    /// Only the volume serial number follows.
    Legacy = 0x28,
    /// Serial number, volume label and fs-type string follow.
    Extended = 0x29,
}

/// Layout constants of a mounted volume. All sector numbers are LBAs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeGeometry {
    pub bytes_per_sector:    u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors:    u16,
    pub fat_count:           u8,
    pub total_sectors_16:    u16,
    pub total_sectors_32:    u32,
    pub sectors_per_fat:     u32,
    pub root_cluster:        u32,
    pub boot_signature:      u8,
    pub volume_id:           u32,
    pub volume_label:        [u8; 11],
    pub fs_type:             [u8; 8],
}

fn le_u16(b: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([b[off], b[off + 1]])
}

fn le_u32(b: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

impl VolumeGeometry {
    /// Read the BPB fields at their canonical FAT32 offsets.
    pub fn parse(sector: &[u8; SECTOR_SIZE]) -> Self {
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&sector[71..82]);
        let mut fs_type = [0u8; 8];
        fs_type.copy_from_slice(&sector[82..90]);

        Self {
            bytes_per_sector:    le_u16(sector, 11),
            sectors_per_cluster: sector[13],
            reserved_sectors:    le_u16(sector, 14),
            fat_count:           sector[16],
            total_sectors_16:    le_u16(sector, 19),
            total_sectors_32:    le_u32(sector, 32),
            sectors_per_fat:     le_u32(sector, 36),
            root_cluster:        le_u32(sector, 44),
            boot_signature:      sector[66],
            volume_id:           le_u32(sector, 67),
            volume_label,
            fs_type,
        }
    }

    pub fn fat_region_start(&self) -> u32 {
        self.reserved_sectors as u32
    }

    pub fn cluster_region_start(&self) -> u32 {
        let fats = (self.fat_count as u32).wrapping_mul(self.sectors_per_fat);
        self.fat_region_start().wrapping_add(fats)
    }

    pub fn cluster_size_bytes(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR_SIZE
    }

    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }

    /// Number of 32-bit entries one copy of the FAT can hold.
    pub fn fat_entry_count(&self) -> u64 {
        self.sectors_per_fat as u64 * (SECTOR_SIZE / 4) as u64
    }

    pub fn signature(&self) -> Option<BootSignature> {
        BootSignature::try_from(self.boot_signature).ok()
    }

    pub fn has_fat32_signature(&self) -> bool {
        self.signature().is_some()
    }

    /// Volume label with trailing padding removed; empty for legacy signatures.
    pub fn label(&self) -> &[u8] {
        if self.signature() != Some(BootSignature::Extended) {
            return &[];
        }
        let end = self.volume_label.iter().rposition(|&b| b != b' ' && b != 0).map_or(0, |i| i + 1);
        &self.volume_label[..end]
    }
}
