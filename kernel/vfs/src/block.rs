//! Sector-level storage seen by the filesystem.
//!
//! Sectors are always 512 bytes. The contract has no error channel: a device
//! that cannot satisfy a request clamps or ignores it, and whatever was in the
//! caller's buffer stays there.

pub const SECTOR_SIZE: usize = 512;

pub trait BlockReader {
    /// Read `count` sectors starting at `lba` into `buf` (`count * 512` bytes).
    fn read(&mut self, lba: u32, count: u8, buf: &mut [u8]);
    /// Write `count` sectors starting at `lba` from `buf`.
    fn write(&mut self, lba: u32, count: u8, buf: &[u8]);
}

impl<T: BlockReader + ?Sized> BlockReader for &mut T {
    fn read(&mut self, lba: u32, count: u8, buf: &mut [u8]) {
        (**self).read(lba, count, buf)
    }
    fn write(&mut self, lba: u32, count: u8, buf: &[u8]) {
        (**self).write(lba, count, buf)
    }
}

/// Disk image held in memory (e.g. linked into the kernel binary).
///
/// Requests running past the end of the image are clamped; requests starting
/// past it are ignored.
pub struct RamDisk<B> {
    image: B,
}

impl<B: AsRef<[u8]>> RamDisk<B> {
    pub const fn new(image: B) -> Self {
        Self { image }
    }

    pub fn sector_count(&self) -> u32 {
        (self.image.as_ref().len() / SECTOR_SIZE) as u32
    }

    pub fn into_inner(self) -> B {
        self.image
    }

    /// Byte range of the image covered by a request, clamped to the image.
    fn span(&self, lba: u32, count: u8, buf_len: usize) -> Option<(usize, usize)> {
        let len = self.image.as_ref().len();
        let offset = lba as usize * SECTOR_SIZE;
        if offset >= len {
            return None;
        }
        let size = (count as usize * SECTOR_SIZE).min(buf_len).min(len - offset);
        Some((offset, size))
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BlockReader for RamDisk<B> {
    fn read(&mut self, lba: u32, count: u8, buf: &mut [u8]) {
        let Some((offset, size)) = self.span(lba, count, buf.len()) else { return };
        buf[..size].copy_from_slice(&self.image.as_ref()[offset..offset + size]);
    }

    fn write(&mut self, lba: u32, count: u8, buf: &[u8]) {
        let Some((offset, size)) = self.span(lba, count, buf.len()) else { return };
        self.image.as_mut()[offset..offset + size].copy_from_slice(&buf[..size]);
    }
}
