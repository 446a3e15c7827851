//! Directory record codec.
//!
//! A directory cluster is an array of 32-byte records. Short (8.3) names are
//! surfaced as-is; long-name records are skipped, never decoded.

use core::fmt;
use core::slice::ChunksExact;

use bitflags::bitflags;

pub const DIR_RECORD_SIZE: usize = 32;

const END_OF_DIRECTORY: u8 = 0x00;
const DELETED:          u8 = 0xE5;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;
        const LONG_NAME = 0x0F;

        // The disk may set any bits
        const _ = !0;
    }
}

// ─── Names ────────────────────────────────────────────────────────────────────

/// Display form of an 8.3 name, e.g. `"README  TXT"` → `README.TXT`.
///
/// Holds raw on-disk bytes; names are compared byte for byte, never
/// case-folded or transcoded.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ShortName {
    bytes: [u8; 12],
    len:   u8,
}

impl ShortName {
    /// Base up to the first space, then `.` and the extension up to its first
    /// space, but only when the extension's first byte is not a space.
    pub fn decode(raw: &[u8; 11]) -> Self {
        let mut name = Self { bytes: [0; 12], len: 0 };
        for &b in raw[..8].iter().take_while(|&&b| b != b' ') {
            name.push(b);
        }
        if raw[8] != b' ' {
            name.push(b'.');
            for &b in raw[8..].iter().take_while(|&&b| b != b' ') {
                name.push(b);
            }
        }
        name
    }

    pub(crate) const fn root() -> Self {
        let mut bytes = [0; 12];
        bytes[0] = b'/';
        Self { bytes, len: 1 }
    }

    fn push(&mut self, b: u8) {
        self.bytes[self.len as usize] = b;
        self.len += 1;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// `None` if the name holds non-UTF-8 (OEM code page) bytes.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exact, case-sensitive comparison.
    pub fn matches(&self, name: &str) -> bool {
        self.as_bytes() == name.as_bytes()
    }
}

impl fmt::Display for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for &b in self.as_bytes() {
            f.write_char(char::from(b))?;
        }
        Ok(())
    }
}

impl fmt::Debug for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// On-disk 11-byte form of a display name, keeping case as given.
///
/// `None` if the name does not fit 8.3, has an empty base or a trailing dot,
/// contains a space, or would start with a sentinel byte.
pub fn encode_short_name(display: &str) -> Option<[u8; 11]> {
    let bytes = display.as_bytes();
    let (base, ext) = match bytes {
        b"." | b".." => (bytes, &[][..]),
        _ => match bytes.iter().rposition(|&b| b == b'.') {
            Some(i) if i + 1 == bytes.len() => return None,
            Some(i) => (&bytes[..i], &bytes[i + 1..]),
            None => (bytes, &[][..]),
        },
    };
    if base.is_empty() || base.len() > 8 || ext.len() > 3 {
        return None;
    }
    if base.contains(&b' ') || ext.contains(&b' ') {
        return None;
    }
    if base[0] == END_OF_DIRECTORY || base[0] == DELETED {
        return None;
    }

    let mut raw = [b' '; 11];
    raw[..base.len()].copy_from_slice(base);
    raw[8..8 + ext.len()].copy_from_slice(ext);
    Some(raw)
}

// ─── Records ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirRecord {
    pub name:         [u8; 11],
    pub attributes:   Attributes,
    pub cluster_high: u16,
    pub cluster_low:  u16,
    pub size:         u32,
}

impl DirRecord {
    /// Record for `cluster`, splitting it into its high and low halves.
    pub fn new(name: [u8; 11], attributes: Attributes, cluster: u32, size: u32) -> Self {
        Self {
            name,
            attributes,
            cluster_high: (cluster >> 16) as u16,
            cluster_low:  cluster as u16,
            size,
        }
    }

    pub fn parse(raw: &[u8; DIR_RECORD_SIZE]) -> Self {
        let mut name = [0u8; 11];
        name.copy_from_slice(&raw[..11]);
        Self {
            name,
            attributes:   Attributes::from_bits_retain(raw[11]),
            cluster_high: u16::from_le_bytes([raw[20], raw[21]]),
            cluster_low:  u16::from_le_bytes([raw[26], raw[27]]),
            size:         u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        }
    }

    /// Timestamps and reserved bytes are written as zero.
    pub fn encode(&self) -> [u8; DIR_RECORD_SIZE] {
        let mut raw = [0u8; DIR_RECORD_SIZE];
        raw[..11].copy_from_slice(&self.name);
        raw[11] = self.attributes.bits();
        raw[20..22].copy_from_slice(&self.cluster_high.to_le_bytes());
        raw[26..28].copy_from_slice(&self.cluster_low.to_le_bytes());
        raw[28..32].copy_from_slice(&self.size.to_le_bytes());
        raw
    }

    pub fn is_end(&self) -> bool       { self.name[0] == END_OF_DIRECTORY }
    pub fn is_deleted(&self) -> bool   { self.name[0] == DELETED }
    pub fn is_long_name(&self) -> bool { self.attributes.contains(Attributes::LONG_NAME) }
    pub fn is_dir(&self) -> bool       { self.attributes.contains(Attributes::DIRECTORY) }

    pub fn cluster(&self) -> u32 {
        ((self.cluster_high as u32) << 16) | self.cluster_low as u32
    }

    pub fn short_name(&self) -> ShortName {
        ShortName::decode(&self.name)
    }
}

// ─── Scanning ─────────────────────────────────────────────────────────────────

/// A record that survived the scan filters.
#[derive(Clone, Copy, Debug)]
pub struct ScanEntry {
    /// Position among surviving records only.
    pub ordinal: u32,
    /// Raw position in the directory, skipped records included.
    pub slot:    u32,
    pub record:  DirRecord,
}

/// Walks the records of one directory cluster in on-disk order.
///
/// Deleted and long-name records are skipped; the end-of-directory sentinel
/// stops the scan for good, whatever follows it.
pub struct Scan<'a> {
    records: ChunksExact<'a, u8>,
    slot:    u32,
    ordinal: u32,
    ended:   bool,
}

pub fn scan(cluster: &[u8]) -> Scan<'_> {
    Scan::resume(cluster, 0, 0)
}

impl<'a> Scan<'a> {
    /// Continue a directory scan into a following cluster.
    pub fn resume(cluster: &'a [u8], first_slot: u32, first_ordinal: u32) -> Self {
        Self {
            records: cluster.chunks_exact(DIR_RECORD_SIZE),
            slot:    first_slot,
            ordinal: first_ordinal,
            ended:   false,
        }
    }

    /// Whether the end-of-directory sentinel was seen.
    pub fn reached_end(&self) -> bool {
        self.ended
    }

    pub fn next_slot(&self) -> u32 {
        self.slot
    }

    pub fn next_ordinal(&self) -> u32 {
        self.ordinal
    }
}

impl Iterator for Scan<'_> {
    type Item = ScanEntry;

    fn next(&mut self) -> Option<ScanEntry> {
        if self.ended {
            return None;
        }
        loop {
            let raw: &[u8; DIR_RECORD_SIZE] = self.records.next()?.try_into().ok()?;
            let slot = self.slot;
            self.slot += 1;

            let record = DirRecord::parse(raw);
            if record.is_end() {
                self.ended = true;
                return None;
            }
            if record.is_deleted() || record.is_long_name() {
                continue;
            }

            let ordinal = self.ordinal;
            self.ordinal += 1;
            return Some(ScanEntry { ordinal, slot, record });
        }
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
