//! The cluster allocation table.
//!
//! One little-endian `u16` per cluster, stored right after the two system
//! blocks. `0x0000` is free, `0xFF00` and above terminate a chain, anything
//! else links to the next cluster.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::geometry::FAT_ENTRY_SIZE;
use crate::Memcard;

pub const FAT_FREE: u16 = 0x0000;
pub const FAT_END_OF_CHAIN: u16 = 0xFFFF;
pub const FAT_SENTINEL_MIN: u16 = 0xFF00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    Free,
    Next(u16),
    EndOfChain(u16),
}

impl From<u16> for FatEntry {
    fn from(value: u16) -> Self {
        match value {
            FAT_FREE => FatEntry::Free,
            v if v >= FAT_SENTINEL_MIN => FatEntry::EndOfChain(v),
            v => FatEntry::Next(v),
        }
    }
}

impl From<FatEntry> for u16 {
    fn from(entry: FatEntry) -> Self {
        match entry {
            FatEntry::Free => FAT_FREE,
            FatEntry::Next(v) | FatEntry::EndOfChain(v) => v,
        }
    }
}

impl Memcard {
    fn fat_entry_offset(&self, cluster: u16) -> Option<usize> {
        if usize::from(cluster) >= self.geometry().cluster_count() {
            return None;
        }
        Some(self.geometry().fat_offset() + usize::from(cluster) * FAT_ENTRY_SIZE)
    }

    /// Raw FAT value. Clusters past the table read as end-of-chain.
    pub fn read_fat_entry(&self, cluster: u16) -> u16 {
        self.fat_entry_offset(cluster)
            .and_then(|offset| self.bytes(offset, FAT_ENTRY_SIZE))
            .map(LittleEndian::read_u16)
            .unwrap_or(FAT_END_OF_CHAIN)
    }

    pub fn fat_entry(&self, cluster: u16) -> FatEntry {
        FatEntry::from(self.read_fat_entry(cluster))
    }

    pub fn write_fat_entry(&mut self, cluster: u16, value: u16) {
        let Some(offset) = self.fat_entry_offset(cluster) else {
            debug!("ignoring FAT write past the table: cluster {cluster} = {value:#06x}");
            return;
        };
        if let Some(bytes) = self.bytes_mut(offset, FAT_ENTRY_SIZE) {
            LittleEndian::write_u16(bytes, value);
        }
    }

    /// Clusters the allocator may hand out, capped by [`Limits::max_scan_clusters`].
    ///
    /// [`Limits::max_scan_clusters`]: crate::Limits::max_scan_clusters
    fn allocatable_clusters(&self) -> std::ops::Range<u16> {
        let geometry = self.geometry();
        let cap = self.limits().max_scan_clusters.min(usize::from(u16::MAX)) as u16;
        geometry.first_data_cluster()..geometry.data_cluster_end().min(cap)
    }

    pub fn find_free_cluster(&self) -> Option<u16> {
        self.allocatable_clusters()
            .find(|&cluster| self.read_fat_entry(cluster) == FAT_FREE)
    }

    /// Free data clusters on the whole card, regardless of the scan cap.
    pub fn free_cluster_count(&self) -> usize {
        let geometry = self.geometry();
        (geometry.first_data_cluster()..geometry.data_cluster_end())
            .filter(|&cluster| self.read_fat_entry(cluster) == FAT_FREE)
            .count()
    }

    /// Releases every cluster of the chain starting at `start`.
    ///
    /// Walks the chain with the same bounds as [`Memcard::read_chain`], so a
    /// cyclic or runaway chain stops instead of looping. Returns how many
    /// entries were cleared.
    pub fn free_chain(&mut self, start: u16) -> usize {
        let clusters = self.chain_clusters(start);
        for &cluster in &clusters {
            self.write_fat_entry(cluster, FAT_FREE);
        }
        debug!("freed {} clusters starting at {start}", clusters.len());
        clusters.len()
    }
}
