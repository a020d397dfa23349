use std::fmt;
use std::str::FromStr;

use crate::Error;

pub const BLOCK_SIZE: usize = 512;
pub const CLUSTER_SIZE: usize = 1024;
pub const FAT_ENTRY_SIZE: usize = 2;
pub const DIR_ENTRY_SIZE: usize = 512;
pub const DIR_ENTRY_COUNT: usize = 64;

/// Blocks between the start of the directory table and the first data cluster.
pub const DIR_HEADER_BLOCKS: usize = 2;

/// Card capacity. Images are always one of these sizes once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeTier {
    Mb8,
    Mb16,
    Mb32,
}

impl SizeTier {
    pub const ALL: [SizeTier; 3] = [SizeTier::Mb8, SizeTier::Mb16, SizeTier::Mb32];

    pub const fn bytes(self) -> usize {
        match self {
            SizeTier::Mb8 => 8 * 1024 * 1024,
            SizeTier::Mb16 => 16 * 1024 * 1024,
            SizeTier::Mb32 => 32 * 1024 * 1024,
        }
    }

    pub const fn megabytes(self) -> u32 {
        (self.bytes() / (1024 * 1024)) as u32
    }

    /// Smallest tier that can hold `len` bytes.
    pub fn for_len(len: u64) -> Result<SizeTier, Error> {
        SizeTier::ALL
            .into_iter()
            .find(|tier| len <= tier.bytes() as u64)
            .ok_or(Error::UnsupportedSize(len))
    }

    pub fn from_megabytes(mb: u32) -> Result<SizeTier, Error> {
        SizeTier::ALL
            .into_iter()
            .find(|tier| tier.megabytes() == mb)
            .ok_or(Error::UnsupportedSize(u64::from(mb) * 1024 * 1024))
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MiB", self.megabytes())
    }
}

impl FromStr for SizeTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix("MiB")
            .or_else(|| trimmed.strip_suffix("MB"))
            .or_else(|| trimmed.strip_suffix('M'))
            .unwrap_or(trimmed)
            .trim();
        let mb = digits
            .parse::<u32>()
            .map_err(|_| Error::ConfigError(format!("invalid card size `{s}`")))?;
        SizeTier::from_megabytes(mb)
    }
}

/// Byte layout of a card, derived entirely from its tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    tier: SizeTier,
}

impl Geometry {
    pub const fn new(tier: SizeTier) -> Self {
        Self { tier }
    }

    pub const fn tier(&self) -> SizeTier {
        self.tier
    }

    pub const fn card_size(&self) -> usize {
        self.tier.bytes()
    }

    pub const fn cluster_count(&self) -> usize {
        self.card_size() / CLUSTER_SIZE
    }

    pub const fn fat_offset(&self) -> usize {
        BLOCK_SIZE * 2
    }

    pub const fn fat_size(&self) -> usize {
        let bytes = self.cluster_count() * FAT_ENTRY_SIZE;
        bytes.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
    }

    pub const fn directory_offset(&self) -> usize {
        self.fat_offset() + self.fat_size()
    }

    pub const fn dir_entry_offset(&self, slot: usize) -> usize {
        self.directory_offset() + slot * DIR_ENTRY_SIZE
    }

    /// Byte offset of a data cluster. Clusters 0 and 1 have no data region.
    pub fn cluster_offset(&self, cluster: u16) -> Option<usize> {
        let index = usize::from(cluster).checked_sub(2)?;
        Some(self.directory_offset() + DIR_HEADER_BLOCKS * BLOCK_SIZE + index * CLUSTER_SIZE)
    }

    /// First cluster whose data region starts past the directory table.
    pub const fn first_data_cluster(&self) -> u16 {
        let table = DIR_ENTRY_COUNT * DIR_ENTRY_SIZE;
        let overlap = table.saturating_sub(DIR_HEADER_BLOCKS * BLOCK_SIZE);
        (2 + overlap.div_ceil(CLUSTER_SIZE)) as u16
    }

    /// One past the last cluster whose data fits entirely inside the image.
    pub const fn data_cluster_end(&self) -> u16 {
        let data_start = self.directory_offset() + DIR_HEADER_BLOCKS * BLOCK_SIZE;
        let fitting = (self.card_size() - data_start) / CLUSTER_SIZE + 2;
        let end = if fitting < self.cluster_count() {
            fitting
        } else {
            self.cluster_count()
        };
        end as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_offset_for_8mb_card() {
        let geometry = Geometry::new(SizeTier::Mb8);
        let clusters = 8_388_608 / 1024;
        let expected = 1024 + ((clusters * 2 + 511) / 512) * 512;
        assert_eq!(geometry.directory_offset(), expected);
        assert_eq!(geometry.directory_offset(), 17_408);
    }

    #[test]
    fn offsets_follow_cluster_count_on_every_tier() {
        for tier in SizeTier::ALL {
            let geometry = Geometry::new(tier);
            assert_eq!(geometry.fat_offset(), 1024);
            assert_eq!(geometry.fat_size(), geometry.cluster_count() * 2);
            assert_eq!(
                geometry.cluster_offset(2),
                Some(geometry.directory_offset() + 1024)
            );
            assert_eq!(
                geometry.cluster_offset(3).unwrap() - geometry.cluster_offset(2).unwrap(),
                CLUSTER_SIZE
            );
        }
    }

    #[test]
    fn reserved_clusters_have_no_data_offset() {
        let geometry = Geometry::new(SizeTier::Mb16);
        assert_eq!(geometry.cluster_offset(0), None);
        assert_eq!(geometry.cluster_offset(1), None);
    }

    #[test]
    fn allocatable_range_avoids_directory_and_image_end() {
        for tier in SizeTier::ALL {
            let geometry = Geometry::new(tier);
            let first = geometry.first_data_cluster();
            assert_eq!(first, 33);
            let table_end = geometry.directory_offset() + DIR_ENTRY_COUNT * DIR_ENTRY_SIZE;
            assert!(geometry.cluster_offset(first).unwrap() >= table_end);
            assert!(geometry.cluster_offset(first - 1).unwrap() < table_end);

            let end = geometry.data_cluster_end();
            let last = geometry.cluster_offset(end - 1).unwrap();
            assert!(last + CLUSTER_SIZE <= geometry.card_size());
            assert!(geometry.cluster_offset(end).unwrap() + CLUSTER_SIZE > geometry.card_size());
        }
    }

    #[test]
    fn tier_is_rounded_up() {
        assert_eq!(SizeTier::for_len(0).unwrap(), SizeTier::Mb8);
        assert_eq!(SizeTier::for_len(8_388_608).unwrap(), SizeTier::Mb8);
        assert_eq!(SizeTier::for_len(8_388_609).unwrap(), SizeTier::Mb16);
        assert_eq!(SizeTier::for_len(33_554_432).unwrap(), SizeTier::Mb32);
        assert!(matches!(
            SizeTier::for_len(33_554_433),
            Err(Error::UnsupportedSize(33_554_433))
        ));
    }

    #[test]
    fn parses_tier_names() {
        assert_eq!("16".parse::<SizeTier>().unwrap(), SizeTier::Mb16);
        assert_eq!("32MB".parse::<SizeTier>().unwrap(), SizeTier::Mb32);
        assert!("12".parse::<SizeTier>().is_err());
        assert!("big".parse::<SizeTier>().is_err());
    }
}
