use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::info;

use crate::fat::FAT_END_OF_CHAIN;
use crate::geometry::{Geometry, SizeTier, FAT_ENTRY_SIZE};
use crate::{Memcard, Result};

pub const CARD_MAGIC: &[u8; 28] = b"Sony PS2 Memory Card Format ";

fn blank_image(geometry: &Geometry) -> Vec<u8> {
    let mut data = vec![0u8; geometry.card_size()];
    data[..CARD_MAGIC.len()].copy_from_slice(CARD_MAGIC);

    // Clusters 0 and 1 belong to the system area.
    let fat = geometry.fat_offset();
    for cluster in 0..2 {
        let offset = fat + cluster * FAT_ENTRY_SIZE;
        LittleEndian::write_u16(&mut data[offset..offset + FAT_ENTRY_SIZE], FAT_END_OF_CHAIN);
    }
    data
}

impl Memcard {
    /// A freshly formatted card that only exists in memory.
    pub fn blank(tier: SizeTier) -> Self {
        let geometry = Geometry::new(tier);
        Memcard::from_parts(blank_image(&geometry), geometry, true)
    }

    /// Formats a new card and writes it to `path` straight away.
    pub fn create(path: impl AsRef<Path>, tier: SizeTier) -> Result<Self> {
        let mut card = Self::blank(tier);
        card.persist_to(path)?;
        Ok(card)
    }

    /// Wipes every save. The change stays in memory until the card is persisted.
    pub fn format(&mut self) {
        let data = blank_image(self.geometry());
        self.replace_data(data);
        info!("formatted {} card", self.tier());
    }
}
