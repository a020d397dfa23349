//! The 64-slot directory table that names each save.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::geometry::{DIR_ENTRY_COUNT, DIR_ENTRY_SIZE};
use crate::{Error, Memcard, Result};

pub const NAME_LEN: usize = 16;

pub const STATUS_FREE: u8 = 0x00;
pub const STATUS_DELETED: u8 = 0x51;

pub const MODE_READ: u16 = 0x0001;
pub const MODE_WRITE: u16 = 0x0002;
pub const MODE_EXECUTE: u16 = 0x0004;
pub const MODE_DIRECTORY: u16 = 0x2000;
pub const MODE_EXISTS: u16 = 0x8000;

/// Mode given to save directories created on this side.
pub const SAVE_DIR_MODE: u16 = MODE_EXISTS | MODE_DIRECTORY | MODE_READ | MODE_WRITE | MODE_EXECUTE;

const MODE_OFFSET: usize = 0x10;
const LENGTH_OFFSET: usize = 0x14;
const CREATED_OFFSET: usize = 0x18;
const CLUSTER_OFFSET: usize = 0x1C;
const INDEX_OFFSET: usize = 0x1E;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Free,
    Deleted,
    Active,
}

impl EntryStatus {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            STATUS_FREE => EntryStatus::Free,
            STATUS_DELETED => EntryStatus::Deleted,
            _ => EntryStatus::Active,
        }
    }

    pub fn is_reusable(self) -> bool {
        !matches!(self, EntryStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub mode: u16,
    pub length: u32,
    /// POSIX seconds.
    pub created: u32,
    pub cluster: u16,
    pub dir_index: u16,
}

impl DirEntry {
    pub fn is_directory(&self) -> bool {
        self.mode & MODE_DIRECTORY != 0
    }

    /// # Panics
    ///
    /// Panics if `record` is shorter than 32 bytes.
    pub fn decode(record: &[u8]) -> Self {
        let name_field = &record[..NAME_LEN];
        let name_len = name_field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);

        Self {
            name: String::from_utf8_lossy(&name_field[..name_len]).into_owned(),
            mode: LittleEndian::read_u16(&record[MODE_OFFSET..]),
            length: LittleEndian::read_u32(&record[LENGTH_OFFSET..]),
            created: LittleEndian::read_u32(&record[CREATED_OFFSET..]),
            cluster: LittleEndian::read_u16(&record[CLUSTER_OFFSET..]),
            dir_index: LittleEndian::read_u16(&record[INDEX_OFFSET..]),
        }
    }

    /// Serializes over a whole record. Names longer than 16 bytes are cut.
    ///
    /// # Panics
    ///
    /// Panics if `record` is shorter than a 512-byte directory record.
    pub fn encode(&self, record: &mut [u8]) {
        record[..DIR_ENTRY_SIZE].fill(0);
        record[..NAME_LEN].copy_from_slice(&name_field(&self.name));
        LittleEndian::write_u16(&mut record[MODE_OFFSET..], self.mode);
        LittleEndian::write_u32(&mut record[LENGTH_OFFSET..], self.length);
        LittleEndian::write_u32(&mut record[CREATED_OFFSET..], self.created);
        LittleEndian::write_u16(&mut record[CLUSTER_OFFSET..], self.cluster);
        LittleEndian::write_u16(&mut record[INDEX_OFFSET..], self.dir_index);
    }
}

fn name_field(name: &str) -> [u8; NAME_LEN] {
    let mut field = [0u8; NAME_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(NAME_LEN);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// Checks a name before it is written to an entry.
///
/// Names are printable ASCII, at most 16 characters, and may not start with
/// the deleted-entry marker `Q`.
pub fn validate_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len > NAME_LEN {
        return Err(Error::NameTooLong(len));
    }
    let printable = name.chars().all(|c| c.is_ascii_graphic() || c == ' ');
    let starts_like_status = matches!(name.as_bytes().first(), None | Some(&STATUS_DELETED));
    if !printable || starts_like_status {
        return Err(Error::InvalidName(name.to_owned()));
    }
    Ok(())
}

impl Memcard {
    fn dir_record(&self, slot: usize) -> Option<&[u8]> {
        if slot >= DIR_ENTRY_COUNT {
            return None;
        }
        self.bytes(self.geometry().dir_entry_offset(slot), DIR_ENTRY_SIZE)
    }

    pub fn entry_status(&self, slot: usize) -> Option<EntryStatus> {
        self.dir_record(slot)
            .map(|record| EntryStatus::from_byte(record[0]))
    }

    /// Decodes a slot regardless of its status.
    pub fn read_dir_entry(&self, slot: usize) -> Option<DirEntry> {
        self.dir_record(slot).map(DirEntry::decode)
    }

    fn active_entries(&self) -> impl Iterator<Item = (usize, DirEntry)> + '_ {
        (0..DIR_ENTRY_COUNT)
            .filter(move |&slot| self.entry_status(slot) == Some(EntryStatus::Active))
            .filter_map(move |slot| self.read_dir_entry(slot).map(|entry| (slot, entry)))
    }

    /// Active save directories in slot order.
    pub fn dir_entries(&self) -> impl Iterator<Item = (usize, DirEntry)> + '_ {
        self.active_entries().filter(|(slot, entry)| {
            if !entry.is_directory() {
                debug!("slot {slot} ({}) is not a directory, skipping", entry.name);
            }
            entry.is_directory()
        })
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.active_entries()
            .find(|(_, entry)| entry.name == name)
            .map(|(slot, _)| slot)
    }

    pub fn allocate_slot(&self) -> Option<usize> {
        (0..DIR_ENTRY_COUNT).find(|&slot| {
            self.entry_status(slot)
                .map(EntryStatus::is_reusable)
                .unwrap_or(false)
        })
    }

    pub fn write_dir_entry(&mut self, slot: usize, entry: &DirEntry) {
        if slot >= DIR_ENTRY_COUNT {
            debug!("ignoring write to directory slot {slot}");
            return;
        }
        let offset = self.geometry().dir_entry_offset(slot);
        if let Some(record) = self.bytes_mut(offset, DIR_ENTRY_SIZE) {
            entry.encode(record);
        }
    }

    pub(crate) fn write_dir_name(&mut self, slot: usize, name: &str) {
        if slot >= DIR_ENTRY_COUNT {
            return;
        }
        let offset = self.geometry().dir_entry_offset(slot);
        if let Some(field) = self.bytes_mut(offset, NAME_LEN) {
            field.copy_from_slice(&name_field(name));
        }
    }

    /// Tombstones a slot. The rest of the record is left as it was.
    pub fn mark_deleted(&mut self, slot: usize) {
        if slot >= DIR_ENTRY_COUNT {
            return;
        }
        let offset = self.geometry().dir_entry_offset(slot);
        if let Some(status) = self.bytes_mut(offset, 1) {
            status[0] = STATUS_DELETED;
        }
    }
}
