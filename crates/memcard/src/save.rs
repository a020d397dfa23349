use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime};
use log::{debug, info};

use crate::dir_entry::{validate_name, DirEntry, SAVE_DIR_MODE};
use crate::geometry::CLUSTER_SIZE;
use crate::title::TitleDecoder;
use crate::transfer::{install_chain, Reporter};
use crate::{Error, Memcard, Result};

const PRODUCT_CODE_LEN: usize = 11;

/// A save directory as seen by a single enumeration of the card.
///
/// Nothing here is cached on the card: every mutating call re-resolves the
/// save by its directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Save {
    pub title: String,
    pub product_code: String,
    pub last_modified: NaiveDateTime,
    pub directory_name: String,
    pub cluster: u16,
    pub size: u32,
    pub mode: u16,
    pub created: u32,
    pub slot: usize,
}

impl Save {
    fn from_entry(slot: usize, entry: DirEntry) -> Self {
        let product_code = entry.name.chars().take(PRODUCT_CODE_LEN).collect();
        Self {
            title: entry.name.clone(),
            product_code,
            last_modified: convert_timestamp(entry.created),
            directory_name: entry.name,
            cluster: entry.cluster,
            size: entry.length,
            mode: entry.mode,
            created: entry.created,
            slot,
        }
    }
}

fn convert_timestamp(seconds: u32) -> NaiveDateTime {
    DateTime::from_timestamp(i64::from(seconds), 0)
        .map(|time| time.with_timezone(&Local).naive_local())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Psu,
    Max,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Psu => "psu",
            ExportFormat::Max => "max",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// Both formats are currently the raw chain bytes; `.max` has no header yet.
    pub fn encode(self, data: Vec<u8>) -> Vec<u8> {
        match self {
            ExportFormat::Psu | ExportFormat::Max => data,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("psu") {
            Ok(ExportFormat::Psu)
        } else if s.eq_ignore_ascii_case("max") {
            Ok(ExportFormat::Max)
        } else {
            Err(Error::ConfigError(format!("unknown export format `{s}`")))
        }
    }
}

/// Diagnostic view of one save's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub directory_name: String,
    pub product_code: String,
    pub last_modified: NaiveDateTime,
    pub cluster: u16,
    pub size: u32,
    pub raw_size: usize,
    pub estimated_clusters: usize,
    pub title: Option<String>,
    pub error: Option<String>,
}

impl Memcard {
    pub(crate) fn save_at(&self, slot: usize) -> Option<Save> {
        let entry = self.read_dir_entry(slot)?;
        let cluster_count = self.geometry().cluster_count();
        if entry.cluster < 2 || usize::from(entry.cluster) >= cluster_count {
            debug!(
                "slot {slot} ({}) points at invalid cluster {}, skipping",
                entry.name, entry.cluster
            );
            return None;
        }
        Some(Save::from_entry(slot, entry))
    }

    pub fn list_saves(&self) -> Vec<Save> {
        self.dir_entries()
            .filter_map(|(slot, _)| self.save_at(slot))
            .collect()
    }

    fn resolve(&self, save: &Save) -> Result<(usize, DirEntry)> {
        self.find_by_name(&save.directory_name)
            .and_then(|slot| self.read_dir_entry(slot).map(|entry| (slot, entry)))
            .ok_or_else(|| Error::NotFound(save.directory_name.clone()))
    }

    pub fn rename(&mut self, save: &Save, new_name: &str) -> Result<()> {
        validate_name(new_name)?;
        let (slot, _) = self.resolve(save)?;
        if let Some(other) = self.find_by_name(new_name) {
            if other != slot {
                return Err(Error::NameExists(new_name.to_owned()));
            }
        }

        self.write_dir_name(slot, new_name);
        info!("renamed {} to {new_name}", save.directory_name);
        Ok(())
    }

    /// Tombstones the entry and releases its clusters.
    pub fn delete(&mut self, save: &Save) -> Result<()> {
        let (slot, entry) = self.resolve(save)?;
        self.mark_deleted(slot);
        let freed = self.free_chain(entry.cluster);
        info!("deleted {} ({freed} clusters freed)", save.directory_name);
        Ok(())
    }

    /// The concatenated bytes of the save's cluster chain.
    pub fn save_data(&self, save: &Save) -> Result<Vec<u8>> {
        let (_, entry) = self.resolve(save)?;
        let clusters = self.read_chain(entry.cluster);
        if clusters.is_empty() {
            return Err(Error::EmptyChain(entry.cluster));
        }
        Ok(clusters.concat())
    }

    pub fn export(&self, save: &Save, output: &Path, format: ExportFormat) -> Result<()> {
        let data = self.save_data(save)?;
        std::fs::write(output, format.encode(data))?;
        info!("exported {} to {}", save.directory_name, output.display());
        Ok(())
    }

    /// Installs raw save bytes as a new save directory.
    pub fn import(&mut self, name: &str, data: &[u8], created: u32) -> Result<Save> {
        validate_name(name)?;
        if self.find_by_name(name).is_some() {
            return Err(Error::NameExists(name.to_owned()));
        }
        let length = u32::try_from(data.len()).map_err(|_| Error::DestinationFull)?;

        let mut clusters: Vec<&[u8]> = data.chunks(CLUSTER_SIZE).collect();
        if clusters.is_empty() {
            clusters.push(&[]);
        }

        let template = DirEntry {
            name: name.to_owned(),
            mode: SAVE_DIR_MODE,
            length,
            created,
            cluster: 0,
            dir_index: 0,
        };
        let mut reporter = Reporter::new(|_, _: &str| true);
        let slot = install_chain(self, template, &clusters, &mut reporter)?;
        info!("imported {name} ({} bytes)", data.len());
        self.save_at(slot)
            .ok_or_else(|| Error::NotFound(name.to_owned()))
    }

    pub fn inspect(&self, save: &Save, decoder: &dyn TitleDecoder) -> Inspection {
        let mut inspection = Inspection {
            directory_name: save.directory_name.clone(),
            product_code: save.product_code.clone(),
            last_modified: save.last_modified,
            cluster: save.cluster,
            size: save.size,
            raw_size: 0,
            estimated_clusters: 0,
            title: None,
            error: None,
        };

        match self.save_data(save) {
            Ok(data) => {
                inspection.raw_size = data.len();
                inspection.estimated_clusters = data.len() / CLUSTER_SIZE;
                inspection.title = decoder.decode_title(&data);
            }
            Err(err) => inspection.error = Some(err.to_string()),
        }
        inspection
    }
}
