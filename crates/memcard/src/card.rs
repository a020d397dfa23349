use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::geometry::{Geometry, SizeTier};
use crate::{Error, Limits, Result};

/// An in-memory card image.
///
/// The buffer is always exactly one tier long. Every structural write goes
/// through this type and flips the dirty flag; [`Memcard::persist`] is the
/// only way the bytes reach storage again.
#[derive(Debug, Clone)]
pub struct Memcard {
    data: Vec<u8>,
    geometry: Geometry,
    limits: Limits,
    dirty: bool,
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardStats {
    pub tier: SizeTier,
    pub total_clusters: usize,
    pub free_clusters: usize,
    pub saves: usize,
    pub dirty: bool,
}

impl Memcard {
    /// Wraps raw card bytes, zero-padding them up to the enclosing tier.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        Self::with_limits(data, Limits::default())
    }

    pub fn with_limits(mut data: Vec<u8>, limits: Limits) -> Result<Self> {
        let tier = SizeTier::for_len(data.len() as u64)?;
        if data.len() < tier.bytes() {
            debug!(
                "padding {} byte image to {} ({} bytes)",
                data.len(),
                tier,
                tier.bytes()
            );
            data.resize(tier.bytes(), 0);
        }

        Ok(Self {
            data,
            geometry: Geometry::new(tier),
            limits,
            dirty: false,
            path: None,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_limits(path, Limits::default())
    }

    pub fn open_with_limits(path: impl AsRef<Path>, limits: Limits) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mut card = Self::with_limits(data, limits)?;
        card.path = Some(path.to_path_buf());
        info!("opened {} ({})", path.display(), card.geometry.tier());
        Ok(card)
    }

    pub(crate) fn from_parts(data: Vec<u8>, geometry: Geometry, dirty: bool) -> Self {
        Self {
            data,
            geometry,
            limits: Limits::default(),
            dirty,
            path: None,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn tier(&self) -> SizeTier {
        self.geometry.tier()
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Writes the image back to the file it was opened from, if it changed.
    ///
    /// Returns whether anything was written.
    pub fn persist(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }

        let path = self.path.clone().ok_or_else(|| {
            Error::IOError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "card image has no backing file",
            ))
        })?;
        self.persist_to(&path)?;
        Ok(true)
    }

    /// Writes the whole image to `path` and makes it the backing file.
    pub fn persist_to(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.data)?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        info!("wrote {} ({})", path.display(), self.geometry.tier());
        Ok(())
    }

    pub fn stats(&self) -> CardStats {
        CardStats {
            tier: self.tier(),
            total_clusters: self.geometry.cluster_count(),
            free_clusters: self.free_cluster_count(),
            saves: self.dir_entries().count(),
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn bytes(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.data.get(offset..offset.checked_add(len)?)
    }

    /// Mutable view of a byte range. Marks the image dirty when in range.
    pub(crate) fn bytes_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        let end = offset.checked_add(len)?;
        if end > self.data.len() {
            return None;
        }
        self.dirty = true;
        Some(&mut self.data[offset..end])
    }

    pub(crate) fn replace_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_images_are_padded_to_their_tier() {
        let card = Memcard::new(vec![0xAA; 4096]).unwrap();
        assert_eq!(card.as_bytes().len(), SizeTier::Mb8.bytes());
        assert_eq!(&card.as_bytes()[..4096], &[0xAA; 4096][..]);
        assert!(card.as_bytes()[4096..].iter().all(|&b| b == 0));
        assert!(!card.is_dirty());
    }

    #[test]
    fn oversized_images_are_rejected() {
        let err = Memcard::new(vec![0; SizeTier::Mb32.bytes() + 1]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSize(_)));
    }

    #[test]
    fn persist_without_backing_file_fails_only_when_dirty() {
        let mut card = Memcard::new(Vec::new()).unwrap();
        assert!(!card.persist().unwrap());

        card.mark_dirty();
        assert!(matches!(card.persist(), Err(Error::IOError(_))));
        assert!(card.is_dirty());
    }

    #[test]
    fn reads_never_dirty_the_image() {
        let card = Memcard::new(Vec::new()).unwrap();
        let _ = card.bytes(0, 16);
        let _ = card.stats();
        assert!(!card.is_dirty());
    }
}
