//! Reading and writing the cluster chains that hold save data.

use std::collections::HashSet;

use log::debug;

use crate::fat::{FatEntry, FAT_END_OF_CHAIN, FAT_SENTINEL_MIN};
use crate::geometry::CLUSTER_SIZE;
use crate::{Error, Memcard, Result};

/// Iterator over the cluster indices of one chain.
///
/// Stops at an end-of-chain sentinel, at a link into the reserved or free
/// clusters, at the first revisited cluster, or once
/// [`Limits::max_chain_clusters`](crate::Limits::max_chain_clusters) clusters
/// have been produced.
pub struct ChainWalk<'a> {
    card: &'a Memcard,
    next: Option<u16>,
    visited: HashSet<u16>,
    remaining: usize,
}

impl Iterator for ChainWalk<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        let cluster = self.next.take()?;
        if self.remaining == 0 {
            debug!(
                "chain exceeds {} clusters, stopping at {cluster}",
                self.card.limits().max_chain_clusters
            );
            return None;
        }
        if !self.visited.insert(cluster) {
            debug!("cluster chain loops back to {cluster}");
            return None;
        }
        self.remaining -= 1;

        self.next = match self.card.fat_entry(cluster) {
            FatEntry::Next(next) if next >= 2 => Some(next),
            FatEntry::Next(next) => {
                debug!("cluster {cluster} links into reserved cluster {next}");
                None
            }
            FatEntry::Free => {
                debug!("cluster {cluster} is marked free inside a chain");
                None
            }
            FatEntry::EndOfChain(_) => None,
        };
        Some(cluster)
    }
}

impl Memcard {
    pub fn walk_chain(&self, start: u16) -> ChainWalk<'_> {
        let valid = (2..FAT_SENTINEL_MIN).contains(&start);
        ChainWalk {
            card: self,
            next: valid.then_some(start),
            visited: HashSet::new(),
            remaining: self.limits().max_chain_clusters,
        }
    }

    pub(crate) fn chain_clusters(&self, start: u16) -> Vec<u16> {
        self.walk_chain(start).collect()
    }

    /// The data of every cluster in the chain, in order.
    ///
    /// Never fails: a broken chain yields whatever could be read before the
    /// break, and an invalid start yields nothing. A cluster cut off by the end
    /// of the image is zero-padded.
    pub fn read_chain(&self, start: u16) -> Vec<Vec<u8>> {
        let mut clusters = Vec::new();
        for cluster in self.walk_chain(start) {
            let Some(offset) = self.geometry().cluster_offset(cluster) else {
                break;
            };
            let image = self.as_bytes();
            if offset >= image.len() {
                debug!("cluster {cluster} lies past the end of the image");
                break;
            }

            let end = (offset + CLUSTER_SIZE).min(image.len());
            let mut data = image[offset..end].to_vec();
            data.resize(CLUSTER_SIZE, 0);
            clusters.push(data);
        }
        clusters
    }

    /// Copies one buffer into a cluster, padding or truncating it to size.
    pub fn write_cluster(&mut self, cluster: u16, data: &[u8]) -> Result<()> {
        let offset = self
            .geometry()
            .cluster_offset(cluster)
            .ok_or(Error::ClusterOutOfBounds(cluster))?;
        let target = self
            .bytes_mut(offset, CLUSTER_SIZE)
            .ok_or(Error::ClusterOutOfBounds(cluster))?;

        let len = data.len().min(CLUSTER_SIZE);
        target[..len].copy_from_slice(&data[..len]);
        target[len..].fill(0);
        Ok(())
    }

    /// Writes `buffers` as a chain beginning at `start`.
    ///
    /// `allocate` picks the cluster that follows each non-final buffer. See
    /// [`Memcard::write_chain_with`].
    pub fn write_chain<B, A>(&mut self, start: u16, buffers: &[B], allocate: A) -> Result<usize>
    where
        B: AsRef<[u8]>,
        A: FnMut(&Memcard) -> Option<u16>,
    {
        self.write_chain_with(start, buffers, allocate, |_, _| true)
    }

    /// Writes `buffers` as a chain beginning at `start`, reporting each cluster.
    ///
    /// Each cluster is terminated with `0xFFFF` as soon as it is written, so
    /// the allocator never sees it as free and the chain stays terminated if
    /// the write stops early. `on_written(done, total)` runs after every
    /// cluster; returning `false` stops with [`Error::Cancelled`].
    pub fn write_chain_with<B, A, F>(
        &mut self,
        start: u16,
        buffers: &[B],
        mut allocate: A,
        mut on_written: F,
    ) -> Result<usize>
    where
        B: AsRef<[u8]>,
        A: FnMut(&Memcard) -> Option<u16>,
        F: FnMut(usize, usize) -> bool,
    {
        let total = buffers.len();
        let mut current = start;

        for (index, buffer) in buffers.iter().enumerate() {
            self.write_cluster(current, buffer.as_ref())?;
            self.write_fat_entry(current, FAT_END_OF_CHAIN);

            if !on_written(index + 1, total) {
                return Err(Error::Cancelled);
            }

            if index + 1 < total {
                let next = allocate(self).ok_or(Error::OutOfSpace {
                    written: index + 1,
                    total,
                })?;
                if next < 2 || next == current {
                    return Err(Error::ClusterOutOfBounds(next));
                }
                self.write_fat_entry(current, next);
                current = next;
            }
        }

        Ok(total)
    }
}
