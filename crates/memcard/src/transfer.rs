//! Copying and moving saves between cards.
//!
//! A transfer is a sequence of fallible steps with no rollback: whatever was
//! written before a failure or cancellation stays on the destination. All
//! writes go through [`install_chain`], so that is the one place to add a
//! snapshot if that ever changes.

use log::{info, warn};

use crate::dir_entry::DirEntry;
use crate::{Error, Memcard, Result, Save};

const READ_DONE: f32 = 0.1;
const SLOT_FOUND: f32 = 0.3;
const ENTRY_WRITTEN: f32 = 0.4;
const CLUSTERS_WRITTEN: f32 = 0.95;

/// Forwards progress to a caller callback that may cancel.
///
/// Fractions handed to the callback never decrease and stay within `0..=1`.
pub(crate) struct Reporter<P> {
    callback: P,
    last: f32,
}

impl<P> Reporter<P>
where
    P: FnMut(f32, &str) -> bool,
{
    pub(crate) fn new(callback: P) -> Self {
        Self {
            callback,
            last: 0.0,
        }
    }

    pub(crate) fn report(&mut self, fraction: f32, message: &str) -> Result<()> {
        self.last = fraction.clamp(self.last, 1.0);
        if (self.callback)(self.last, message) {
            Ok(())
        } else {
            Err(Error::Cancelled)
        }
    }
}

/// Writes a directory entry and its chain to `card`, returning the slot used.
///
/// `template` supplies name, mode, length and timestamp; cluster and index
/// are filled in here.
pub(crate) fn install_chain<B, P>(
    card: &mut Memcard,
    mut template: DirEntry,
    clusters: &[B],
    reporter: &mut Reporter<P>,
) -> Result<usize>
where
    B: AsRef<[u8]>,
    P: FnMut(f32, &str) -> bool,
{
    let start = card.find_free_cluster().ok_or(Error::DestinationFull)?;
    let slot = card.allocate_slot().ok_or(Error::NoFreeSlot)?;
    reporter.report(SLOT_FOUND, "Found free space on destination card")?;

    template.cluster = start;
    template.dir_index = slot as u16;
    card.write_dir_entry(slot, &template);
    reporter.report(ENTRY_WRITTEN, "Wrote directory entry")?;

    let result = card.write_chain_with(
        start,
        clusters,
        |card| card.find_free_cluster(),
        |done, total| {
            let share = done as f32 / total as f32;
            let fraction = ENTRY_WRITTEN + (CLUSTERS_WRITTEN - ENTRY_WRITTEN) * share;
            let message = format!("Copying cluster {done}/{total}");
            reporter.report(fraction, &message).is_ok()
        },
    );
    if let Err(err) = result {
        warn!("writing {} stopped: {err}", template.name);
        return Err(err);
    }

    Ok(slot)
}

/// Copies `save` from `source` onto `destination`.
///
/// `progress(fraction, status)` is called after reading the source, after
/// reserving space, after writing the directory entry and after every
/// cluster; returning `false` stops the copy with [`Error::Cancelled`].
pub fn transfer<P>(
    source: &Memcard,
    save: &Save,
    destination: &mut Memcard,
    progress: P,
) -> Result<()>
where
    P: FnMut(f32, &str) -> bool,
{
    let mut reporter = Reporter::new(progress);

    let slot = source
        .find_by_name(&save.directory_name)
        .ok_or_else(|| Error::NotFound(save.directory_name.clone()))?;
    let entry = source
        .read_dir_entry(slot)
        .ok_or_else(|| Error::NotFound(save.directory_name.clone()))?;

    let clusters = source.read_chain(entry.cluster);
    reporter.report(READ_DONE, "Read source save data")?;
    if clusters.is_empty() {
        return Err(Error::EmptyChain(entry.cluster));
    }

    if destination.find_by_name(&entry.name).is_some() {
        return Err(Error::NameExists(entry.name));
    }

    let name = entry.name.clone();
    install_chain(destination, entry, &clusters, &mut reporter)?;
    // Every cluster is already on the card; a late cancel changes nothing.
    let _ = reporter.report(1.0, "Copy complete");
    info!("copied {name} ({} clusters)", clusters.len());
    Ok(())
}

/// Copies `save` to `destination`, then deletes it from `source`.
///
/// If the delete fails the copy is left in place on both cards.
pub fn move_save<P>(
    source: &mut Memcard,
    save: &Save,
    destination: &mut Memcard,
    progress: P,
) -> Result<()>
where
    P: FnMut(f32, &str) -> bool,
{
    transfer(source, save, destination, progress)?;
    source.delete(save)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_never_goes_backwards() {
        let mut seen = Vec::new();
        let mut reporter = Reporter::new(|fraction, _: &str| {
            seen.push(fraction);
            true
        });
        reporter.report(0.5, "a").unwrap();
        reporter.report(0.2, "b").unwrap();
        reporter.report(1.5, "c").unwrap();
        drop(reporter);
        assert_eq!(seen, vec![0.5, 0.5, 1.0]);
    }

    #[test]
    fn reporter_turns_false_into_cancel() {
        let mut reporter = Reporter::new(|_, _: &str| false);
        assert!(matches!(reporter.report(0.1, "x"), Err(Error::Cancelled)));
    }
}
