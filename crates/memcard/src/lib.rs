//! Engine for PS2 memory-card images.
//!
//! A [`Memcard`] owns the raw bytes of an 8, 16 or 32 MiB card and exposes the
//! layers that sit on top of them: the [`geometry`] of the image, the FAT
//! ([`fat`]), the directory table ([`dir_entry`]), cluster chains ([`chain`])
//! and the save-level operations built from those ([`save`], [`transfer`]).
//! Nothing here touches the filesystem except [`Memcard::open`],
//! [`Memcard::create`] and the `persist`/`export` calls.

pub mod card;
pub mod chain;
pub mod dir_entry;
mod error;
pub mod fat;
pub mod geometry;
mod lifecycle;
pub mod limits;
pub mod save;
pub mod title;
pub mod transfer;

pub use card::{CardStats, Memcard};
pub use dir_entry::{DirEntry, EntryStatus};
pub use error::{Error, Result};
pub use fat::FatEntry;
pub use geometry::{Geometry, SizeTier};
pub use lifecycle::CARD_MAGIC;
pub use limits::{load_limits, Limits};
pub use save::{ExportFormat, Inspection, Save};
pub use title::{IconSysTitle, NoTitle, TitleDecoder};
pub use transfer::{move_save, transfer};
