//! Per-collection metadata override cache.
//!
//! Mods override small pieces of game metadata: which model a race uses for a
//! piece of gear, whether a hat hides the ears, the variant table of a weapon.
//! This crate tracks, for every such location, which mod currently supplies the
//! effective value and synthesizes the binary game files that result from all
//! applied overrides.
//!
//! - [`MetaTable`] is the generic single-category table. The six file-backed
//!   categories ([`Eqdp`], [`Eqp`], [`Est`], [`Gmp`], [`Rsp`], [`Imc`]) are
//!   type-distinct instances of it.
//! - [`GlobalEqpCache`] holds rule-based overrides evaluated at read time.
//! - [`MetaCache`] aggregates all seven and routes [`MetaIdentifier`]s.
//! - [`ModCollection`] replays mods in priority order into its cache.
//!
//! # Example
//!
//! ```no_run
//! use ltk_meta_cache::{
//!     FsDefaultFiles, MetaCacheConfig, ModCollection,
//! };
//! use camino::Utf8Path;
//! use std::sync::Arc;
//!
//! # fn main() -> ltk_meta_cache::Result<()> {
//! let provider = Arc::new(FsDefaultFiles::new("/games/extracted".into()));
//! let mut collection =
//!     ModCollection::from_manifest(Utf8Path::new("collection.json"), provider)?;
//!
//! let summary = collection.recompute(&MetaCacheConfig::default())?;
//! println!(
//!     "{} overrides applied, {} conflicts",
//!     summary.applied,
//!     summary.conflicts.len()
//! );
//!
//! for (identifier, source) in collection.cache().identifier_sources() {
//!     println!("{identifier} <- {source}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod categories;
pub mod collection;
pub mod config;
pub mod error;
pub mod files;
pub mod global_eqp;
pub mod manipulation;
pub mod mods;
pub mod table;
pub mod types;
pub mod utils;

// Re-export main types
pub use cache::{Conflict, MetaCache, RecomputeSummary};
pub use categories::{
    Eqdp, EqdpEntry, EqdpIdentifier, Eqp, EqpEntry, EqpIdentifier, Est, EstEntry, EstIdentifier,
    Gmp, GmpEntry, GmpIdentifier, Imc, ImcEntry, ImcIdentifier, Rsp, RspEntry, RspIdentifier,
};
pub use collection::{CollectionManifest, CollectionMod, ManifestMod, ModCollection};
pub use config::MetaCacheConfig;
pub use error::{Error, Result};
pub use files::{
    DefaultFileProvider, FsDefaultFiles, ImcPath, InMemoryDefaultFiles, MetaFile, MetaIndex,
};
pub use global_eqp::{CharacterArmor, GlobalEqpCache, GlobalEqpManipulation, GlobalEqpType};
pub use manipulation::{MetaEntry, MetaIdentifier, MetaManipulation};
pub use mods::{ModDefinition, ModGroup, ModId, ModOption, ModPriority, Setting};
pub use table::{FileSubstitute, MetaCategory, MetaReverter, MetaTable};
pub use types::{
    EquipSlot, EstType, GenderRace, ObjectType, PrimaryId, RspAttribute, SecondaryId, SubRace,
    Variant,
};
