//! Generic single-category override table.
//!
//! A [`MetaTable`] tracks which mod owns each identifier of one category and
//! lazily synthesizes one file per file group from those records. The six
//! categories differ only in their [`MetaCategory`] implementation: identifier
//! and entry types, key validation, the group an identifier belongs to, and how
//! an entry is written into the group's binary file.
//!
//! # Synthesis
//!
//! Mutations only mark the affected group dirty. A group is rebuilt on the next
//! [`set_file`](MetaTable::set_file), [`set_files`](MetaTable::set_files) or file
//! access: the default file is copied into a fresh buffer, every owned entry of
//! the group is patched in, and the result replaces the previous file only on
//! success. A group without records has no synthesized file and reads as the
//! default.

use crate::error::Result;
use crate::files::{copy_for_patch, DefaultFileProvider, MetaFile, MetaIndex};
use crate::mods::ModId;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

/// Ownership records of one file group, ordered by identifier.
pub type MetaGroup<C> =
    BTreeMap<<C as MetaCategory>::Identifier, (ModId, <C as MetaCategory>::Entry)>;

/// Describes one per-identifier meta category.
pub trait MetaCategory: 'static {
    /// Short label used in log messages.
    const NAME: &'static str;

    type Identifier: Copy + Ord + Hash + Debug;
    type Entry: Copy + PartialEq + Debug;

    /// Whether the identifier's key fields are within the category's range.
    fn is_valid(identifier: &Self::Identifier) -> bool;

    /// The file group an identifier is synthesized into.
    fn file_index(identifier: &Self::Identifier) -> MetaIndex;

    /// Write every entry of `group` into `data`, a private copy of the group's
    /// default file.
    fn patch(index: MetaIndex, data: &mut Vec<u8>, group: &MetaGroup<Self>) -> Result<()>
    where
        Self: Sized;
}

/// What a temporary file substitution puts in place.
#[derive(Debug, Clone)]
pub enum FileSubstitute {
    /// The unmodified default file from the provider.
    Default,
    /// Caller-supplied content.
    Custom(MetaFile),
}

/// Override table for one category.
pub struct MetaTable<C: MetaCategory> {
    provider: Arc<dyn DefaultFileProvider>,
    groups: BTreeMap<MetaIndex, MetaGroup<C>>,
    files: BTreeMap<MetaIndex, MetaFile>,
    dirty: BTreeSet<MetaIndex>,
    count: usize,
}

impl<C: MetaCategory> MetaTable<C> {
    pub fn new(provider: Arc<dyn DefaultFileProvider>) -> Self {
        Self {
            provider,
            groups: BTreeMap::new(),
            files: BTreeMap::new(),
            dirty: BTreeSet::new(),
            count: 0,
        }
    }

    /// Number of live ownership records.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Look up the owner and entry of an identifier.
    pub fn try_get(&self, identifier: &C::Identifier) -> Option<&(ModId, C::Entry)> {
        self.groups
            .get(&C::file_index(identifier))?
            .get(identifier)
    }

    /// Record `source` as the owner of `identifier` with value `entry`.
    ///
    /// An existing owner is silently superseded; callers apply mods in
    /// ascending priority so the highest-priority mod is applied last. Returns
    /// `false` without touching anything if the identifier is out of range.
    pub fn apply_mod(&mut self, source: ModId, identifier: C::Identifier, entry: C::Entry) -> bool {
        if !C::is_valid(&identifier) {
            tracing::debug!(
                "{}: rejected out-of-range identifier {:?} from mod={}",
                C::NAME,
                identifier,
                source
            );
            return false;
        }

        let index = C::file_index(&identifier);
        tracing::trace!(
            "{}: apply {:?} = {:?} mod={}",
            C::NAME,
            identifier,
            entry,
            source
        );
        let previous = self
            .groups
            .entry(index)
            .or_default()
            .insert(identifier, (source, entry));
        if previous.is_none() {
            self.count += 1;
        }
        self.dirty.insert(index);
        true
    }

    /// Remove the record for `identifier`, returning the mod that owned it.
    pub fn revert_mod(&mut self, identifier: &C::Identifier) -> Option<ModId> {
        let index = C::file_index(identifier);
        let group = self.groups.get_mut(&index)?;
        let (source, _) = group.remove(identifier)?;
        if group.is_empty() {
            self.groups.remove(&index);
        }
        self.count -= 1;
        self.dirty.insert(index);
        tracing::trace!("{}: revert {:?} mod={}", C::NAME, identifier, source);
        Some(source)
    }

    /// Iterate every live record as `(identifier, owner, entry)`.
    pub fn iter(&self) -> impl Iterator<Item = (&C::Identifier, &ModId, &C::Entry)> + '_ {
        self.groups
            .values()
            .flat_map(|group| group.iter().map(|(id, (source, entry))| (id, source, entry)))
    }

    /// File groups that currently hold at least one record.
    pub fn populated_groups(&self) -> impl Iterator<Item = MetaIndex> + '_ {
        self.groups.keys().copied()
    }

    /// Whether `index` has pending changes that are not synthesized yet.
    pub fn is_dirty(&self, index: MetaIndex) -> bool {
        self.dirty.contains(&index)
    }

    /// Synthesize every dirty group.
    ///
    /// Every dirty group is attempted; the first failure is returned and the
    /// failing groups stay dirty with their previous file in place.
    pub fn set_files(&mut self) -> Result<()> {
        let pending = self.dirty.iter().copied().collect::<Vec<_>>();
        let mut first_error = None;
        for index in pending {
            if let Err(e) = self.set_file(index) {
                tracing::warn!("{}: failed to synthesize {}: {}", C::NAME, index, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Synthesize one group if it is dirty; a no-op otherwise.
    pub fn set_file(&mut self, index: MetaIndex) -> Result<()> {
        if !self.dirty.contains(&index) {
            return Ok(());
        }

        match self.synthesize(index)? {
            Some(file) => {
                tracing::debug!(
                    "{}: synthesized {} records={} bytes={} checksum={:016x}",
                    C::NAME,
                    index,
                    self.groups.get(&index).map_or(0, BTreeMap::len),
                    file.len(),
                    file.checksum()
                );
                self.files.insert(index, file);
            }
            None => {
                tracing::debug!("{}: {} back to default", C::NAME, index);
                self.files.remove(&index);
            }
        }
        self.dirty.remove(&index);
        Ok(())
    }

    fn synthesize(&self, index: MetaIndex) -> Result<Option<MetaFile>> {
        let Some(group) = self.groups.get(&index) else {
            return Ok(None);
        };

        let default = self.provider.default_file(index)?;
        let mut data = copy_for_patch(index, default.as_bytes())?;
        C::patch(index, &mut data, group)?;
        Ok(Some(MetaFile::from(data)))
    }

    /// The synthesized file of a group, rebuilding it first if it is dirty.
    ///
    /// Returns `None` when no record targets the group, meaning the default
    /// file is in effect.
    pub fn file(&mut self, index: MetaIndex) -> Result<Option<MetaFile>> {
        self.set_file(index)?;
        Ok(self.files.get(&index).cloned())
    }

    /// The content the game should load for a group: the synthesized file if
    /// there is one, otherwise the default.
    pub fn resolved_file(&mut self, index: MetaIndex) -> Result<MetaFile> {
        match self.file(index)? {
            Some(file) => Ok(file),
            None => self.provider.default_file(index),
        }
    }

    /// Baseline content of a group, straight from the provider.
    pub fn default_file(&self, index: MetaIndex) -> Result<MetaFile> {
        self.provider.default_file(index)
    }

    /// Temporarily replace a group's file.
    ///
    /// Pending changes for the group are synthesized first, then the current
    /// file (or its absence) is captured and `substitute` is put in its place.
    /// The returned guard restores the captured file exactly once, when it is
    /// dropped or [`restore`](MetaReverter::restore)d, on every exit path.
    pub fn temporarily_set_file(
        &mut self,
        index: MetaIndex,
        substitute: FileSubstitute,
    ) -> Result<MetaReverter<'_, C>> {
        self.set_file(index)?;
        let previous = self.files.get(&index).cloned();
        let mut reverter = MetaReverter {
            table: self,
            index,
            previous,
            restored: false,
        };

        // The guard exists before the fallible lookup so an error restores.
        let replacement = match substitute {
            FileSubstitute::Default => reverter.table.provider.default_file(index)?,
            FileSubstitute::Custom(file) => file,
        };
        reverter.table.files.insert(index, replacement);
        tracing::trace!("{}: temporarily replaced {}", C::NAME, index);
        Ok(reverter)
    }

    /// Drop every record and every synthesized file.
    pub fn reset(&mut self) {
        self.groups.clear();
        self.files.clear();
        self.dirty.clear();
        self.count = 0;
    }

    /// Release synthesized buffers and records. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.count == 0 && self.files.is_empty() {
            return;
        }
        tracing::trace!(
            "{}: disposing {} records and {} files",
            C::NAME,
            self.count,
            self.files.len()
        );
        self.reset();
    }
}

/// Scoped guard returned by [`MetaTable::temporarily_set_file`].
///
/// While alive it holds the table mutably; read access goes through `Deref`.
/// Restoring puts back the exact file reference that was active before the
/// substitution. Restoring twice is a no-op.
pub struct MetaReverter<'a, C: MetaCategory> {
    table: &'a mut MetaTable<C>,
    index: MetaIndex,
    previous: Option<MetaFile>,
    restored: bool,
}

impl<C: MetaCategory> MetaReverter<'_, C> {
    pub fn index(&self) -> MetaIndex {
        self.index
    }

    /// The substituted file currently in effect for the guarded group.
    pub fn file(&self) -> Option<&MetaFile> {
        if self.restored {
            return None;
        }
        self.table.files.get(&self.index)
    }

    /// Put the captured file back. Later calls do nothing.
    pub fn restore(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        match self.previous.take() {
            Some(file) => {
                self.table.files.insert(self.index, file);
            }
            None => {
                self.table.files.remove(&self.index);
            }
        }
        tracing::trace!("{}: restored {}", C::NAME, self.index);
    }
}

impl<C: MetaCategory> Deref for MetaReverter<'_, C> {
    type Target = MetaTable<C>;

    fn deref(&self) -> &Self::Target {
        self.table
    }
}

impl<C: MetaCategory> Drop for MetaReverter<'_, C> {
    fn drop(&mut self) {
        self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::gmp::{Gmp, GmpEntry, GmpIdentifier};
    use crate::error::Error;
    use crate::files::InMemoryDefaultFiles;
    use crate::types::PrimaryId;

    fn gmp_table() -> MetaTable<Gmp> {
        let provider = InMemoryDefaultFiles::new().with_file(MetaIndex::Gmp, vec![0u8; 8 * 4]);
        MetaTable::new(Arc::new(provider))
    }

    fn visor(rotation: u16) -> GmpEntry {
        GmpEntry {
            enabled: true,
            animated: true,
            rotation_a: rotation,
            ..GmpEntry::default()
        }
    }

    #[test]
    fn test_apply_and_get() {
        let mut table = gmp_table();
        let id = GmpIdentifier::new(PrimaryId(2));
        assert!(table.apply_mod(ModId::new("Foo"), id, visor(10)));

        let (source, entry) = table.try_get(&id).unwrap();
        assert_eq!(source.as_str(), "Foo");
        assert_eq!(*entry, visor(10));
        assert_eq!(table.len(), 1);
        assert!(table.is_dirty(MetaIndex::Gmp));
    }

    #[test]
    fn test_last_writer_wins() {
        let mut table = gmp_table();
        let id = GmpIdentifier::new(PrimaryId(1));
        table.apply_mod(ModId::new("Foo"), id, visor(1));
        table.apply_mod(ModId::new("Bar"), id, visor(2));

        let (source, entry) = table.try_get(&id).unwrap();
        assert_eq!(source.as_str(), "Bar");
        assert_eq!(*entry, visor(2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_invalid_identifier_is_noop() {
        let mut table = gmp_table();
        let id = GmpIdentifier::new(PrimaryId(10_000));
        assert!(!table.apply_mod(ModId::new("Foo"), id, visor(1)));
        assert!(table.is_empty());
        assert!(!table.is_dirty(MetaIndex::Gmp));
    }

    #[test]
    fn test_revert_returns_owner() {
        let mut table = gmp_table();
        let id = GmpIdentifier::new(PrimaryId(3));
        assert_eq!(table.revert_mod(&id), None);

        table.apply_mod(ModId::new("Foo"), id, visor(1));
        assert_eq!(table.revert_mod(&id), Some(ModId::new("Foo")));
        assert!(table.try_get(&id).is_none());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_revert_restores_default_file() {
        let mut table = gmp_table();
        let id = GmpIdentifier::new(PrimaryId(3));
        table.apply_mod(ModId::new("Foo"), id, visor(1));
        table.set_files().unwrap();
        assert!(table.file(MetaIndex::Gmp).unwrap().is_some());

        table.revert_mod(&id);
        assert!(table.file(MetaIndex::Gmp).unwrap().is_none());
        let resolved = table.resolved_file(MetaIndex::Gmp).unwrap();
        assert_eq!(resolved.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn test_file_is_never_stale() {
        let mut table = gmp_table();
        let id = GmpIdentifier::new(PrimaryId(0));
        table.apply_mod(ModId::new("Foo"), id, visor(1));
        let first = table.file(MetaIndex::Gmp).unwrap().unwrap();

        table.apply_mod(ModId::new("Bar"), id, visor(2));
        let second = table.file(MetaIndex::Gmp).unwrap().unwrap();
        assert_ne!(first.as_bytes(), second.as_bytes());
        assert_eq!(
            crate::files::read_u64_row(second.as_bytes(), 0),
            Some(visor(2).to_bits())
        );
    }

    #[test]
    fn test_set_files_idempotent() {
        let mut table = gmp_table();
        table.apply_mod(ModId::new("Foo"), GmpIdentifier::new(PrimaryId(1)), visor(5));
        table.set_files().unwrap();
        let first = table.file(MetaIndex::Gmp).unwrap().unwrap();
        table.set_files().unwrap();
        let second = table.file(MetaIndex::Gmp).unwrap().unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_synthesis_does_not_touch_default() {
        let default = MetaFile::from(vec![0u8; 16]);
        let provider = InMemoryDefaultFiles::new().with_file(MetaIndex::Gmp, default.clone());
        let mut table = MetaTable::<Gmp>::new(Arc::new(provider));
        table.apply_mod(ModId::new("Foo"), GmpIdentifier::new(PrimaryId(0)), visor(9));
        let file = table.file(MetaIndex::Gmp).unwrap().unwrap();

        assert!(!file.ptr_eq(&default));
        assert_eq!(default.as_bytes(), &[0u8; 16]);
    }

    #[test]
    fn test_missing_default_keeps_group_dirty() {
        let mut table = MetaTable::<Gmp>::new(Arc::new(InMemoryDefaultFiles::new()));
        table.apply_mod(ModId::new("Foo"), GmpIdentifier::new(PrimaryId(0)), visor(1));

        let result = table.set_files();
        assert!(matches!(result, Err(Error::MissingDefaultFile(MetaIndex::Gmp))));
        assert!(table.is_dirty(MetaIndex::Gmp));
    }

    #[test]
    fn test_temporary_default_restores_exact_file() {
        let mut table = gmp_table();
        table.apply_mod(ModId::new("Foo"), GmpIdentifier::new(PrimaryId(1)), visor(5));
        let before = table.file(MetaIndex::Gmp).unwrap().unwrap();

        {
            let reverter = table
                .temporarily_set_file(MetaIndex::Gmp, FileSubstitute::Default)
                .unwrap();
            assert_eq!(reverter.file().unwrap().as_bytes(), &[0u8; 32]);
            assert_eq!(reverter.len(), 1);
        }

        let after = table.file(MetaIndex::Gmp).unwrap().unwrap();
        assert!(before.ptr_eq(&after));
    }

    #[test]
    fn test_temporary_custom_on_unpopulated_group() {
        let mut table = gmp_table();
        let custom = MetaFile::from(vec![0xFF; 8]);
        {
            let mut reverter = table
                .temporarily_set_file(MetaIndex::Gmp, FileSubstitute::Custom(custom.clone()))
                .unwrap();
            assert!(reverter.file().unwrap().ptr_eq(&custom));
            reverter.restore();
            reverter.restore();
            assert!(reverter.file().is_none());
        }
        assert!(table.file(MetaIndex::Gmp).unwrap().is_none());
    }

    #[test]
    fn test_temporary_substitution_error_restores() {
        let mut table = MetaTable::<Gmp>::new(Arc::new(InMemoryDefaultFiles::new()));
        let result = table.temporarily_set_file(MetaIndex::Gmp, FileSubstitute::Default);
        assert!(result.is_err());
        drop(result);
        assert!(table.file(MetaIndex::Gmp).unwrap().is_none());
    }

    #[test]
    fn test_reset_and_dispose() {
        let mut table = gmp_table();
        table.apply_mod(ModId::new("Foo"), GmpIdentifier::new(PrimaryId(1)), visor(5));
        table.set_files().unwrap();

        table.reset();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
        assert!(table.file(MetaIndex::Gmp).unwrap().is_none());

        table.apply_mod(ModId::new("Foo"), GmpIdentifier::new(PrimaryId(1)), visor(5));
        table.dispose();
        table.dispose();
        assert!(table.is_empty());
    }
}
