//! Per-collection aggregate over the seven categories.
//!
//! [`MetaCache`] owns one [`MetaTable`] per file-backed category plus the
//! [`GlobalEqpCache`], and routes identifier-addressed requests to the right
//! one with a single match on [`MetaIdentifier`].
//!
//! The cache is not internally synchronized. Mutation takes `&mut self`, so a
//! collection that shares its cache across threads must put it behind a lock
//! that keeps recomputes exclusive from readers.

use crate::categories::eqdp::{self, Eqdp, EqdpEntry};
use crate::categories::eqp::{Eqp, EqpEntry};
use crate::categories::est::{self, Est, EstEntry};
use crate::categories::gmp::Gmp;
use crate::categories::imc::Imc;
use crate::categories::rsp::Rsp;
use crate::error::{Error, Result};
use crate::files::{DefaultFileProvider, ImcPath, MetaFile, MetaIndex};
use crate::global_eqp::{CharacterArmor, GlobalEqpCache};
use crate::manipulation::{MetaEntry, MetaIdentifier, MetaManipulation};
use crate::mods::ModId;
use crate::table::{FileSubstitute, MetaReverter, MetaTable};
use crate::types::{EstType, GenderRace, PrimaryId};
use crate::utils::Fingerprint;
use std::sync::Arc;

/// An override that replaced another mod's entry during a recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub identifier: MetaIdentifier,
    /// The mod whose entry was superseded.
    pub superseded: ModId,
    /// The mod that now owns the identifier.
    pub winner: ModId,
}

/// Outcome of replaying a manipulation stream into a cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecomputeSummary {
    pub applied: usize,
    pub rejected: usize,
    pub conflicts: Vec<Conflict>,
}

pub struct MetaCache {
    provider: Arc<dyn DefaultFileProvider>,
    eqp: MetaTable<Eqp>,
    eqdp: MetaTable<Eqdp>,
    est: MetaTable<Est>,
    gmp: MetaTable<Gmp>,
    rsp: MetaTable<Rsp>,
    imc: MetaTable<Imc>,
    global_eqp: GlobalEqpCache,
}

impl MetaCache {
    pub fn new(provider: Arc<dyn DefaultFileProvider>) -> Self {
        Self {
            eqp: MetaTable::new(provider.clone()),
            eqdp: MetaTable::new(provider.clone()),
            est: MetaTable::new(provider.clone()),
            gmp: MetaTable::new(provider.clone()),
            rsp: MetaTable::new(provider.clone()),
            imc: MetaTable::new(provider.clone()),
            global_eqp: GlobalEqpCache::new(),
            provider,
        }
    }

    pub fn eqp(&self) -> &MetaTable<Eqp> {
        &self.eqp
    }

    pub fn eqdp(&self) -> &MetaTable<Eqdp> {
        &self.eqdp
    }

    pub fn est(&self) -> &MetaTable<Est> {
        &self.est
    }

    pub fn gmp(&self) -> &MetaTable<Gmp> {
        &self.gmp
    }

    pub fn rsp(&self) -> &MetaTable<Rsp> {
        &self.rsp
    }

    pub fn imc(&self) -> &MetaTable<Imc> {
        &self.imc
    }

    pub fn global_eqp(&self) -> &GlobalEqpCache {
        &self.global_eqp
    }

    /// Live ownership records across all seven categories.
    pub fn count(&self) -> usize {
        self.eqp.len()
            + self.eqdp.len()
            + self.est.len()
            + self.gmp.len()
            + self.rsp.len()
            + self.imc.len()
            + self.global_eqp.len()
    }

    /// Every live record as `(identifier, owner)`.
    ///
    /// The iterator borrows the cache, so no mutation can interleave with it.
    pub fn identifier_sources(&self) -> impl Iterator<Item = (MetaIdentifier, &ModId)> + '_ {
        let eqp = self.eqp.iter().map(|(id, source, _)| (MetaIdentifier::Eqp(*id), source));
        let eqdp = self.eqdp.iter().map(|(id, source, _)| (MetaIdentifier::Eqdp(*id), source));
        let est = self.est.iter().map(|(id, source, _)| (MetaIdentifier::Est(*id), source));
        let gmp = self.gmp.iter().map(|(id, source, _)| (MetaIdentifier::Gmp(*id), source));
        let rsp = self.rsp.iter().map(|(id, source, _)| (MetaIdentifier::Rsp(*id), source));
        let imc = self.imc.iter().map(|(id, source, _)| (MetaIdentifier::Imc(*id), source));
        let global = self
            .global_eqp
            .iter()
            .map(|(rule, source)| (MetaIdentifier::GlobalEqp(*rule), source));

        eqp.chain(eqdp)
            .chain(est)
            .chain(gmp)
            .chain(rsp)
            .chain(imc)
            .chain(global)
    }

    /// Owner and current entry of an identifier.
    pub fn try_get(&self, identifier: &MetaIdentifier) -> Option<(&ModId, MetaEntry)> {
        match identifier {
            MetaIdentifier::Eqdp(id) => {
                self.eqdp.try_get(id).map(|(m, e)| (m, MetaEntry::Eqdp(*e)))
            }
            MetaIdentifier::Eqp(id) => self.eqp.try_get(id).map(|(m, e)| (m, MetaEntry::Eqp(*e))),
            MetaIdentifier::Est(id) => self.est.try_get(id).map(|(m, e)| (m, MetaEntry::Est(*e))),
            MetaIdentifier::Gmp(id) => self.gmp.try_get(id).map(|(m, e)| (m, MetaEntry::Gmp(*e))),
            MetaIdentifier::Imc(id) => self.imc.try_get(id).map(|(m, e)| (m, MetaEntry::Imc(*e))),
            MetaIdentifier::Rsp(id) => self.rsp.try_get(id).map(|(m, e)| (m, MetaEntry::Rsp(*e))),
            MetaIdentifier::GlobalEqp(rule) => {
                self.global_eqp.try_get(rule).map(|m| (m, MetaEntry::GlobalEqp))
            }
        }
    }

    /// The mod that currently owns an identifier.
    pub fn try_get_mod(&self, identifier: &MetaIdentifier) -> Option<&ModId> {
        self.try_get(identifier).map(|(source, _)| source)
    }

    /// Remove the record of an identifier, returning its former owner.
    pub fn revert_mod(&mut self, identifier: &MetaIdentifier) -> Option<ModId> {
        match identifier {
            MetaIdentifier::Eqdp(id) => self.eqdp.revert_mod(id),
            MetaIdentifier::Eqp(id) => self.eqp.revert_mod(id),
            MetaIdentifier::Est(id) => self.est.revert_mod(id),
            MetaIdentifier::Gmp(id) => self.gmp.revert_mod(id),
            MetaIdentifier::Imc(id) => self.imc.revert_mod(id),
            MetaIdentifier::Rsp(id) => self.rsp.revert_mod(id),
            MetaIdentifier::GlobalEqp(rule) => self.global_eqp.revert_mod(rule),
        }
    }

    /// Record `source` as the owner of `identifier`.
    ///
    /// Returns `false` without mutating anything if the identifier is out of
    /// range for its category or `entry` belongs to a different category.
    /// Callers apply mods in ascending priority; the last apply wins.
    pub fn apply_mod(
        &mut self,
        source: ModId,
        identifier: MetaIdentifier,
        entry: MetaEntry,
    ) -> bool {
        match (identifier, entry) {
            (MetaIdentifier::Eqdp(id), MetaEntry::Eqdp(e)) => self.eqdp.apply_mod(source, id, e),
            (MetaIdentifier::Eqp(id), MetaEntry::Eqp(e)) => self.eqp.apply_mod(source, id, e),
            (MetaIdentifier::Est(id), MetaEntry::Est(e)) => self.est.apply_mod(source, id, e),
            (MetaIdentifier::Gmp(id), MetaEntry::Gmp(e)) => self.gmp.apply_mod(source, id, e),
            (MetaIdentifier::Imc(id), MetaEntry::Imc(e)) => self.imc.apply_mod(source, id, e),
            (MetaIdentifier::Rsp(id), MetaEntry::Rsp(e)) => self.rsp.apply_mod(source, id, e),
            (MetaIdentifier::GlobalEqp(rule), MetaEntry::GlobalEqp) => {
                self.global_eqp.apply_mod(source, rule)
            }
            (identifier, entry) => {
                tracing::warn!(
                    "Rejected {} entry for {} identifier {} from mod={}",
                    entry.category(),
                    identifier.category(),
                    identifier,
                    source
                );
                false
            }
        }
    }

    pub fn apply_manipulation(&mut self, source: ModId, manipulation: &MetaManipulation) -> bool {
        self.apply_mod(source, manipulation.identifier, manipulation.entry)
    }

    /// Synthesize every dirty group of every file-backed category.
    ///
    /// All categories are attempted; the first error is returned.
    pub fn set_files(&mut self) -> Result<()> {
        let results = [
            self.eqp.set_files(),
            self.eqdp.set_files(),
            self.est.set_files(),
            self.gmp.set_files(),
            self.rsp.set_files(),
            self.imc.set_files(),
        ];
        results.into_iter().collect()
    }

    /// Synthesize one group if it is dirty.
    pub fn set_file(&mut self, index: MetaIndex) -> Result<()> {
        match index {
            MetaIndex::Eqp => self.eqp.set_file(index),
            MetaIndex::Gmp => self.gmp.set_file(index),
            MetaIndex::HumanCmp => self.rsp.set_file(index),
            MetaIndex::Eqdp { .. } => self.eqdp.set_file(index),
            MetaIndex::Est(_) => self.est.set_file(index),
            MetaIndex::Imc(_) => self.imc.set_file(index),
        }
    }

    /// Synthesized content of a group; `None` when no override targets it.
    pub fn file(&mut self, index: MetaIndex) -> Result<Option<MetaFile>> {
        match index {
            MetaIndex::Eqp => self.eqp.file(index),
            MetaIndex::Gmp => self.gmp.file(index),
            MetaIndex::HumanCmp => self.rsp.file(index),
            MetaIndex::Eqdp { .. } => self.eqdp.file(index),
            MetaIndex::Est(_) => self.est.file(index),
            MetaIndex::Imc(_) => self.imc.file(index),
        }
    }

    /// Synthesized content of a group, or its default when not overridden.
    pub fn resolved_file(&mut self, index: MetaIndex) -> Result<MetaFile> {
        match self.file(index)? {
            Some(file) => Ok(file),
            None => self.provider.default_file(index),
        }
    }

    /// Groups with at least one record, across all file-backed categories.
    pub fn populated_groups(&self) -> impl Iterator<Item = MetaIndex> + '_ {
        self.eqp
            .populated_groups()
            .chain(self.eqdp.populated_groups())
            .chain(self.est.populated_groups())
            .chain(self.gmp.populated_groups())
            .chain(self.rsp.populated_groups())
            .chain(self.imc.populated_groups())
    }

    /// Every synthesized file, sorted by group.
    pub fn synthesized_files(&mut self) -> Result<Vec<(MetaIndex, MetaFile)>> {
        self.set_files()?;
        let mut indices = self.populated_groups().collect::<Vec<_>>();
        indices.sort();

        let mut files = Vec::with_capacity(indices.len());
        for index in indices {
            if let Some(file) = self.file(index)? {
                files.push((index, file));
            }
        }
        Ok(files)
    }

    /// Fingerprint over every synthesized group and its content.
    ///
    /// Two caches with the same fingerprint serve byte-identical files.
    pub fn files_fingerprint(&mut self) -> Result<u64> {
        let mut fingerprint = Fingerprint::new();
        for (index, file) in self.synthesized_files()? {
            fingerprint.add(&index.game_path(), file.as_bytes());
        }
        Ok(fingerprint.finish())
    }

    pub fn temporarily_set_eqp_file(
        &mut self,
        substitute: FileSubstitute,
    ) -> Result<MetaReverter<'_, Eqp>> {
        self.eqp.temporarily_set_file(MetaIndex::Eqp, substitute)
    }

    /// Returns `None` for [`GenderRace::Unknown`], which has no EQDP file.
    pub fn temporarily_set_eqdp_file(
        &mut self,
        gender_race: GenderRace,
        accessory: bool,
        substitute: FileSubstitute,
    ) -> Result<Option<MetaReverter<'_, Eqdp>>> {
        if !gender_race.is_valid() {
            return Ok(None);
        }
        let index = MetaIndex::Eqdp {
            gender_race,
            accessory,
        };
        self.eqdp.temporarily_set_file(index, substitute).map(Some)
    }

    pub fn temporarily_set_gmp_file(
        &mut self,
        substitute: FileSubstitute,
    ) -> Result<MetaReverter<'_, Gmp>> {
        self.gmp.temporarily_set_file(MetaIndex::Gmp, substitute)
    }

    pub fn temporarily_set_cmp_file(
        &mut self,
        substitute: FileSubstitute,
    ) -> Result<MetaReverter<'_, Rsp>> {
        self.rsp.temporarily_set_file(MetaIndex::HumanCmp, substitute)
    }

    pub fn temporarily_set_est_file(
        &mut self,
        est_type: EstType,
        substitute: FileSubstitute,
    ) -> Result<MetaReverter<'_, Est>> {
        self.est.temporarily_set_file(MetaIndex::Est(est_type), substitute)
    }

    pub fn temporarily_set_imc_file(
        &mut self,
        path: ImcPath,
        substitute: FileSubstitute,
    ) -> Result<MetaReverter<'_, Imc>> {
        self.imc.temporarily_set_file(MetaIndex::Imc(path), substitute)
    }

    /// Evaluate the registered global rules against `armor`.
    pub fn apply_global_eqp(&self, base: EqpEntry, armor: &CharacterArmor) -> EqpEntry {
        self.global_eqp.apply(base, armor)
    }

    /// The synthesized IMC file for a game path, if any override targets it.
    pub fn get_imc_file(&mut self, game_path: &str) -> Result<Option<MetaFile>> {
        match ImcPath::from_game_path(game_path) {
            Some(path) => self.imc.file(MetaIndex::Imc(path)),
            None => Ok(None),
        }
    }

    /// EQDP row of `primary_id`, falling back to the default file.
    ///
    /// A synthesized file answers directly; ids past its end read as zero.
    /// Without one, the row comes from the default file, and a group with no
    /// default file at all reads as zero.
    pub fn eqdp_entry(
        &mut self,
        gender_race: GenderRace,
        accessory: bool,
        primary_id: PrimaryId,
    ) -> Result<EqdpEntry> {
        let index = MetaIndex::Eqdp {
            gender_race,
            accessory,
        };
        let file = match self.eqdp.file(index)? {
            Some(file) => file,
            None => match self.provider.default_file(index) {
                Ok(file) => file,
                Err(Error::MissingDefaultFile(_)) => return Ok(EqdpEntry::default()),
                Err(e) => return Err(e),
            },
        };
        Ok(eqdp::eqdp_row(file.as_bytes(), primary_id))
    }

    /// Skeleton id for `(est_type, gender_race, primary_id)`; `0` when absent.
    pub fn est_entry(
        &mut self,
        est_type: EstType,
        gender_race: GenderRace,
        primary_id: PrimaryId,
    ) -> Result<EstEntry> {
        let file = match self.est.resolved_file(MetaIndex::Est(est_type)) {
            Ok(file) => file,
            Err(Error::MissingDefaultFile(_)) => return Ok(EstEntry::default()),
            Err(e) => return Err(e),
        };
        Ok(est::est_entry(file.as_bytes(), est_type, gender_race, primary_id))
    }

    /// Replace the whole cache content with an ordered manipulation stream.
    ///
    /// Resets, applies every manipulation in iteration order (lowest priority
    /// first), then synthesizes all groups.
    pub fn recompute<I>(&mut self, manipulations: I) -> Result<RecomputeSummary>
    where
        I: IntoIterator<Item = (ModId, MetaManipulation)>,
    {
        self.reset();
        let mut summary = RecomputeSummary::default();
        for (source, manipulation) in manipulations {
            let previous = self.try_get_mod(&manipulation.identifier).cloned();
            if !self.apply_manipulation(source.clone(), &manipulation) {
                summary.rejected += 1;
                continue;
            }
            summary.applied += 1;
            if let Some(previous) = previous.filter(|previous| *previous != source) {
                summary.conflicts.push(Conflict {
                    identifier: manipulation.identifier,
                    superseded: previous,
                    winner: source,
                });
            }
        }
        self.set_files()?;

        tracing::info!(
            "Meta cache recomputed: {} applied, {} rejected, {} conflicts, {} live records",
            summary.applied,
            summary.rejected,
            summary.conflicts.len(),
            self.count()
        );
        Ok(summary)
    }

    /// Drop every record in every category.
    pub fn reset(&mut self) {
        self.eqp.reset();
        self.eqdp.reset();
        self.est.reset();
        self.gmp.reset();
        self.rsp.reset();
        self.imc.reset();
        self.global_eqp.clear();
    }

    /// Release every synthesized buffer. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.eqp.dispose();
        self.eqdp.dispose();
        self.est.dispose();
        self.gmp.dispose();
        self.rsp.dispose();
        self.imc.dispose();
        self.global_eqp.clear();
    }
}

impl Drop for MetaCache {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{
        EqdpIdentifier, EqpIdentifier, EstIdentifier, GmpEntry, GmpIdentifier, ImcEntry,
        ImcIdentifier, RspEntry, RspIdentifier,
    };
    use crate::files::InMemoryDefaultFiles;
    use crate::global_eqp::{GlobalEqpManipulation, GlobalEqpType};
    use crate::types::{EquipSlot, ObjectType, RspAttribute, SecondaryId, SubRace, Variant};

    const MALE: GenderRace = GenderRace::MidlanderMale;

    fn eqdp_index() -> MetaIndex {
        MetaIndex::Eqdp {
            gender_race: MALE,
            accessory: false,
        }
    }

    fn cache() -> MetaCache {
        let provider = InMemoryDefaultFiles::new()
            .with_file(MetaIndex::Eqp, vec![0u8; 8 * 16])
            .with_file(MetaIndex::Gmp, vec![0u8; 8 * 16])
            .with_file(eqdp_index(), vec![0xAA; 2 * 16]);
        MetaCache::new(Arc::new(provider))
    }

    fn eqdp_id(id: u16) -> MetaIdentifier {
        EqdpIdentifier::new(PrimaryId(id), EquipSlot::Body, MALE).into()
    }

    fn eqdp_entry(material: bool) -> MetaEntry {
        EqdpEntry::new(EquipSlot::Body, material, true).into()
    }

    #[test]
    fn test_routes_by_variant() {
        let mut cache = cache();
        let gmp = MetaIdentifier::from(GmpIdentifier::new(PrimaryId(1)));
        assert!(cache.apply_mod(ModId::new("Foo"), eqdp_id(12), eqdp_entry(true)));
        assert!(cache.apply_mod(ModId::new("Bar"), gmp, GmpEntry::default().into()));

        assert_eq!(cache.eqdp().len(), 1);
        assert_eq!(cache.gmp().len(), 1);
        assert_eq!(cache.count(), 2);
        assert_eq!(cache.try_get_mod(&gmp), Some(&ModId::new("Bar")));
    }

    #[test]
    fn test_rejects_mismatched_entry() {
        let mut cache = cache();
        assert!(!cache.apply_mod(ModId::new("Foo"), eqdp_id(12), EstEntry(4).into()));
        assert!(!cache.apply_mod(ModId::new("Foo"), eqdp_id(12), MetaEntry::GlobalEqp));
        let rule = GlobalEqpManipulation::unconditional(GlobalEqpType::DoNotHideRingR);
        assert!(!cache.apply_mod(ModId::new("Foo"), rule.into(), eqdp_entry(true)));
        assert_eq!(cache.count(), 0);
        assert!(cache.try_get(&eqdp_id(12)).is_none());
    }

    #[test]
    fn test_identifier_sources_cover_all_tables() {
        let mut cache = cache();
        let rule = GlobalEqpManipulation::unconditional(GlobalEqpType::DoNotHideVieraHats);
        cache.apply_mod(ModId::new("A"), eqdp_id(1), eqdp_entry(true));
        cache.apply_mod(
            ModId::new("B"),
            EqpIdentifier::new(PrimaryId(1), EquipSlot::Head).into(),
            EqpEntry::HEAD_HIDE_HAIR.into(),
        );
        cache.apply_mod(ModId::new("C"), rule.into(), MetaEntry::GlobalEqp);

        let sources = cache
            .identifier_sources()
            .map(|(id, source)| (id, source.clone()))
            .collect::<Vec<_>>();
        assert_eq!(sources.len(), cache.count());
        assert_eq!(sources[0].1, ModId::new("B"));
        assert_eq!(sources[1].1, ModId::new("A"));
        assert_eq!(sources[2], (rule.into(), ModId::new("C")));
        // Restartable.
        assert_eq!(cache.identifier_sources().count(), 3);
    }

    #[test]
    fn test_eqdp_entry_falls_back_to_default() {
        let mut cache = cache();
        assert_eq!(
            cache.eqdp_entry(MALE, false, PrimaryId(3)).unwrap(),
            EqdpEntry(0xAAAA)
        );
        assert_eq!(
            cache.eqdp_entry(MALE, false, PrimaryId(500)).unwrap(),
            EqdpEntry(0)
        );
        assert_eq!(
            cache.eqdp_entry(GenderRace::VieraFemale, true, PrimaryId(3)).unwrap(),
            EqdpEntry(0)
        );

        cache.apply_mod(ModId::new("Foo"), eqdp_id(3), eqdp_entry(false));
        let row = cache.eqdp_entry(MALE, false, PrimaryId(3)).unwrap();
        assert_eq!(row.for_slot(EquipSlot::Body), EqdpEntry::new(EquipSlot::Body, false, true));
        assert_eq!(row.for_slot(EquipSlot::Head), EqdpEntry(0b10));
    }

    #[test]
    fn test_temporary_eqdp_file() {
        let mut cache = cache();
        assert!(cache
            .temporarily_set_eqdp_file(GenderRace::Unknown, false, FileSubstitute::Default)
            .unwrap()
            .is_none());

        cache.apply_mod(ModId::new("Foo"), eqdp_id(3), eqdp_entry(false));
        let before = cache.file(eqdp_index()).unwrap().unwrap();
        {
            let reverter = cache
                .temporarily_set_eqdp_file(MALE, false, FileSubstitute::Default)
                .unwrap()
                .unwrap();
            assert_eq!(reverter.file().unwrap().as_bytes(), &[0xAA; 32]);
        }
        let after = cache.file(eqdp_index()).unwrap().unwrap();
        assert!(before.ptr_eq(&after));
    }

    #[test]
    fn test_get_imc_file_ignores_other_paths() {
        let mut cache = cache();
        assert!(cache.get_imc_file("chara/xls/charamake/human.cmp").unwrap().is_none());
        assert!(cache
            .get_imc_file("chara/equipment/e0001/e0001.imc")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_recompute_tracks_conflicts() {
        let mut cache = cache();
        cache.apply_mod(ModId::new("Stale"), eqdp_id(9), eqdp_entry(true));

        let stream = vec![
            (ModId::new("Foo"), MetaManipulation::new(eqdp_id(1), eqdp_entry(true))),
            (ModId::new("Foo"), MetaManipulation::new(eqdp_id(2), eqdp_entry(true))),
            (ModId::new("Bar"), MetaManipulation::new(eqdp_id(1), eqdp_entry(false))),
            (ModId::new("Bar"), MetaManipulation::new(eqdp_id(2), EstEntry(1).into())),
            (ModId::new("Bar"), MetaManipulation::new(eqdp_id(20_000), eqdp_entry(false))),
        ];
        let summary = cache.recompute(stream).unwrap();

        assert_eq!(summary.applied, 3);
        assert_eq!(summary.rejected, 2);
        assert_eq!(
            summary.conflicts,
            vec![Conflict {
                identifier: eqdp_id(1),
                superseded: ModId::new("Foo"),
                winner: ModId::new("Bar"),
            }]
        );
        assert_eq!(cache.count(), 2);
        assert!(cache.try_get_mod(&eqdp_id(9)).is_none());
        assert!(!cache.eqdp().is_dirty(eqdp_index()));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let mut cache = cache();
        let empty = cache.files_fingerprint().unwrap();
        cache.apply_mod(ModId::new("Foo"), eqdp_id(1), eqdp_entry(true));
        let one = cache.files_fingerprint().unwrap();
        assert_ne!(empty, one);
        assert_eq!(one, cache.files_fingerprint().unwrap());

        cache.revert_mod(&eqdp_id(1));
        assert_eq!(cache.files_fingerprint().unwrap(), empty);
    }

    #[test]
    fn test_set_files_reports_missing_default() {
        let mut cache = cache();
        let id = EqdpIdentifier::new(PrimaryId(1), EquipSlot::Body, GenderRace::HrothgarMale);
        cache.apply_mod(ModId::new("Foo"), id.into(), eqdp_entry(true));
        cache.apply_mod(
            ModId::new("Foo"),
            GmpIdentifier::new(PrimaryId(1)).into(),
            GmpEntry::default().into(),
        );

        assert!(matches!(cache.set_files(), Err(Error::MissingDefaultFile(_))));
        // Other categories still synthesized.
        assert!(!cache.gmp().is_dirty(MetaIndex::Gmp));
    }

    #[test]
    fn test_reset_and_dispose_are_repeatable() {
        let mut cache = cache();
        cache.apply_mod(ModId::new("Foo"), eqdp_id(1), eqdp_entry(true));
        cache.set_files().unwrap();
        cache.reset();
        assert_eq!(cache.count(), 0);
        assert!(cache.try_get(&eqdp_id(1)).is_none());

        cache.apply_mod(ModId::new("Foo"), eqdp_id(1), eqdp_entry(true));
        cache.dispose();
        cache.dispose();
        assert_eq!(cache.count(), 0);
    }

    fn imc_path() -> ImcPath {
        ImcPath {
            object_type: ObjectType::Equipment,
            primary_id: PrimaryId(1),
            secondary_id: SecondaryId(0),
        }
    }

    /// One variant, all five equipment parts, every entry zeroed.
    fn default_imc() -> Vec<u8> {
        let mut data = vec![0u8; 4 + 5 * 6];
        data[2] = 0x1F;
        data
    }

    /// Face EST with a single `(c0101, 5) -> 7` entry.
    fn default_est() -> Vec<u8> {
        vec![1, 0, 0, 0, 0x65, 0, 5, 0, 7, 0]
    }

    fn full_cache() -> MetaCache {
        let provider = InMemoryDefaultFiles::new()
            .with_file(MetaIndex::Eqp, vec![0u8; 8 * 16])
            .with_file(MetaIndex::Gmp, vec![0u8; 8 * 16])
            .with_file(MetaIndex::HumanCmp, vec![0u8; 16 * 14 * 4])
            .with_file(MetaIndex::Est(EstType::Face), default_est())
            .with_file(MetaIndex::Imc(imc_path()), default_imc())
            .with_file(eqdp_index(), vec![0xAA; 2 * 16]);
        MetaCache::new(Arc::new(provider))
    }

    fn one_of_each() -> Vec<(MetaIdentifier, MetaEntry)> {
        let imc = ImcIdentifier {
            object_type: ObjectType::Equipment,
            primary_id: PrimaryId(1),
            secondary_id: SecondaryId(0),
            variant: Variant(0),
            slot: EquipSlot::Body,
        };
        let imc_entry = ImcEntry {
            material_id: 2,
            ..ImcEntry::default()
        };
        vec![
            (
                EqpIdentifier::new(PrimaryId(1), EquipSlot::Head).into(),
                EqpEntry::HEAD_HIDE_HAIR.into(),
            ),
            (eqdp_id(1), eqdp_entry(false)),
            (
                EstIdentifier::new(PrimaryId(1), EstType::Face, MALE).into(),
                EstEntry(3).into(),
            ),
            (
                GmpIdentifier::new(PrimaryId(1)).into(),
                GmpEntry {
                    enabled: true,
                    ..GmpEntry::default()
                }
                .into(),
            ),
            (
                RspIdentifier::new(SubRace::Midlander, RspAttribute::MaleMinSize).into(),
                RspEntry(1.5).into(),
            ),
            (imc.into(), imc_entry.into()),
            (
                GlobalEqpManipulation::unconditional(GlobalEqpType::DoNotHideNecklace).into(),
                MetaEntry::GlobalEqp,
            ),
        ]
    }

    #[test]
    fn test_reset_clears_all_seven_categories() {
        let mut cache = full_cache();
        let overrides = one_of_each();
        for (identifier, entry) in &overrides {
            assert!(cache.apply_mod(ModId::new("Foo"), *identifier, *entry));
        }
        assert_eq!(cache.count(), 7);
        assert_eq!(cache.identifier_sources().count(), 7);
        cache.set_files().unwrap();
        assert_eq!(cache.synthesized_files().unwrap().len(), 6);

        cache.reset();
        assert_eq!(cache.count(), 0);
        assert_eq!(cache.identifier_sources().count(), 0);
        for (identifier, _) in &overrides {
            assert!(cache.try_get(identifier).is_none(), "{identifier} survived reset");
        }
        assert!(cache.synthesized_files().unwrap().is_empty());
    }

    #[test]
    fn test_temporary_eqp_file_round_trip() {
        let mut cache = full_cache();
        cache.apply_mod(
            ModId::new("Foo"),
            EqpIdentifier::new(PrimaryId(1), EquipSlot::Head).into(),
            EqpEntry::HEAD_HIDE_HAIR.into(),
        );
        let before = cache.file(MetaIndex::Eqp).unwrap().unwrap();
        assert_ne!(before.as_bytes(), &[0u8; 128][..]);
        {
            let reverter = cache
                .temporarily_set_eqp_file(FileSubstitute::Default)
                .unwrap();
            assert_eq!(reverter.file().unwrap().as_bytes(), &[0u8; 128][..]);
        }
        let after = cache.file(MetaIndex::Eqp).unwrap().unwrap();
        assert!(before.ptr_eq(&after));
    }

    #[test]
    fn test_temporary_cmp_file_round_trip() {
        let mut cache = full_cache();
        cache.apply_mod(
            ModId::new("Foo"),
            RspIdentifier::new(SubRace::Midlander, RspAttribute::MaleMinSize).into(),
            RspEntry(1.5).into(),
        );
        let before = cache.file(MetaIndex::HumanCmp).unwrap().unwrap();
        assert_eq!(&before.as_bytes()[..4], &1.5f32.to_le_bytes());
        {
            let reverter = cache
                .temporarily_set_cmp_file(FileSubstitute::Default)
                .unwrap();
            assert_eq!(reverter.file().unwrap().as_bytes(), &[0u8; 16 * 14 * 4][..]);
        }
        let after = cache.file(MetaIndex::HumanCmp).unwrap().unwrap();
        assert!(before.ptr_eq(&after));
    }

    #[test]
    fn test_temporary_est_file_round_trip() {
        let mut cache = full_cache();
        cache.apply_mod(
            ModId::new("Foo"),
            EstIdentifier::new(PrimaryId(1), EstType::Face, MALE).into(),
            EstEntry(3).into(),
        );
        let index = MetaIndex::Est(EstType::Face);
        let before = cache.file(index).unwrap().unwrap();
        assert_ne!(before.as_bytes(), &default_est()[..]);
        {
            let reverter = cache
                .temporarily_set_est_file(EstType::Face, FileSubstitute::Default)
                .unwrap();
            assert_eq!(reverter.file().unwrap().as_bytes(), &default_est()[..]);
        }
        let after = cache.file(index).unwrap().unwrap();
        assert!(before.ptr_eq(&after));
        assert_eq!(
            cache.est_entry(EstType::Face, MALE, PrimaryId(1)).unwrap(),
            EstEntry(3)
        );
    }

    #[test]
    fn test_temporary_imc_file_round_trip() {
        let mut cache = full_cache();
        let (identifier, entry) = one_of_each().remove(5);
        cache.apply_mod(ModId::new("Foo"), identifier, entry);
        let index = MetaIndex::Imc(imc_path());
        let before = cache.file(index).unwrap().unwrap();
        assert_ne!(before.as_bytes(), &default_imc()[..]);
        {
            let reverter = cache
                .temporarily_set_imc_file(imc_path(), FileSubstitute::Default)
                .unwrap();
            assert_eq!(reverter.index(), index);
            assert_eq!(reverter.file().unwrap().as_bytes(), &default_imc()[..]);
        }
        let after = cache.file(index).unwrap().unwrap();
        assert!(before.ptr_eq(&after));
    }

    #[test]
    fn test_temporary_file_without_overrides_restores_default() {
        let mut cache = full_cache();
        let custom = MetaFile::new(vec![1u8; 8]);
        {
            let reverter = cache
                .temporarily_set_eqp_file(FileSubstitute::Custom(custom.clone()))
                .unwrap();
            assert!(reverter.file().unwrap().ptr_eq(&custom));
        }
        assert!(cache.file(MetaIndex::Eqp).unwrap().is_none());
    }
}
