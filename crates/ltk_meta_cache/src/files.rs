//! File-group keys, shared file buffers and default-file providers.
//!
//! Every category partitions its identifiers into file groups, each keyed by a
//! [`MetaIndex`]. The unmodified content of a group comes from a
//! [`DefaultFileProvider`] as a [`MetaFile`]: an immutable, reference-counted
//! buffer that the cache treats as loaned. Synthesis always copies into a fresh
//! table-owned buffer before patching; the loaned bytes are never written.
//!
//! The crate ships two providers:
//!
//! - [`InMemoryDefaultFiles`] for embedders that already hold the baseline files.
//! - [`FsDefaultFiles`] for reading extracted game files from a directory tree
//!   laid out by game path.

use crate::error::{Error, Result};
use crate::types::{EstType, GenderRace, ObjectType, PrimaryId, SecondaryId};
use byteorder::{ByteOrder, LE};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use xxhash_rust::xxh3::xxh3_64;

/// Key of one synthesized file group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetaIndex {
    /// Equipment visibility parameters.
    Eqp,
    /// Gimmick (visor) parameters.
    Gmp,
    /// Racial scaling parameters.
    HumanCmp,
    /// Equipment or accessory deformer parameters of one gender-race.
    Eqdp {
        gender_race: GenderRace,
        accessory: bool,
    },
    /// Extra skeleton table of one type.
    Est(EstType),
    /// Variant table of one model.
    Imc(ImcPath),
}

impl MetaIndex {
    /// Path of the game file this group replaces.
    pub fn game_path(&self) -> String {
        match self {
            MetaIndex::Eqp => "chara/xls/equipmentparameter/equipmentparameter.eqp".to_string(),
            MetaIndex::Gmp => "chara/xls/equipmentparameter/gimmickparameter.gmp".to_string(),
            MetaIndex::HumanCmp => "chara/xls/charamake/human.cmp".to_string(),
            MetaIndex::Eqdp {
                gender_race,
                accessory,
            } => {
                let kind = if *accessory {
                    "accessorydeformerparameter"
                } else {
                    "equipmentdeformerparameter"
                };
                format!("chara/xls/charadb/{kind}/{gender_race}.eqdp")
            }
            MetaIndex::Est(est_type) => format!("chara/xls/charadb/{}", est_type.file_name()),
            MetaIndex::Imc(path) => path.game_path(),
        }
    }
}

impl fmt::Display for MetaIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.game_path())
    }
}

/// Identifies one IMC file: the object kind and the ids that make up its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImcPath {
    pub object_type: ObjectType,
    pub primary_id: PrimaryId,
    /// Body id for weapons, monsters and demihumans; `0` for equipment and accessories.
    pub secondary_id: SecondaryId,
}

impl ImcPath {
    pub fn game_path(&self) -> String {
        let p = self.primary_id.0;
        let s = self.secondary_id.0;
        match self.object_type {
            ObjectType::Equipment => format!("chara/equipment/e{p:04}/e{p:04}.imc"),
            ObjectType::Accessory => format!("chara/accessory/a{p:04}/a{p:04}.imc"),
            ObjectType::Weapon => format!("chara/weapon/w{p:04}/obj/body/b{s:04}/b{s:04}.imc"),
            ObjectType::Monster => format!("chara/monster/m{p:04}/obj/body/b{s:04}/b{s:04}.imc"),
            ObjectType::DemiHuman => {
                format!("chara/demihuman/d{p:04}/obj/equipment/e{s:04}/e{s:04}.imc")
            }
        }
    }

    /// Parse a game path produced by [`game_path`](Self::game_path).
    ///
    /// Matching is case-insensitive; returns `None` for anything that is not an
    /// IMC path of a known object kind.
    pub fn from_game_path(path: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase().replace('\\', "/");
        let parts = lower.split('/').collect::<Vec<_>>();
        if parts.first() != Some(&"chara") || !lower.ends_with(".imc") {
            return None;
        }

        let id = |segment: &str, prefix: char| -> Option<u16> {
            let digits = segment.strip_prefix(prefix)?;
            if digits.len() != 4 {
                return None;
            }
            digits.parse().ok()
        };

        let (object_type, primary, secondary) = match parts.as_slice() {
            ["chara", "equipment", dir, _file] => (ObjectType::Equipment, id(*dir, 'e')?, 0),
            ["chara", "accessory", dir, _file] => (ObjectType::Accessory, id(*dir, 'a')?, 0),
            ["chara", "weapon", dir, "obj", "body", body, _file] => {
                (ObjectType::Weapon, id(*dir, 'w')?, id(*body, 'b')?)
            }
            ["chara", "monster", dir, "obj", "body", body, _file] => {
                (ObjectType::Monster, id(*dir, 'm')?, id(*body, 'b')?)
            }
            ["chara", "demihuman", dir, "obj", "equipment", equip, _file] => {
                (ObjectType::DemiHuman, id(*dir, 'd')?, id(*equip, 'e')?)
            }
            _ => return None,
        };

        let result = Self {
            object_type,
            primary_id: PrimaryId(primary),
            secondary_id: SecondaryId(secondary),
        };
        (result.game_path() == lower).then_some(result)
    }
}

/// Immutable, shared content of a meta file.
///
/// Cloning shares the buffer. [`ptr_eq`](Self::ptr_eq) compares buffer identity,
/// which is what a reverter restores.
#[derive(Clone, PartialEq, Eq)]
pub struct MetaFile {
    data: Arc<[u8]>,
}

impl MetaFile {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether both handles point at the same buffer.
    pub fn ptr_eq(&self, other: &MetaFile) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// xxHash3 of the content, used for logging and fingerprints.
    pub fn checksum(&self) -> u64 {
        xxh3_64(&self.data)
    }
}

impl AsRef<[u8]> for MetaFile {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for MetaFile {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for MetaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaFile")
            .field("len", &self.data.len())
            .field("checksum", &format_args!("{:016x}", self.checksum()))
            .finish()
    }
}

/// Supplies the unmodified baseline content of every file group.
///
/// Returned files are loaned: the cache never mutates them and copies before
/// patching. Implementations must be [`Send`] and [`Sync`] because one provider
/// is shared by every table of every collection.
pub trait DefaultFileProvider: Send + Sync {
    /// Return the baseline content for `index`.
    ///
    /// Fails with [`Error::MissingDefaultFile`] when the group has no baseline.
    fn default_file(&self, index: MetaIndex) -> Result<MetaFile>;
}

/// Provider backed by an in-memory map.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDefaultFiles {
    files: HashMap<MetaIndex, MetaFile>,
}

impl InMemoryDefaultFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: MetaIndex, file: impl Into<MetaFile>) {
        self.files.insert(index, file.into());
    }

    pub fn with_file(mut self, index: MetaIndex, file: impl Into<MetaFile>) -> Self {
        self.insert(index, file);
        self
    }
}

impl DefaultFileProvider for InMemoryDefaultFiles {
    fn default_file(&self, index: MetaIndex) -> Result<MetaFile> {
        self.files
            .get(&index)
            .cloned()
            .ok_or(Error::MissingDefaultFile(index))
    }
}

/// Filesystem-backed provider.
///
/// Reads baseline files from a directory that mirrors game paths:
///
/// ```text
/// game_data_dir/
///   chara/
///     xls/
///       equipmentparameter/
///         equipmentparameter.eqp
///         gimmickparameter.gmp
///       charadb/
///         equipmentdeformerparameter/c0101.eqdp
///         faceskeletontemplate.est
///     equipment/
///       e0012/e0012.imc
/// ```
///
/// Each file is read once and then served from memory, so repeated syntheses
/// share the same loaned buffer.
pub struct FsDefaultFiles {
    root: Utf8PathBuf,
    loaded: Mutex<HashMap<MetaIndex, MetaFile>>,
}

impl FsDefaultFiles {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self {
            root,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl DefaultFileProvider for FsDefaultFiles {
    fn default_file(&self, index: MetaIndex) -> Result<MetaFile> {
        let mut loaded = self
            .loaded
            .lock()
            .map_err(|_| Error::Other("default file cache poisoned".to_string()))?;
        if let Some(file) = loaded.get(&index) {
            return Ok(file.clone());
        }

        let path = self.root.join(index.game_path());
        let bytes = match std::fs::read(path.as_std_path()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingDefaultFile(index));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Loaded default meta file {} ({} bytes)", path, bytes.len());
        let file = MetaFile::from(bytes);
        loaded.insert(index, file.clone());
        Ok(file)
    }
}

/// Copy a loaned file into a fresh, owned buffer.
///
/// The copy is reserved up front so an allocation failure surfaces as
/// [`Error::Allocation`] instead of aborting. Later growth goes through
/// [`grow_to`], which reports failures the same way.
pub(crate) fn copy_for_patch(index: MetaIndex, source: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(source.len())
        .map_err(|_| Error::Allocation {
            index,
            bytes: source.len(),
        })?;
    buffer.extend_from_slice(source);
    Ok(buffer)
}

/// Reserve room for `data` to hold `rows` rows of `width` bytes.
///
/// Returns the required length in bytes.
pub(crate) fn grow_to(
    index: MetaIndex,
    data: &mut Vec<u8>,
    rows: usize,
    width: usize,
) -> Result<usize> {
    let len = rows.checked_mul(width).ok_or(Error::Allocation {
        index,
        bytes: usize::MAX,
    })?;
    let additional = len.saturating_sub(data.len());
    data.try_reserve_exact(additional)
        .map_err(|_| Error::Allocation { index, bytes: len })?;
    Ok(len)
}

/// Read row `row` of a dense little-endian `u64` table, if present.
pub(crate) fn read_u64_row(data: &[u8], row: usize) -> Option<u64> {
    let start = row.checked_mul(8)?;
    data.get(start..start + 8).map(LE::read_u64)
}

/// Write row `row` of a dense `u64` table, growing it with `fill` rows as needed.
pub(crate) fn write_u64_row(
    index: MetaIndex,
    data: &mut Vec<u8>,
    row: usize,
    value: u64,
    fill: u64,
) -> Result<()> {
    let len = grow_to(index, data, row.saturating_add(1), 8)?;
    let mut buf = [0u8; 8];
    LE::write_u64(&mut buf, fill);
    while data.len() < len {
        data.extend_from_slice(&buf);
    }
    LE::write_u64(&mut data[row * 8..row * 8 + 8], value);
    Ok(())
}

/// Read row `row` of a dense little-endian `u16` table, if present.
pub(crate) fn read_u16_row(data: &[u8], row: usize) -> Option<u16> {
    let start = row.checked_mul(2)?;
    data.get(start..start + 2).map(LE::read_u16)
}

/// Write row `row` of a dense `u16` table, growing it with zero rows as needed.
pub(crate) fn write_u16_row(
    index: MetaIndex,
    data: &mut Vec<u8>,
    row: usize,
    value: u16,
) -> Result<()> {
    let len = grow_to(index, data, row.saturating_add(1), 2)?;
    if data.len() < len {
        data.resize(len, 0);
    }
    LE::write_u16(&mut data[row * 2..row * 2 + 2], value);
    Ok(())
}
