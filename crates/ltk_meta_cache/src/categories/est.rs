//! Extra skeleton tables (EST).
//!
//! Sparse per-type tables mapping `(gender-race, primary id)` to a skeleton id.
//! Layout: `u32` entry count, then `count` sorted keys of
//! `(u16 gender-race code, u16 primary id)`, then `count` `u16` values.

use crate::error::{Error, Result};
use crate::files::MetaIndex;
use crate::table::{MetaCategory, MetaGroup};
use crate::types::{EstType, GenderRace, PrimaryId};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;

/// Skeleton id; `0` means "no extra skeleton" and removes the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EstEntry(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstIdentifier {
    pub primary_id: PrimaryId,
    pub est_type: EstType,
    pub gender_race: GenderRace,
}

impl EstIdentifier {
    pub fn new(primary_id: PrimaryId, est_type: EstType, gender_race: GenderRace) -> Self {
        Self {
            primary_id,
            est_type,
            gender_race,
        }
    }

    fn key(&self) -> (u16, u16) {
        (self.gender_race.code(), self.primary_id.0)
    }
}

/// Marker for the EST category.
pub struct Est;

impl MetaCategory for Est {
    const NAME: &'static str = "EST";

    type Identifier = EstIdentifier;
    type Entry = EstEntry;

    fn is_valid(identifier: &EstIdentifier) -> bool {
        identifier.primary_id.is_valid() && identifier.gender_race.is_valid()
    }

    fn file_index(identifier: &EstIdentifier) -> MetaIndex {
        MetaIndex::Est(identifier.est_type)
    }

    fn patch(index: MetaIndex, data: &mut Vec<u8>, group: &MetaGroup<Self>) -> Result<()> {
        let mut entries = parse(index, data)?;
        for (identifier, (_, entry)) in group {
            if entry.0 == 0 {
                entries.remove(&identifier.key());
            } else {
                entries.insert(identifier.key(), entry.0);
            }
        }

        data.clear();
        let len = 4 + entries.len() * 6;
        data.try_reserve_exact(len)
            .map_err(|_| Error::Allocation { index, bytes: len })?;
        write(data, &entries)
    }
}

fn parse(index: MetaIndex, data: &[u8]) -> Result<BTreeMap<(u16, u16), u16>> {
    let mut reader = Cursor::new(data);
    let count = reader
        .read_u32::<LE>()
        .map_err(|_| Error::malformed(index, "missing entry count"))? as usize;
    let expected = count
        .checked_mul(6)
        .and_then(|n| n.checked_add(4))
        .ok_or_else(|| Error::malformed(index, "entry count overflows"))?;
    if data.len() < expected {
        return Err(Error::malformed(
            index,
            format!("{count} entries need {expected} bytes, file has {}", data.len()),
        ));
    }

    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        let race = reader.read_u16::<LE>()?;
        let id = reader.read_u16::<LE>()?;
        keys.push((race, id));
    }
    let mut entries = BTreeMap::new();
    for key in keys {
        entries.insert(key, reader.read_u16::<LE>()?);
    }
    Ok(entries)
}

fn write(data: &mut Vec<u8>, entries: &BTreeMap<(u16, u16), u16>) -> Result<()> {
    data.write_u32::<LE>(entries.len() as u32)?;
    for (race, id) in entries.keys() {
        data.write_u16::<LE>(*race)?;
        data.write_u16::<LE>(*id)?;
    }
    for value in entries.values() {
        data.write_u16::<LE>(*value)?;
    }
    Ok(())
}

/// Look up the skeleton id of `(gender_race, primary_id)` in an EST file.
///
/// Returns `EstEntry(0)` when the key is absent or the file cannot be parsed.
pub fn est_entry(
    data: &[u8],
    est_type: EstType,
    gender_race: GenderRace,
    primary_id: PrimaryId,
) -> EstEntry {
    parse(MetaIndex::Est(est_type), data)
        .ok()
        .and_then(|entries| entries.get(&(gender_race.code(), primary_id.0)).copied())
        .map_or(EstEntry(0), EstEntry)
}
