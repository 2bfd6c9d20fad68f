//! Racial scaling parameters (RSP), stored in `human.cmp`.
//!
//! The file holds one block per sub-race, each block a run of little-endian
//! `f32` attributes. Overrides replace single attributes in place.

use crate::error::{Error, Result};
use crate::files::MetaIndex;
use crate::table::{MetaCategory, MetaGroup};
use crate::types::{RspAttribute, SubRace};
use byteorder::{ByteOrder, LE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RspEntry(pub f32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RspIdentifier {
    pub sub_race: SubRace,
    pub attribute: RspAttribute,
}

impl RspIdentifier {
    pub fn new(sub_race: SubRace, attribute: RspAttribute) -> Self {
        Self {
            sub_race,
            attribute,
        }
    }

    /// Byte offset of the attribute in `human.cmp`.
    pub fn offset(&self) -> Option<usize> {
        let block = self.sub_race.index()?;
        Some((block * RspAttribute::COUNT + self.attribute.index()) * 4)
    }
}

/// Marker for the RSP category.
pub struct Rsp;

impl MetaCategory for Rsp {
    const NAME: &'static str = "RSP";

    type Identifier = RspIdentifier;
    type Entry = RspEntry;

    fn is_valid(identifier: &RspIdentifier) -> bool {
        identifier.sub_race.index().is_some()
    }

    fn file_index(_identifier: &RspIdentifier) -> MetaIndex {
        MetaIndex::HumanCmp
    }

    fn patch(index: MetaIndex, data: &mut Vec<u8>, group: &MetaGroup<Self>) -> Result<()> {
        let required = SubRace::COUNT * RspAttribute::COUNT * 4;
        if data.len() < required {
            return Err(Error::malformed(
                index,
                format!("expected at least {required} bytes, got {}", data.len()),
            ));
        }

        for (identifier, (_, entry)) in group {
            let Some(offset) = identifier.offset() else {
                continue;
            };
            LE::write_f32(&mut data[offset..offset + 4], entry.0);
        }
        Ok(())
    }
}

/// Read one attribute from a `human.cmp` file.
pub fn rsp_entry(data: &[u8], identifier: RspIdentifier) -> Option<RspEntry> {
    let offset = identifier.offset()?;
    data.get(offset..offset + 4)
        .map(|bytes| RspEntry(LE::read_f32(bytes)))
}
