//! Equipment deformer parameters (EQDP).
//!
//! One file per gender-race and family (equipment or accessory). Each primary
//! id has a 16-bit row; every slot of the family owns two bits of it at
//! `2 * part_index`: the low bit enables a race-specific material, the high
//! bit a race-specific model.

use crate::error::Result;
use crate::files::{read_u16_row, write_u16_row, MetaIndex};
use crate::table::{MetaCategory, MetaGroup};
use crate::types::{EquipSlot, GenderRace, PrimaryId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EqdpEntry(pub u16);

impl EqdpEntry {
    /// Entry with only `slot`'s two bits set from the given flags.
    pub fn new(slot: EquipSlot, material: bool, model: bool) -> Self {
        let bits = (material as u16) | ((model as u16) << 1);
        match slot.part_index() {
            Some(part) => Self(bits << (2 * part)),
            None => Self(0),
        }
    }

    /// Bits owned by `slot`.
    pub fn mask(slot: EquipSlot) -> u16 {
        slot.part_index().map_or(0, |part| 0b11 << (2 * part))
    }

    pub fn material(self, slot: EquipSlot) -> bool {
        slot.part_index()
            .is_some_and(|part| self.0 & (1 << (2 * part)) != 0)
    }

    pub fn model(self, slot: EquipSlot) -> bool {
        slot.part_index()
            .is_some_and(|part| self.0 & (1 << (2 * part + 1)) != 0)
    }

    /// Replace `slot`'s bits in `self` with those of `value`.
    pub fn with_slot(self, slot: EquipSlot, value: EqdpEntry) -> EqdpEntry {
        let mask = Self::mask(slot);
        EqdpEntry((self.0 & !mask) | (value.0 & mask))
    }

    pub fn for_slot(self, slot: EquipSlot) -> EqdpEntry {
        EqdpEntry(self.0 & Self::mask(slot))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqdpIdentifier {
    pub primary_id: PrimaryId,
    pub slot: EquipSlot,
    pub gender_race: GenderRace,
}

impl EqdpIdentifier {
    pub fn new(primary_id: PrimaryId, slot: EquipSlot, gender_race: GenderRace) -> Self {
        Self {
            primary_id,
            slot,
            gender_race,
        }
    }

    pub fn accessory(&self) -> bool {
        self.slot.is_accessory()
    }

    pub fn file_index(&self) -> MetaIndex {
        MetaIndex::Eqdp {
            gender_race: self.gender_race,
            accessory: self.accessory(),
        }
    }
}

/// Marker for the EQDP category.
pub struct Eqdp;

impl MetaCategory for Eqdp {
    const NAME: &'static str = "EQDP";

    type Identifier = EqdpIdentifier;
    type Entry = EqdpEntry;

    fn is_valid(identifier: &EqdpIdentifier) -> bool {
        identifier.primary_id.is_valid()
            && (identifier.slot.is_equipment() || identifier.slot.is_accessory())
            && identifier.gender_race.is_valid()
    }

    fn file_index(identifier: &EqdpIdentifier) -> MetaIndex {
        identifier.file_index()
    }

    fn patch(index: MetaIndex, data: &mut Vec<u8>, group: &MetaGroup<Self>) -> Result<()> {
        for (identifier, (_, entry)) in group {
            let row = identifier.primary_id.row();
            let current = EqdpEntry(read_u16_row(data, row).unwrap_or(0));
            let patched = current.with_slot(identifier.slot, *entry);
            write_u16_row(index, data, row, patched.0)?;
        }
        Ok(())
    }
}

/// Read `slot`'s bits for `primary_id` from an EQDP file.
///
/// Rows past the end of the file read as zero, the value the game assumes for
/// ids it has no row for.
pub fn eqdp_entry(data: &[u8], primary_id: PrimaryId, slot: EquipSlot) -> EqdpEntry {
    eqdp_row(data, primary_id).for_slot(slot)
}

/// The full row of `primary_id`, all five slots.
pub fn eqdp_row(data: &[u8], primary_id: PrimaryId) -> EqdpEntry {
    EqdpEntry(read_u16_row(data, primary_id.row()).unwrap_or(0))
}
