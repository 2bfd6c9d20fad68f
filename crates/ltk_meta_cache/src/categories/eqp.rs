//! Equipment visibility parameters (EQP).
//!
//! One file, one 64-bit row per primary id. Each of the five equipment slots
//! owns a fixed range of bits in the row, so overrides for different slots of
//! the same item never overlap.

use crate::error::Result;
use crate::files::{read_u64_row, write_u64_row, MetaIndex};
use crate::table::{MetaCategory, MetaGroup};
use crate::types::{EquipSlot, PrimaryId};
use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Visibility flags of one item across all equipment slots.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EqpEntry: u64 {
        const BODY_ENABLED = 1 << 0;
        const BODY_HIDE_WAIST = 1 << 1;
        const BODY_HIDE_SMALL_GLOVES = 1 << 3;
        const BODY_HIDE_MEDIUM_GLOVES = 1 << 4;
        const BODY_HIDE_LARGE_GLOVES = 1 << 5;
        const BODY_HIDE_GORGET = 1 << 6;
        const BODY_SHOW_LEG = 1 << 7;
        const BODY_SHOW_HAND = 1 << 8;
        const BODY_SHOW_HEAD = 1 << 9;
        const BODY_SHOW_NECKLACE = 1 << 10;
        const BODY_SHOW_BRACELET = 1 << 11;
        const BODY_SHOW_TAIL = 1 << 12;
        const BODY_TWO_PIECE = 1 << 13;

        const LEGS_ENABLED = 1 << 16;
        const LEGS_HIDE_KNEE_PADS = 1 << 17;
        const LEGS_HIDE_BOOT_TOPS = 1 << 18;
        const LEGS_SHOW_FOOT = 1 << 20;
        const LEGS_SHOW_TAIL = 1 << 21;

        const HANDS_ENABLED = 1 << 24;
        const HANDS_HIDE_ELBOW = 1 << 25;
        const HANDS_HIDE_FOREARM = 1 << 26;
        const HANDS_SHOW_BRACELET = 1 << 28;
        const HANDS_SHOW_RING_L = 1 << 29;
        const HANDS_SHOW_RING_R = 1 << 30;

        const FEET_ENABLED = 1 << 32;
        const FEET_HIDE_KNEE = 1 << 33;
        const FEET_HIDE_CALF = 1 << 34;
        const FEET_HIDE_ANKLE = 1 << 35;

        const HEAD_ENABLED = 1 << 40;
        const HEAD_HIDE_SCALP = 1 << 41;
        const HEAD_HIDE_HAIR = 1 << 42;
        const HEAD_SHOW_HAIR_OVERRIDE = 1 << 43;
        const HEAD_HIDE_NECK = 1 << 44;
        const HEAD_SHOW_NECKLACE = 1 << 45;
        const HEAD_SHOW_EARRINGS = 1 << 47;
        const HEAD_SHOW_EARRINGS_HUMAN = 1 << 48;
        const HEAD_SHOW_EARRINGS_AU_RA = 1 << 49;
        const HEAD_SHOW_EAR_HUMAN = 1 << 50;
        const HEAD_SHOW_EAR_MIQOTE = 1 << 51;
        const HEAD_SHOW_EAR_AU_RA = 1 << 52;
        const HEAD_SHOW_EAR_VIERA = 1 << 53;
        const HEAD_SHOW_HROTHGAR_HAT = 1 << 54;
        const HEAD_SHOW_VIERA_HAT = 1 << 55;

        const _ = !0;
    }
}

impl EqpEntry {
    /// Row used for ids beyond the end of the default file.
    pub const DEFAULT_ROW: EqpEntry = EqpEntry::from_bits_retain(
        EqpEntry::BODY_ENABLED.bits()
            | EqpEntry::BODY_SHOW_LEG.bits()
            | EqpEntry::BODY_SHOW_HAND.bits()
            | EqpEntry::BODY_SHOW_HEAD.bits()
            | EqpEntry::BODY_SHOW_NECKLACE.bits()
            | EqpEntry::BODY_SHOW_BRACELET.bits()
            | EqpEntry::BODY_SHOW_TAIL.bits()
            | EqpEntry::LEGS_ENABLED.bits()
            | EqpEntry::LEGS_SHOW_FOOT.bits()
            | EqpEntry::HANDS_ENABLED.bits()
            | EqpEntry::HANDS_SHOW_BRACELET.bits()
            | EqpEntry::HANDS_SHOW_RING_L.bits()
            | EqpEntry::HANDS_SHOW_RING_R.bits()
            | EqpEntry::FEET_ENABLED.bits()
            | EqpEntry::HEAD_ENABLED.bits()
            | EqpEntry::HEAD_SHOW_EAR_HUMAN.bits(),
    );

    /// Bits owned by `slot`; zero for non-equipment slots.
    pub const fn slot_mask(slot: EquipSlot) -> u64 {
        match slot {
            EquipSlot::Body => 0x0000_0000_0000_FFFF,
            EquipSlot::Legs => 0x0000_0000_00FF_0000,
            EquipSlot::Hands => 0x0000_0000_FF00_0000,
            EquipSlot::Feet => 0x0000_00FF_0000_0000,
            EquipSlot::Head => 0xFFFF_FF00_0000_0000,
            _ => 0,
        }
    }

    /// Only the bits of this entry that belong to `slot`.
    pub fn for_slot(self, slot: EquipSlot) -> EqpEntry {
        EqpEntry::from_bits_retain(self.bits() & Self::slot_mask(slot))
    }

    /// Replace the bits of `slot` in `self` with those of `value`.
    pub fn with_slot(self, slot: EquipSlot, value: EqpEntry) -> EqpEntry {
        let mask = Self::slot_mask(slot);
        EqpEntry::from_bits_retain((self.bits() & !mask) | (value.bits() & mask))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqpIdentifier {
    pub primary_id: PrimaryId,
    pub slot: EquipSlot,
}

impl EqpIdentifier {
    pub fn new(primary_id: PrimaryId, slot: EquipSlot) -> Self {
        Self { primary_id, slot }
    }
}

/// Marker for the EQP category.
pub struct Eqp;

impl MetaCategory for Eqp {
    const NAME: &'static str = "EQP";

    type Identifier = EqpIdentifier;
    type Entry = EqpEntry;

    fn is_valid(identifier: &EqpIdentifier) -> bool {
        identifier.primary_id.is_valid() && identifier.slot.is_equipment()
    }

    fn file_index(_identifier: &EqpIdentifier) -> MetaIndex {
        MetaIndex::Eqp
    }

    fn patch(index: MetaIndex, data: &mut Vec<u8>, group: &MetaGroup<Self>) -> Result<()> {
        let fill = EqpEntry::DEFAULT_ROW.bits();
        for (identifier, (_, entry)) in group {
            let row = identifier.primary_id.row();
            let current = EqpEntry::from_bits_retain(read_u64_row(data, row).unwrap_or(fill));
            let patched = current.with_slot(identifier.slot, *entry);
            write_u64_row(index, data, row, patched.bits(), fill)?;
        }
        Ok(())
    }
}

/// Read the row of `primary_id` from an EQP file, falling back to the default row.
pub fn eqp_row(data: &[u8], primary_id: PrimaryId) -> EqpEntry {
    read_u64_row(data, primary_id.row())
        .map(EqpEntry::from_bits_retain)
        .unwrap_or(EqpEntry::DEFAULT_ROW)
}
