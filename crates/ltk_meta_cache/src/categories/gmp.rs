//! Gimmick parameters (GMP): visor behavior of head gear.

use crate::error::Result;
use crate::files::{read_u64_row, write_u64_row, MetaIndex};
use crate::table::{MetaCategory, MetaGroup};
use crate::types::PrimaryId;
use serde::{Deserialize, Serialize};

/// Decoded GMP row.
///
/// Packed as: bit 0 enabled, bit 1 animated, three 10-bit rotations starting
/// at bits 2, 12 and 22, then two 4-bit unknowns at bits 32 and 36.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmpEntry {
    pub enabled: bool,
    pub animated: bool,
    pub rotation_a: u16,
    pub rotation_b: u16,
    pub rotation_c: u16,
    pub unknown_a: u8,
    pub unknown_b: u8,
}

impl GmpEntry {
    const ROTATION_MASK: u64 = 0x3FF;
    const NIBBLE_MASK: u64 = 0xF;

    pub fn to_bits(self) -> u64 {
        (self.enabled as u64)
            | ((self.animated as u64) << 1)
            | ((self.rotation_a as u64 & Self::ROTATION_MASK) << 2)
            | ((self.rotation_b as u64 & Self::ROTATION_MASK) << 12)
            | ((self.rotation_c as u64 & Self::ROTATION_MASK) << 22)
            | ((self.unknown_a as u64 & Self::NIBBLE_MASK) << 32)
            | ((self.unknown_b as u64 & Self::NIBBLE_MASK) << 36)
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            enabled: bits & 1 != 0,
            animated: bits & 2 != 0,
            rotation_a: ((bits >> 2) & Self::ROTATION_MASK) as u16,
            rotation_b: ((bits >> 12) & Self::ROTATION_MASK) as u16,
            rotation_c: ((bits >> 22) & Self::ROTATION_MASK) as u16,
            unknown_a: ((bits >> 32) & Self::NIBBLE_MASK) as u8,
            unknown_b: ((bits >> 36) & Self::NIBBLE_MASK) as u8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmpIdentifier {
    pub primary_id: PrimaryId,
}

impl GmpIdentifier {
    pub fn new(primary_id: PrimaryId) -> Self {
        Self { primary_id }
    }
}

/// Marker for the GMP category.
pub struct Gmp;

impl MetaCategory for Gmp {
    const NAME: &'static str = "GMP";

    type Identifier = GmpIdentifier;
    type Entry = GmpEntry;

    fn is_valid(identifier: &GmpIdentifier) -> bool {
        identifier.primary_id.is_valid()
    }

    fn file_index(_identifier: &GmpIdentifier) -> MetaIndex {
        MetaIndex::Gmp
    }

    fn patch(index: MetaIndex, data: &mut Vec<u8>, group: &MetaGroup<Self>) -> Result<()> {
        for (identifier, (_, entry)) in group {
            write_u64_row(index, data, identifier.primary_id.row(), entry.to_bits(), 0)?;
        }
        Ok(())
    }
}

/// Read the entry of `primary_id` from a GMP file; missing rows are disabled.
pub fn gmp_entry(data: &[u8], primary_id: PrimaryId) -> GmpEntry {
    GmpEntry::from_bits(read_u64_row(data, primary_id.row()).unwrap_or(0))
}
