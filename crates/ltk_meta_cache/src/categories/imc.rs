//! Model variant tables (IMC).
//!
//! One file per model path. Layout:
//!
//! ```text
//! u16 variant_count
//! u16 part_mask
//! (variant_count + 1) rows, each with one 6-byte entry per part in part_mask
//! ```
//!
//! Row 0 is the default variant. Equipment, accessory and demihuman files
//! have one part per slot of their family, in
//! [`EquipSlot::part_index`] order; weapon and monster files have a single part.

use crate::error::{Error, Result};
use crate::files::{ImcPath, MetaIndex};
use crate::table::{MetaCategory, MetaGroup};
use crate::types::{EquipSlot, ObjectType, PrimaryId, SecondaryId, Variant};
use byteorder::{ByteOrder, LE};
use serde::{Deserialize, Serialize};

const HEADER_LEN: usize = 4;
const ENTRY_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImcEntry {
    pub material_id: u8,
    pub decal_id: u8,
    /// 10 bits.
    pub attribute_mask: u16,
    /// 6 bits.
    pub sound_id: u8,
    pub vfx_id: u8,
    pub material_animation_id: u8,
}

impl ImcEntry {
    pub fn read(bytes: &[u8]) -> Self {
        let packed = LE::read_u16(&bytes[2..4]);
        Self {
            material_id: bytes[0],
            decal_id: bytes[1],
            attribute_mask: packed & 0x3FF,
            sound_id: (packed >> 10) as u8,
            vfx_id: bytes[4],
            material_animation_id: bytes[5],
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        let packed = (self.attribute_mask & 0x3FF) | ((self.sound_id as u16 & 0x3F) << 10);
        bytes[0] = self.material_id;
        bytes[1] = self.decal_id;
        LE::write_u16(&mut bytes[2..4], packed);
        bytes[4] = self.vfx_id;
        bytes[5] = self.material_animation_id;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImcIdentifier {
    pub object_type: ObjectType,
    pub primary_id: PrimaryId,
    pub secondary_id: SecondaryId,
    pub variant: Variant,
    /// `Unknown` for single-part files.
    pub slot: EquipSlot,
}

impl ImcIdentifier {
    pub fn path(&self) -> ImcPath {
        ImcPath {
            object_type: self.object_type,
            primary_id: self.primary_id,
            secondary_id: self.secondary_id,
        }
    }
}

/// Marker for the IMC category.
pub struct Imc;

impl MetaCategory for Imc {
    const NAME: &'static str = "IMC";

    type Identifier = ImcIdentifier;
    type Entry = ImcEntry;

    fn is_valid(identifier: &ImcIdentifier) -> bool {
        if !identifier.primary_id.is_valid() || !identifier.secondary_id.is_valid() {
            return false;
        }
        match identifier.object_type {
            ObjectType::Equipment => {
                identifier.slot.is_equipment() && identifier.secondary_id == SecondaryId(0)
            }
            ObjectType::Accessory => {
                identifier.slot.is_accessory() && identifier.secondary_id == SecondaryId(0)
            }
            ObjectType::DemiHuman => identifier.slot.is_equipment(),
            ObjectType::Weapon | ObjectType::Monster => identifier.slot == EquipSlot::Unknown,
        }
    }

    fn file_index(identifier: &ImcIdentifier) -> MetaIndex {
        MetaIndex::Imc(identifier.path())
    }

    fn patch(index: MetaIndex, data: &mut Vec<u8>, group: &MetaGroup<Self>) -> Result<()> {
        let layout = Layout::parse(index, data)?;

        let Some(max_variant) = group.keys().map(|id| id.variant.0 as usize).max() else {
            return Ok(());
        };
        if max_variant > layout.variant_count {
            layout.expand(index, data, max_variant)?;
        }
        let layout = Layout {
            variant_count: layout.variant_count.max(max_variant),
            ..layout
        };

        for (identifier, (source, entry)) in group {
            let Some(offset) = layout.entry_offset(identifier.variant, identifier.slot) else {
                tracing::warn!(
                    "IMC: {} has no part for slot {} (mask {:#07b}), skipping override from mod={}",
                    index,
                    identifier.slot,
                    layout.part_mask,
                    source
                );
                continue;
            };
            entry.write(&mut data[offset..offset + ENTRY_LEN]);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Layout {
    variant_count: usize,
    part_mask: u16,
    parts: usize,
    slot_parts: bool,
}

impl Layout {
    fn parse(index: MetaIndex, data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::malformed(index, "missing header"));
        }
        let variant_count = LE::read_u16(&data[0..2]) as usize;
        let part_mask = LE::read_u16(&data[2..4]);
        let slot_parts = match index {
            MetaIndex::Imc(path) => path.object_type.has_slot_parts(),
            _ => false,
        };
        let parts = if slot_parts {
            (part_mask & 0x1F).count_ones() as usize
        } else {
            1
        };
        if parts == 0 {
            return Err(Error::malformed(index, "part mask selects no parts"));
        }

        let layout = Self {
            variant_count,
            part_mask,
            parts,
            slot_parts,
        };
        let required = layout.len_for(variant_count);
        if data.len() < required {
            return Err(Error::malformed(
                index,
                format!(
                    "{variant_count} variants of {parts} parts need {required} bytes, file has {}",
                    data.len()
                ),
            ));
        }
        Ok(layout)
    }

    fn row_len(&self) -> usize {
        self.parts * ENTRY_LEN
    }

    fn len_for(&self, variant_count: usize) -> usize {
        HEADER_LEN + (variant_count + 1) * self.row_len()
    }

    /// Append copies of the default row until `variant` exists.
    fn expand(&self, index: MetaIndex, data: &mut Vec<u8>, variant: usize) -> Result<()> {
        let new_len = self.len_for(variant);
        let additional = new_len.saturating_sub(data.len());
        data.try_reserve_exact(additional)
            .map_err(|_| Error::Allocation {
                index,
                bytes: new_len,
            })?;

        // Rows beyond the declared count are dropped before appending.
        data.truncate(self.len_for(self.variant_count));
        let default_row = HEADER_LEN..HEADER_LEN + self.row_len();
        for _ in self.variant_count..variant {
            data.extend_from_within(default_row.clone());
        }
        LE::write_u16(&mut data[0..2], variant as u16);
        tracing::debug!(
            "IMC: expanded {} from {} to {} variants",
            index,
            self.variant_count,
            variant
        );
        Ok(())
    }

    fn part_position(&self, slot: EquipSlot) -> Option<usize> {
        if !self.slot_parts {
            return (slot == EquipSlot::Unknown).then_some(0);
        }
        let bit = slot.part_index()?;
        if self.part_mask & (1 << bit) == 0 {
            return None;
        }
        Some((self.part_mask & ((1 << bit) - 1)).count_ones() as usize)
    }

    fn entry_offset(&self, variant: Variant, slot: EquipSlot) -> Option<usize> {
        let row = variant.0 as usize;
        if row > self.variant_count {
            return None;
        }
        let part = self.part_position(slot)?;
        Some(HEADER_LEN + row * self.row_len() + part * ENTRY_LEN)
    }
}

/// Read one entry from an IMC file, if the file has that variant and part.
pub fn imc_entry(
    path: ImcPath,
    data: &[u8],
    variant: Variant,
    slot: EquipSlot,
) -> Option<ImcEntry> {
    let layout = Layout::parse(MetaIndex::Imc(path), data).ok()?;
    let offset = layout.entry_offset(variant, slot)?;
    Some(ImcEntry::read(&data[offset..offset + ENTRY_LEN]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{InMemoryDefaultFiles, MetaFile};
    use crate::mods::ModId;
    use crate::table::MetaTable;
    use std::sync::Arc;

    fn entry(material_id: u8) -> ImcEntry {
        ImcEntry {
            material_id,
            decal_id: 0,
            attribute_mask: 0x155,
            sound_id: 3,
            vfx_id: 0,
            material_animation_id: 0,
        }
    }

    fn encode(variant_count: u16, part_mask: u16, rows: &[Vec<ImcEntry>]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        LE::write_u16(&mut data[0..2], variant_count);
        LE::write_u16(&mut data[2..4], part_mask);
        for row in rows {
            for e in row {
                let mut bytes = [0u8; ENTRY_LEN];
                e.write(&mut bytes);
                data.extend_from_slice(&bytes);
            }
        }
        data
    }

    fn equipment(primary: u16, variant: u8, slot: EquipSlot) -> ImcIdentifier {
        ImcIdentifier {
            object_type: ObjectType::Equipment,
            primary_id: PrimaryId(primary),
            secondary_id: SecondaryId(0),
            variant: Variant(variant),
            slot,
        }
    }

    fn table_with(path: ImcPath, data: Vec<u8>) -> MetaTable<Imc> {
        let provider =
            InMemoryDefaultFiles::new().with_file(MetaIndex::Imc(path), MetaFile::from(data));
        MetaTable::new(Arc::new(provider))
    }

    #[test]
    fn test_entry_packing() {
        let e = ImcEntry {
            material_id: 1,
            decal_id: 2,
            attribute_mask: 0x3FF,
            sound_id: 0x3F,
            vfx_id: 5,
            material_animation_id: 6,
        };
        let mut bytes = [0u8; ENTRY_LEN];
        e.write(&mut bytes);
        assert_eq!(bytes, [1, 2, 0xFF, 0xFF, 5, 6]);
        assert_eq!(ImcEntry::read(&bytes), e);
    }

    #[test]
    fn test_validation() {
        let path = equipment(1, 0, EquipSlot::Head).path();
        let mut table = table_with(path, encode(0, 0x1F, &[vec![entry(0); 5]]));
        let source = ModId::new("Foo");

        assert!(!table.apply_mod(source.clone(), equipment(1, 0, EquipSlot::Ears), entry(1)));
        let mut with_secondary = equipment(1, 0, EquipSlot::Head);
        with_secondary.secondary_id = SecondaryId(2);
        assert!(!table.apply_mod(source.clone(), with_secondary, entry(1)));
        let weapon_with_slot = ImcIdentifier {
            object_type: ObjectType::Weapon,
            slot: EquipSlot::MainHand,
            ..equipment(1, 0, EquipSlot::Head)
        };
        assert!(!table.apply_mod(source.clone(), weapon_with_slot, entry(1)));
        assert!(table.apply_mod(source, equipment(1, 0, EquipSlot::Head), entry(1)));
    }

    #[test]
    fn test_patch_part_position_follows_mask() {
        let path = equipment(12, 0, EquipSlot::Head).path();
        // Head, hands and feet only.
        let default = encode(1, 0b10101, &[vec![entry(0); 3], vec![entry(0); 3]]);
        let mut table = table_with(path, default);
        table.apply_mod(ModId::new("Foo"), equipment(12, 1, EquipSlot::Feet), entry(9));

        let file = table.file(MetaIndex::Imc(path)).unwrap().unwrap();
        assert_eq!(file.len(), HEADER_LEN + 2 * 3 * ENTRY_LEN);
        assert_eq!(imc_entry(path, file.as_bytes(), Variant(1), EquipSlot::Feet), Some(entry(9)));
        assert_eq!(imc_entry(path, file.as_bytes(), Variant(1), EquipSlot::Hands), Some(entry(0)));
        assert_eq!(imc_entry(path, file.as_bytes(), Variant(1), EquipSlot::Body), None);
    }

    #[test]
    fn test_missing_part_is_skipped() {
        let path = equipment(12, 0, EquipSlot::Head).path();
        let default = encode(0, 0b00001, &[vec![entry(0)]]);
        let mut table = table_with(path, default.clone());
        table.apply_mod(ModId::new("Foo"), equipment(12, 0, EquipSlot::Body), entry(9));

        let file = table.file(MetaIndex::Imc(path)).unwrap().unwrap();
        assert_eq!(file.as_bytes(), default);
    }

    #[test]
    fn test_expansion_copies_default_variant() {
        let path = equipment(3, 0, EquipSlot::Head).path();
        let default = encode(1, 0b00011, &[vec![entry(7), entry(8)], vec![entry(1), entry(1)]]);
        let mut table = table_with(path, default);
        table.apply_mod(ModId::new("Foo"), equipment(3, 0, EquipSlot::Head), entry(42));
        table.apply_mod(ModId::new("Foo"), equipment(3, 4, EquipSlot::Body), entry(5));

        let file = table.file(MetaIndex::Imc(path)).unwrap().unwrap();
        let data = file.as_bytes();
        assert_eq!(LE::read_u16(&data[0..2]), 4);
        assert_eq!(data.len(), HEADER_LEN + 5 * 2 * ENTRY_LEN);
        // Expansion copies variant 0 as it was before patching.
        assert_eq!(imc_entry(path, data, Variant(0), EquipSlot::Head), Some(entry(42)));
        assert_eq!(imc_entry(path, data, Variant(1), EquipSlot::Head), Some(entry(1)));
        assert_eq!(imc_entry(path, data, Variant(2), EquipSlot::Head), Some(entry(7)));
        assert_eq!(imc_entry(path, data, Variant(3), EquipSlot::Body), Some(entry(8)));
        assert_eq!(imc_entry(path, data, Variant(4), EquipSlot::Body), Some(entry(5)));
    }

    #[test]
    fn test_single_part_weapon() {
        let path = ImcPath {
            object_type: ObjectType::Weapon,
            primary_id: PrimaryId(201),
            secondary_id: SecondaryId(3),
        };
        let default = encode(0, 0b1, &[vec![entry(0)]]);
        let mut table = table_with(path, default);
        let id = ImcIdentifier {
            object_type: ObjectType::Weapon,
            primary_id: PrimaryId(201),
            secondary_id: SecondaryId(3),
            variant: Variant(2),
            slot: EquipSlot::Unknown,
        };
        assert!(table.apply_mod(ModId::new("Foo"), id, entry(4)));

        let file = table.file(MetaIndex::Imc(path)).unwrap().unwrap();
        assert_eq!(
            imc_entry(path, file.as_bytes(), Variant(1), EquipSlot::Unknown),
            Some(entry(0))
        );
        assert_eq!(
            imc_entry(path, file.as_bytes(), Variant(2), EquipSlot::Unknown),
            Some(entry(4))
        );
    }

    #[test]
    fn test_truncated_file_is_malformed() {
        let path = equipment(3, 0, EquipSlot::Head).path();
        let mut table = table_with(path, encode(2, 0b11, &[vec![entry(0); 2]]));
        table.apply_mod(ModId::new("Foo"), equipment(3, 0, EquipSlot::Head), entry(1));
        assert!(matches!(table.set_files(), Err(Error::MalformedFile { .. })));
    }
}
