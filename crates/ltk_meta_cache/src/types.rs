//! Game data key types shared by the meta categories.
//!
//! These are the small, copyable values identifiers are built from: model ids,
//! equipment slots, gender/race combinations and the like. All of them are
//! totally ordered so identifiers can derive `Ord` structurally.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary model id of an item set (the `0012` in `e0012`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimaryId(pub u16);

impl PrimaryId {
    /// Largest id addressable in game paths (four decimal digits).
    pub const MAX: PrimaryId = PrimaryId(9999);

    pub fn is_valid(self) -> bool {
        self <= Self::MAX
    }

    /// Row index in dense per-id files.
    pub fn row(self) -> usize {
        self.0 as usize
    }
}

impl From<u16> for PrimaryId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for PrimaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Secondary model id (weapon body, monster body, demihuman equipment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecondaryId(pub u16);

impl SecondaryId {
    pub const MAX: SecondaryId = SecondaryId(9999);

    pub fn is_valid(self) -> bool {
        self <= Self::MAX
    }
}

impl fmt::Display for SecondaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Model variant inside an IMC file. Variant 0 is the file's default row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant(pub u8);

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Equipment slot a model is worn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum EquipSlot {
    #[default]
    Unknown,
    MainHand,
    OffHand,
    Head,
    Body,
    Hands,
    Legs,
    Feet,
    Ears,
    Neck,
    Wrists,
    RFinger,
    LFinger,
}

impl EquipSlot {
    pub const EQUIPMENT: [EquipSlot; 5] = [
        EquipSlot::Head,
        EquipSlot::Body,
        EquipSlot::Hands,
        EquipSlot::Legs,
        EquipSlot::Feet,
    ];

    pub const ACCESSORIES: [EquipSlot; 5] = [
        EquipSlot::Ears,
        EquipSlot::Neck,
        EquipSlot::Wrists,
        EquipSlot::RFinger,
        EquipSlot::LFinger,
    ];

    pub fn is_equipment(self) -> bool {
        Self::EQUIPMENT.contains(&self)
    }

    pub fn is_accessory(self) -> bool {
        Self::ACCESSORIES.contains(&self)
    }

    /// Position of the slot within its five-slot family.
    ///
    /// Equipment and accessory slots share positions `0..5`; per-slot bit
    /// fields and IMC parts are laid out in this order.
    pub fn part_index(self) -> Option<usize> {
        match self {
            EquipSlot::Head | EquipSlot::Ears => Some(0),
            EquipSlot::Body | EquipSlot::Neck => Some(1),
            EquipSlot::Hands | EquipSlot::Wrists => Some(2),
            EquipSlot::Legs | EquipSlot::RFinger => Some(3),
            EquipSlot::Feet | EquipSlot::LFinger => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for EquipSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Combined gender and model race, as encoded in `cXXXX` game paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum GenderRace {
    #[default]
    Unknown = 0,
    MidlanderMale = 101,
    MidlanderFemale = 201,
    HighlanderMale = 301,
    HighlanderFemale = 401,
    ElezenMale = 501,
    ElezenFemale = 601,
    MiqoteMale = 701,
    MiqoteFemale = 801,
    RoegadynMale = 901,
    RoegadynFemale = 1001,
    LalafellMale = 1101,
    LalafellFemale = 1201,
    AuRaMale = 1301,
    AuRaFemale = 1401,
    HrothgarMale = 1501,
    HrothgarFemale = 1601,
    VieraMale = 1701,
    VieraFemale = 1801,
}

impl GenderRace {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn is_valid(self) -> bool {
        self != GenderRace::Unknown
    }
}

impl fmt::Display for GenderRace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{:04}", self.code())
    }
}

/// Playable clan, used to key racial scaling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum SubRace {
    #[default]
    Unknown,
    Midlander,
    Highlander,
    Wildwood,
    Duskwight,
    SeekerOfTheSun,
    KeeperOfTheMoon,
    Seawolf,
    Hellsguard,
    Plainsfolk,
    Dunesfolk,
    Raen,
    Xaela,
    Hellion,
    Lost,
    Rava,
    Veena,
}

impl SubRace {
    pub const COUNT: usize = 16;

    /// Zero-based block index in `human.cmp`; `None` for `Unknown`.
    pub fn index(self) -> Option<usize> {
        match self {
            SubRace::Unknown => None,
            other => Some(other as usize - 1),
        }
    }
}

/// Which skeleton template file an EST entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EstType {
    Face,
    Hair,
    Head,
    Body,
}

impl EstType {
    pub fn file_name(self) -> &'static str {
        match self {
            EstType::Face => "faceskeletontemplate.est",
            EstType::Hair => "hairskeletontemplate.est",
            EstType::Head => "extra_met.est",
            EstType::Body => "extra_top.est",
        }
    }
}

impl fmt::Display for EstType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Kind of object an IMC file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Equipment,
    Accessory,
    Weapon,
    Monster,
    DemiHuman,
}

impl ObjectType {
    /// Whether files of this type hold one part per equipment slot.
    pub fn has_slot_parts(self) -> bool {
        matches!(
            self,
            ObjectType::Equipment | ObjectType::Accessory | ObjectType::DemiHuman
        )
    }
}

/// Scaling attribute inside a `human.cmp` sub-race block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RspAttribute {
    MaleMinSize,
    MaleMaxSize,
    MaleMinTail,
    MaleMaxTail,
    FemaleMinSize,
    FemaleMaxSize,
    FemaleMinTail,
    FemaleMaxTail,
    BustMinX,
    BustMinY,
    BustMinZ,
    BustMaxX,
    BustMaxY,
    BustMaxZ,
}

impl RspAttribute {
    pub const COUNT: usize = 14;

    pub fn index(self) -> usize {
        self as usize
    }
}
