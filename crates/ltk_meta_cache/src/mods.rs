//! Mod identity, priorities and option settings.
//!
//! The cache itself only needs a mod's identity ([`ModId`]). The rest of this
//! module describes what a mod contributes: a default option plus option groups,
//! each selected through a [`Setting`], every option carrying a list of
//! [`MetaManipulation`]s. [`ModDefinition::active_manipulations`] turns a mod
//! and its settings into the manipulations the recompute driver replays.

use crate::error::Result;
use crate::manipulation::MetaManipulation;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

/// Opaque identity of a mod. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModId(Arc<str>);

impl ModId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Priority of a mod or option group. Higher values win conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModPriority(pub i32);

impl fmt::Display for ModPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selection value of one option group.
///
/// Single-choice groups store the selected option index; multi-choice groups
/// store one bit per enabled option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Setting(pub u64);

impl Setting {
    pub const ZERO: Setting = Setting(0);
    pub const TRUE: Setting = Setting(1);
    pub const FALSE: Setting = Setting(0);
    pub const INDEFINITE: Setting = Setting(u64::MAX);

    /// A multi-choice setting with only option `idx` enabled.
    pub fn multi(idx: usize) -> Self {
        Self(1u64.checked_shl(idx as u32).unwrap_or(0))
    }

    /// A single-choice setting selecting option `idx`.
    pub fn single(idx: usize) -> Self {
        Self(idx as u64)
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }

    pub fn as_bool(self) -> bool {
        self.0 != 0
    }

    /// The selected option index of a single-choice setting.
    pub fn as_index(self) -> usize {
        self.0.min(i32::MAX as u64) as usize
    }

    /// Lower 32 bits reinterpreted as a priority.
    pub fn as_priority(self) -> ModPriority {
        ModPriority((self.0 & 0xFFFF_FFFF) as u32 as i32)
    }

    pub fn has_flag(self, idx: usize) -> bool {
        idx < 64 && self.0 & (1u64 << idx) != 0
    }

    pub fn set_bit(self, idx: usize, value: bool) -> Self {
        if idx >= 64 {
            return self;
        }
        if value {
            Self(self.0 | (1u64 << idx))
        } else {
            Self(self.0 & !(1u64 << idx))
        }
    }

    /// Remove bit `idx`, shifting every higher bit down by one.
    pub fn remove_bit(self, idx: usize) -> Self {
        if idx >= 64 {
            return self;
        }
        let low = self.0 & low_mask(idx);
        let high = self.0.checked_shr(idx as u32 + 1).unwrap_or(0) << idx;
        Self(low | high)
    }

    /// Move bit `from` to position `to`, shifting the bits in between.
    pub fn move_bit(self, from: usize, to: usize) -> Self {
        if from == to || from >= 64 || to >= 64 {
            return self;
        }
        let bit = self.has_flag(from);
        let removed = self.remove_bit(from).0;
        let low = removed & low_mask(to);
        let high = (removed >> to).checked_shl(to as u32 + 1).unwrap_or(0);
        Self(low | high).set_bit(to, bit)
    }

    /// Every option of a `count`-option multi group enabled.
    pub fn all_bits(count: usize) -> Self {
        Self(low_mask(count.min(63)))
    }

    /// Convert a multi-choice setting into a single-choice one selecting the
    /// lowest enabled option, clamped to `count - 1`.
    ///
    /// A group without options has nothing to select and yields
    /// [`Setting::INDEFINITE`].
    pub fn turn_multi(self, count: usize) -> Self {
        let Some(last) = count.checked_sub(1) else {
            return Self::INDEFINITE;
        };
        let lowest = self.0.trailing_zeros() as usize;
        Self(lowest.min(last) as u64)
    }
}

impl BitOr for Setting {
    type Output = Setting;

    fn bitor(self, rhs: Self) -> Self::Output {
        Setting(self.0 | rhs.0)
    }
}

fn low_mask(bits: usize) -> u64 {
    1u64.checked_shl(bits as u32).map_or(u64::MAX, |v| v - 1)
}

/// One selectable option of a mod.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manipulations: Vec<MetaManipulation>,
}

/// How the options of a group are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupType {
    /// Exactly one option is active.
    Single,
    /// Any subset of options is active.
    Multi,
}

/// A group of options sharing one [`Setting`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModGroup {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    /// Groups are applied in ascending priority within a mod.
    #[serde(default)]
    pub priority: ModPriority,
    /// Used when the collection has no setting for this group.
    #[serde(default)]
    pub default_settings: Setting,
    #[serde(default)]
    pub options: Vec<ModOption>,
}

impl ModGroup {
    /// Options enabled by `setting`, in option order.
    pub fn active_options(&self, setting: Setting) -> impl Iterator<Item = &ModOption> + '_ {
        let group_type = self.group_type;
        self.options
            .iter()
            .enumerate()
            .filter(move |(idx, _)| match group_type {
                GroupType::Single => *idx == setting.as_index(),
                GroupType::Multi => setting.has_flag(*idx),
            })
            .map(|(_, option)| option)
    }
}

/// Everything a mod contributes to the meta cache.
///
/// Stored as JSON next to the mod's files:
///
/// ```json
/// {
///   "id": "viera-hats",
///   "name": "Viera Hats",
///   "defaultOption": { "name": "Default", "manipulations": [] },
///   "groups": [
///     { "name": "Ears", "type": "single", "priority": 0, "options": [] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModDefinition {
    pub id: ModId,
    pub name: String,
    #[serde(default)]
    pub default_option: ModOption,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ModGroup>,
}

impl ModDefinition {
    /// Load a mod definition from a JSON file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_std_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Number of manipulations across every option, selected or not.
    pub fn total_manipulations(&self) -> usize {
        self.default_option.manipulations.len()
            + self
                .groups
                .iter()
                .flat_map(|group| &group.options)
                .map(|option| option.manipulations.len())
                .sum::<usize>()
    }

    /// Manipulations selected by `settings`, in application order.
    ///
    /// The default option comes first, then groups in ascending priority
    /// (stable on declaration order). `settings[i]` selects the options of
    /// `groups[i]`; missing entries fall back to the group's default settings.
    pub fn active_manipulations<'a>(&'a self, settings: &[Setting]) -> Vec<&'a MetaManipulation> {
        let mut order = (0..self.groups.len()).collect::<Vec<_>>();
        order.sort_by_key(|&idx| self.groups[idx].priority);

        let mut result = self.default_option.manipulations.iter().collect::<Vec<_>>();
        for idx in order {
            let group = &self.groups[idx];
            let setting = settings
                .get(idx)
                .copied()
                .unwrap_or(group.default_settings);
            for option in group.active_options(setting) {
                result.extend(option.manipulations.iter());
            }
        }
        result
    }
}
