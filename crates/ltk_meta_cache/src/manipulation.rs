//! Category-tagged identifiers and entries.
//!
//! [`MetaIdentifier`] and [`MetaEntry`] are closed sum types over the seven
//! categories. A [`MetaManipulation`] pairs one of each; the pairing is only
//! meaningful when both carry the same category, which
//! [`MetaManipulation::is_consistent`] checks and [`MetaCache::apply_mod`]
//! enforces.
//!
//! [`MetaCache::apply_mod`]: crate::cache::MetaCache::apply_mod

use crate::categories::{
    EqdpEntry, EqdpIdentifier, EqpEntry, EqpIdentifier, EstEntry, EstIdentifier, GmpEntry,
    GmpIdentifier, ImcEntry, ImcIdentifier, RspEntry, RspIdentifier,
};
use crate::global_eqp::GlobalEqpManipulation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Addresses one overridable location in any category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetaIdentifier {
    Eqdp(EqdpIdentifier),
    Eqp(EqpIdentifier),
    Est(EstIdentifier),
    Gmp(GmpIdentifier),
    Imc(ImcIdentifier),
    Rsp(RspIdentifier),
    GlobalEqp(GlobalEqpManipulation),
}

impl MetaIdentifier {
    pub fn category(&self) -> &'static str {
        match self {
            MetaIdentifier::Eqdp(_) => "EQDP",
            MetaIdentifier::Eqp(_) => "EQP",
            MetaIdentifier::Est(_) => "EST",
            MetaIdentifier::Gmp(_) => "GMP",
            MetaIdentifier::Imc(_) => "IMC",
            MetaIdentifier::Rsp(_) => "RSP",
            MetaIdentifier::GlobalEqp(_) => "GlobalEQP",
        }
    }
}

impl fmt::Display for MetaIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaIdentifier::Eqdp(id) => write!(
                f,
                "EQDP {} {} {}",
                id.gender_race, id.primary_id, id.slot
            ),
            MetaIdentifier::Eqp(id) => write!(f, "EQP {} {}", id.primary_id, id.slot),
            MetaIdentifier::Est(id) => write!(
                f,
                "EST {} {} {}",
                id.est_type, id.gender_race, id.primary_id
            ),
            MetaIdentifier::Gmp(id) => write!(f, "GMP {}", id.primary_id),
            MetaIdentifier::Imc(id) => write!(
                f,
                "IMC {} v{} {}",
                id.path().game_path(),
                id.variant,
                id.slot
            ),
            MetaIdentifier::Rsp(id) => write!(f, "RSP {:?} {:?}", id.sub_race, id.attribute),
            MetaIdentifier::GlobalEqp(rule) => {
                write!(f, "GlobalEQP {:?} {}", rule.rule, rule.condition)
            }
        }
    }
}

/// Override value for any category. Global rules carry no value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetaEntry {
    Eqdp(EqdpEntry),
    Eqp(EqpEntry),
    Est(EstEntry),
    Gmp(GmpEntry),
    Imc(ImcEntry),
    Rsp(RspEntry),
    GlobalEqp,
}

impl MetaEntry {
    pub fn category(&self) -> &'static str {
        match self {
            MetaEntry::Eqdp(_) => "EQDP",
            MetaEntry::Eqp(_) => "EQP",
            MetaEntry::Est(_) => "EST",
            MetaEntry::Gmp(_) => "GMP",
            MetaEntry::Imc(_) => "IMC",
            MetaEntry::Rsp(_) => "RSP",
            MetaEntry::GlobalEqp => "GlobalEQP",
        }
    }
}

/// One identifier/entry pair contributed by a mod option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaManipulation {
    pub identifier: MetaIdentifier,
    pub entry: MetaEntry,
}

impl MetaManipulation {
    pub fn new(identifier: MetaIdentifier, entry: MetaEntry) -> Self {
        Self { identifier, entry }
    }

    /// Whether identifier and entry belong to the same category.
    pub fn is_consistent(&self) -> bool {
        self.identifier.category() == self.entry.category()
    }
}

macro_rules! impl_manipulation_from {
    ($($variant:ident => $identifier:ty, $entry:ty;)*) => {
        $(
            impl From<$identifier> for MetaIdentifier {
                fn from(value: $identifier) -> Self {
                    MetaIdentifier::$variant(value)
                }
            }

            impl From<$entry> for MetaEntry {
                fn from(value: $entry) -> Self {
                    MetaEntry::$variant(value)
                }
            }

            impl From<($identifier, $entry)> for MetaManipulation {
                fn from((identifier, entry): ($identifier, $entry)) -> Self {
                    Self::new(MetaIdentifier::$variant(identifier), MetaEntry::$variant(entry))
                }
            }
        )*
    };
}

impl_manipulation_from! {
    Eqdp => EqdpIdentifier, EqdpEntry;
    Eqp => EqpIdentifier, EqpEntry;
    Est => EstIdentifier, EstEntry;
    Gmp => GmpIdentifier, GmpEntry;
    Imc => ImcIdentifier, ImcEntry;
    Rsp => RspIdentifier, RspEntry;
}

impl From<GlobalEqpManipulation> for MetaIdentifier {
    fn from(value: GlobalEqpManipulation) -> Self {
        MetaIdentifier::GlobalEqp(value)
    }
}

impl From<GlobalEqpManipulation> for MetaManipulation {
    fn from(value: GlobalEqpManipulation) -> Self {
        Self::new(MetaIdentifier::GlobalEqp(value), MetaEntry::GlobalEqp)
    }
}
