//! The six per-identifier meta categories.
//!
//! Each submodule defines the identifier and entry types of one game file
//! family together with a zero-sized marker implementing
//! [`MetaCategory`](crate::table::MetaCategory). The marker is what makes the
//! six [`MetaTable`](crate::table::MetaTable) instances type-distinct.

pub mod eqdp;
pub mod eqp;
pub mod est;
pub mod gmp;
pub mod imc;
pub mod rsp;

pub use eqdp::{Eqdp, EqdpEntry, EqdpIdentifier};
pub use eqp::{Eqp, EqpEntry, EqpIdentifier};
pub use est::{Est, EstEntry, EstIdentifier};
pub use gmp::{Gmp, GmpEntry, GmpIdentifier};
pub use imc::{Imc, ImcEntry, ImcIdentifier};
pub use rsp::{Rsp, RspEntry, RspIdentifier};
