//! Domain models for the clinic record store.
//!
//! Each entity comes as a `*Fields` struct (what callers write) and a stored
//! record (fields plus the store-assigned id and timestamps).

mod billing;
mod enums;
mod ids;
mod medication;
mod money;
mod patient;
mod practitioner;
mod prescription;
pub(crate) mod validate;
mod visit;

pub use billing::*;
pub use enums::*;
pub use ids::*;
pub use lab_test::*;
pub use medication::*;
pub use money::*;
pub use patient::*;
pub use practitioner::*;
pub use prescription::*;
pub use visit::*;
