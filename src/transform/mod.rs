//! Transform implementations for extracted records

mod field_dropper;

pub use field_dropper::FieldDropper;
