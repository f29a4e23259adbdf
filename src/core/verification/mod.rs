//! Post-export validation
//!
//! Checks that the counters recorded in the summary tree agree with each
//! other, e.g. that every item the server reported was actually exported.

pub mod validator;

pub use validator::{validate, SummaryValidator, FILE_PAIR, ITEM_PAIR};
