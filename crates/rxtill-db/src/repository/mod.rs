//! # Repositories
//!
//! One module per aggregate. Each repository is a thin struct over the
//! pool for standalone reads, plus associated functions taking a
//! `&mut SqliteConnection` for the steps that must participate in a
//! caller's transaction (the finalize/void orchestration in
//! [`crate::engine`] passes its transaction connection through these).

pub mod audit;
pub mod bill;
pub mod catalog;
pub mod ledger;
pub mod sequence;
pub mod settings;
pub mod token;
