//! # Model Layer
//!
//! Domain vocabulary shared by every crate, plus the persistence store.

pub mod buy_crypto;
pub mod store;
