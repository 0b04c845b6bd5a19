//! Remote rate source adapters

pub mod jsdelivr;
