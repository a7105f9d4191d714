//! Whole-asset encoding and decoding
//!
//! [`AssetBuilder`] owns every buffer of an export and only touches a writer
//! once all of them are final. [`DecodedAsset`] parses a finished asset back
//! into typed records.

mod builder;
mod decode;

#[cfg(test)]
mod tests;

pub use builder::{AssetBuilder, AssetSummary};
pub use decode::DecodedAsset;
