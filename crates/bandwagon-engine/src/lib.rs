//! Restriction digestion band computation.
//!
//! The engine merges the cut sites reported by a [`CutSiteLocator`] for every
//! enzyme of a digestion mix and turns them into fragment lengths, for linear
//! and circular molecules alike.

pub mod digest;
pub mod error;
pub mod locator;
pub mod topology;

pub use digest::{
    DigestSettings, Digestion, DigestionEngine, Fragment, ZeroLengthPolicy, bands_from_cut_sites,
    fragments_from_cut_sites,
};
pub use error::DigestError;
pub use locator::{CutSiteLocator, StaticCutSites};
pub use topology::Topology;
