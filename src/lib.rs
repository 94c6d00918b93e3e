use enzymes::EnzymeCatalog;
use ladder::LadderCatalog;
use lazy_static::lazy_static;

pub use bandwagon_engine as engine;

pub mod about;
pub mod band;
pub mod compare;
pub mod config;
pub mod digestion;
pub mod dna_sequence;
pub mod enzymes;
pub mod iupac_code;
pub mod ladder;
pub mod restriction_enzyme;

lazy_static! {
    // Built-in restriction enzymes
    pub static ref ENZYMES: EnzymeCatalog = EnzymeCatalog::default();

    // Built-in ladders
    pub static ref LADDERS: LadderCatalog = LadderCatalog::default();
}
