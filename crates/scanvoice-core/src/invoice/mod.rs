//! Invoice field extraction module.

mod assembler;
mod entities;
mod parser;
pub mod rules;

pub use assembler::RecordAssembler;
pub use entities::{
    Entity, EntityFallbackExtractor, EntityLabel, EntityRecognizer, EntityVendor,
    PatternEntityRecognizer,
};
pub use parser::{ExtractionResult, InvoiceParser};
