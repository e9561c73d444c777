//! Dataset adapters, result assembly, and exchange for the pipeline.

mod assemble;
mod error;
mod exchange;
mod graph;
mod reader;

pub use assemble::{DisplayOptions, ResultAssembler, SectionLayout, SectionRule};
pub use error::IoError;
pub use exchange::{to_delimited, TranslatorClient};
pub use graph::{GraphColumn, GraphField, GraphReader};
pub use reader::RecordReader;
