// Section handling
//
// A section is a labelled block of the "Performance PARK 25" sheet: one label
// row whose cells name the sites, followed by 12 month rows and the annual sum.

pub mod extractor;
pub mod locator;
pub mod period;

use thiserror::Error;

pub use extractor::{extract, ExtractOptions, SectionRow, SectionTable};
pub use locator::{
    SectionLocator, SectionRef, SectionStrategy, DEFAULT_SECTION_MARKER,
    FIXED_SECTION_DATA_ROWS, FIXED_SECTION_STARTS,
};
pub use period::{Period, RowKey, UnknownPeriod, ANNUAL_SUM_LABEL};

#[derive(Error, Debug)]
pub enum SectionError {
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Malformed section '{label}': {reason}")]
    MalformedSection { label: String, reason: String },
}
