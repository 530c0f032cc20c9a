//! Record types flowing through the ingest pipeline

pub mod company;

pub use company::{
    CompanyRecord, Email, Phone, RawListing, TaxId, MERGED_PLATFORM, MULTIPLE_SOURCES,
};
