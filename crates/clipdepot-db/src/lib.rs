//! Database repositories for the clipdepot service
//!
//! Only media records live in the database. The repository implements
//! [`clipdepot_core::MetadataStore`] so the upload pipeline never sees SQL.

pub mod media_records;

pub use media_records::MediaRecordRepository;
