//! Intake Processing Library
//!
//! Validation and ingestion: content sniffing, category policy, naming, remote
//! fetching, staging, and the `Ingestor` that ties them to storage and persistence.

pub mod attachments;
pub mod fetch;
pub mod ingest;
pub mod naming;
pub mod sniff;
pub mod staging;
pub mod validator;

pub use attachments::FileAttachments;
pub use fetch::{FetchedBody, HttpFetcher, ProbeResult};
pub use ingest::{remote_filename, DeleteOutcome, IngestOptions, Ingestor};
pub use naming::FileNamer;
pub use staging::StagedFile;
pub use validator::{ValidatedUpload, Validator};
