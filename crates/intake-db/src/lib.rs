//! Intake DB Library
//!
//! Persistence for file metadata records: the `FileRepository` trait, its Postgres
//! implementation with bundled migrations, and an in-memory implementation.

pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryFileRepository;
pub use postgres::{connect, FileRow, PgFileRepository};
pub use repository::FileRepository;
