pub mod category;
pub mod file;
pub mod source;

pub use category::FileTypeCategory;
pub use file::{FileRecord, NewFileRecord, OwnerRef, SourceKind};
pub use source::{LocalFile, UploadSource};
