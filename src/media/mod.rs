//! Media library: uploads on local disk and YouTube thumbnail lookup.

pub mod store;
pub mod youtube;

pub use store::{MediaEntry, MediaError, MediaStore, PendingUpload, StoredFile, UploadKind};
