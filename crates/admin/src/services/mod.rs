//! Collaborators of the variant editor.
//!
//! # Services
//!
//! - `images` - Variant image uploads to local storage
//! - `notify` - Operator notices (logged and returned in API responses)
//! - `sessions` - Registry of open editor sessions

pub mod images;
pub mod notify;
pub mod sessions;

pub use images::{ImageStorage, LocalImageStorage, StorageError, UploadedImage};
pub use notify::{Notice, NoticeLevel};
pub use sessions::{EditorSessions, SharedEditor};
