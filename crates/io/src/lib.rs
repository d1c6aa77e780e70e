//! `survmerge-io` — session file discovery and CSV record I/O.
//!
//! Everything here is a collaborator of the engine crate: it produces and
//! consumes in-memory record sequences, the engine never sees a path.

pub mod discover;
pub mod error;
pub mod loader;
pub mod writer;

pub use discover::{discover_session_dirs, discover_session_files};
pub use error::LoadError;
pub use loader::{load_file, load_records};
pub use writer::{read_combined, write_combined, CombinedHeader};
