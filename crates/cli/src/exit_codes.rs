// Exit code registry — single source of truth for the survmerge binary.

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 64;
/// Session files missing, unreadable, or malformed.
pub const EXIT_LOAD: u8 = 65;
/// Engine or output failure.
pub const EXIT_RUNTIME: u8 = 66;
