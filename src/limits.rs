//! Buffer-growth constants shared by the query, iterator, and watcher
//! subsystems. Carried over from the reference implementation's
//! `common.hpp` so geometric-growth behavior matches exactly.

/// Initial allocation size for a scratch buffer that may need to grow
/// (symlink targets, `getcwd`, directory-entry batches).
pub const PATH_ALLOC_MIN_SIZE: usize = 255;

/// Hard ceiling past which buffer growth gives up and reports failure.
pub const PATH_ALLOC_MAX_SIZE: usize = 65535;

/// Initial stack/heap buffer size for a directory-entry batch read.
pub const DIRENT_STACK_BUFFER_SIZE: usize = 256;

/// Multiplicative growth factor applied each time a scratch buffer proves
/// too small.
pub const DIRENT_ALLOC_GROWTH_FACTOR: usize = 4;

/// Hard ceiling for a directory-entry batch buffer.
pub const DIRENT_ALLOC_MAX_SIZE: usize = 16_777_215;
