// Chunk: docs/chunks/buffer_options - Serializable buffer options

//! Tuning knobs for a [`TextBuffer`](crate::TextBuffer).

use crate::error::{BufferError, Result};

/// Default upper bound on the number of bytes stored in one rope leaf.
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 1024;

/// Smallest accepted `max_chunk_bytes`. Anything smaller makes the tree
/// deeper than the data justifies.
pub const MIN_CHUNK_BYTES: usize = 8;

/// Default interval (in mutations) between line-index drift checks in debug
/// builds.
pub const DEFAULT_VERIFY_EVERY: u64 = 64;

/// Options controlling the storage layout of a buffer.
///
/// ```
/// use lite_rope_buffer::BufferOptions;
///
/// let opts = BufferOptions::default().with_max_chunk_bytes(256);
/// assert!(opts.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BufferOptions {
    /// Maximum bytes per rope leaf. Leaves are kept between a quarter of
    /// this and this value (except a lone root leaf).
    pub max_chunk_bytes: usize,
    /// In debug builds, every `verify_every`-th mutation rebuilds the line
    /// index from storage and asserts it matches. `0` disables the check.
    /// Ignored in release builds.
    pub verify_every: u64,
}

impl BufferOptions {
    pub fn with_max_chunk_bytes(mut self, max_chunk_bytes: usize) -> Self {
        self.max_chunk_bytes = max_chunk_bytes;
        self
    }

    pub fn with_verify_every(mut self, verify_every: u64) -> Self {
        self.verify_every = verify_every;
        self
    }

    /// Checks the options for values the rope cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidOptions`] if `max_chunk_bytes` is below
    /// [`MIN_CHUNK_BYTES`].
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_bytes < MIN_CHUNK_BYTES {
            return Err(BufferError::InvalidOptions(format!(
                "max_chunk_bytes must be at least {MIN_CHUNK_BYTES}, got {}",
                self.max_chunk_bytes
            )));
        }
        Ok(())
    }
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            verify_every: DEFAULT_VERIFY_EVERY,
        }
    }
}
