//! Zone configuration parameters.

/// Configuration shared by the zone implementations.
///
/// [`HeapZone`](crate::HeapZone) honours `name` and `byte_limit`;
/// [`BumpZone`](crate::BumpZone) honours `name`, `segment_bytes` and
/// `max_segments`. Values are fixed once the zone is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneConfig {
    /// Name reported by [`Zone::name`](crate::Zone::name) and in panics.
    pub name: String,

    /// Upper bound on live bytes. `None` means unbounded.
    ///
    /// Requests that would push live bytes past the limit fail with
    /// `ZoneError::LimitExceeded` instead of reaching the system allocator.
    pub byte_limit: Option<usize>,

    /// Size of each bump segment in bytes.
    ///
    /// Default: 65_536. Requests larger than a segment get a dedicated
    /// segment of exactly their size. Values below
    /// [`MIN_SEGMENT_BYTES`](Self::MIN_SEGMENT_BYTES) are raised to it.
    pub segment_bytes: usize,

    /// Maximum number of bump segments, dedicated ones included.
    ///
    /// Default: 16.
    pub max_segments: usize,
}

impl ZoneConfig {
    /// Default bump segment size: 64KB.
    pub const DEFAULT_SEGMENT_BYTES: usize = 64 * 1024;

    /// Smallest bump segment the zone will create.
    pub const MIN_SEGMENT_BYTES: usize = 64;

    /// Default maximum bump segment count.
    pub const DEFAULT_MAX_SEGMENTS: usize = 16;

    /// Create a config with the given name and default values elsewhere.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            byte_limit: None,
            segment_bytes: Self::DEFAULT_SEGMENT_BYTES,
            max_segments: Self::DEFAULT_MAX_SEGMENTS,
        }
    }

    /// Cap live bytes at `limit`.
    pub fn with_byte_limit(mut self, limit: usize) -> Self {
        self.byte_limit = Some(limit);
        self
    }

    /// Set the bump segment size.
    pub fn with_segment_bytes(mut self, bytes: usize) -> Self {
        self.segment_bytes = bytes;
        self
    }

    /// Set the maximum bump segment count.
    pub fn with_max_segments(mut self, count: usize) -> Self {
        self.max_segments = count;
        self
    }

    /// Segment size after applying the minimum.
    pub fn effective_segment_bytes(&self) -> usize {
        self.segment_bytes.max(Self::MIN_SEGMENT_BYTES)
    }
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self::new("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ZoneConfig::default();
        assert_eq!(config.name, "default");
        assert_eq!(config.byte_limit, None);
        assert_eq!(config.segment_bytes, 64 * 1024);
        assert_eq!(config.max_segments, 16);
    }

    #[test]
    fn builders_override_fields() {
        let config = ZoneConfig::new("scratch")
            .with_byte_limit(4096)
            .with_segment_bytes(8)
            .with_max_segments(2);
        assert_eq!(config.byte_limit, Some(4096));
        assert_eq!(config.effective_segment_bytes(), ZoneConfig::MIN_SEGMENT_BYTES);
        assert_eq!(config.max_segments, 2);
    }
}
