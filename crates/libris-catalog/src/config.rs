use libris_error::{LibrisError, Result};

/// Maximum number of pending reservations per book.
pub const DEFAULT_WAITLIST_CAPACITY: usize = 20;

/// Configuration for [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogConfig {
    waitlist_capacity: usize,
}

impl CatalogConfig {
    /// Build a configuration with an explicit waitlist bound.
    pub fn new(waitlist_capacity: usize) -> Result<Self> {
        if waitlist_capacity == 0 {
            return Err(LibrisError::InvalidConfig {
                detail: String::from("waitlist_capacity must be > 0"),
            });
        }
        Ok(Self { waitlist_capacity })
    }

    #[inline]
    pub const fn waitlist_capacity(&self) -> usize {
        self.waitlist_capacity
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            waitlist_capacity: DEFAULT_WAITLIST_CAPACITY,
        }
    }
}
