//! Host id to domain id mapping, one slot per host.
//!
//! Two backings: a flat `i32` array (4 bytes per host) while the host count
//! fits into a single array, and a paged `i64` array beyond that. The folder
//! is generic over [`IdStore`], so the choice is made once at construction.

use crate::error::{FoldError, Result};

/// Largest host count served by [`FlatIds`].
pub const FLAT_ID_LIMIT: u64 = (i32::MAX - 8) as u64;

const UNMAPPED: i64 = -1;

/// Write-once-per-host storage of assigned domain ids.
pub trait IdStore {
    /// Name used when reporting the configuration.
    const KIND: &'static str;

    /// Largest capacity the store can be allocated with.
    const MAX_CAPACITY: u64;

    /// Allocate storage for hosts `0..capacity`, all unmapped.
    fn with_capacity(capacity: u64) -> Self
    where
        Self: Sized;

    fn capacity(&self) -> u64;

    /// Domain id of a host, `None` if unmapped.
    fn get(&self, host_id: u64) -> Result<Option<u64>>;

    /// Set the domain id of a host, `None` marks it unmapped.
    fn set(&mut self, host_id: u64, domain_id: Option<u64>) -> Result<()>;
}

fn check_capacity(host_id: u64, capacity: u64) -> Result<usize> {
    if host_id >= capacity {
        return Err(FoldError::CapacityExceeded {
            id: host_id,
            capacity,
        });
    }
    usize::try_from(host_id).map_err(|_| FoldError::CapacityExceeded {
        id: host_id,
        capacity,
    })
}

#[derive(Debug, Clone)]
pub struct FlatIds {
    ids: Vec<i32>,
}

impl IdStore for FlatIds {
    const KIND: &'static str = "flat";
    const MAX_CAPACITY: u64 = FLAT_ID_LIMIT;

    fn with_capacity(capacity: u64) -> Self {
        let len = capacity.min(Self::MAX_CAPACITY) as usize;
        Self {
            ids: vec![UNMAPPED as i32; len],
        }
    }

    fn capacity(&self) -> u64 {
        self.ids.len() as u64
    }

    fn get(&self, host_id: u64) -> Result<Option<u64>> {
        let i = check_capacity(host_id, self.capacity())?;
        let value = self.ids[i];
        Ok(u64::try_from(value).ok())
    }

    fn set(&mut self, host_id: u64, domain_id: Option<u64>) -> Result<()> {
        let i = check_capacity(host_id, self.capacity())?;
        self.ids[i] = match domain_id {
            // domain count never exceeds host count
            Some(id) => id as i32,
            None => UNMAPPED as i32,
        };
        Ok(())
    }
}

/// Default page size: 2^27 slots (1 GiB of `i64` per page).
pub const DEFAULT_PAGE_BITS: u32 = 27;

/// Paged array for host counts beyond [`FLAT_ID_LIMIT`].
#[derive(Debug, Clone)]
pub struct PagedIds {
    pages: Vec<Box<[i64]>>,
    page_bits: u32,
    capacity: u64,
}

impl PagedIds {
    pub fn with_page_bits(capacity: u64, page_bits: u32) -> Self {
        let page_size = 1u64 << page_bits;
        let mut pages = Vec::new();
        let mut remaining = capacity;
        while remaining > 0 {
            let len = remaining.min(page_size);
            pages.push(vec![UNMAPPED; len as usize].into_boxed_slice());
            remaining -= len;
        }
        Self {
            pages,
            page_bits,
            capacity,
        }
    }

    fn slot(&self, host_id: u64) -> Result<(usize, usize)> {
        check_capacity(host_id, self.capacity)?;
        let page = (host_id >> self.page_bits) as usize;
        let offset = (host_id & ((1u64 << self.page_bits) - 1)) as usize;
        Ok((page, offset))
    }
}

impl IdStore for PagedIds {
    const KIND: &'static str = "paged";
    const MAX_CAPACITY: u64 = u64::MAX;

    fn with_capacity(capacity: u64) -> Self {
        Self::with_page_bits(capacity, DEFAULT_PAGE_BITS)
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn get(&self, host_id: u64) -> Result<Option<u64>> {
        let (page, offset) = self.slot(host_id)?;
        Ok(u64::try_from(self.pages[page][offset]).ok())
    }

    fn set(&mut self, host_id: u64, domain_id: Option<u64>) -> Result<()> {
        let (page, offset) = self.slot(host_id)?;
        self.pages[page][offset] = match domain_id {
            Some(id) => id as i64,
            None => UNMAPPED,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<S: IdStore>(mut store: S) -> Result<()> {
        let capacity = store.capacity();
        assert_eq!(store.get(0)?, None);
        store.set(0, Some(3))?;
        store.set(capacity - 1, Some(7))?;
        assert_eq!(store.get(0)?, Some(3));
        assert_eq!(store.get(capacity - 1)?, Some(7));
        store.set(0, None)?;
        assert_eq!(store.get(0)?, None);

        assert!(matches!(
            store.get(capacity),
            Err(FoldError::CapacityExceeded { id, .. }) if id == capacity
        ));
        assert!(store.set(capacity + 5, Some(1)).is_err());
        Ok(())
    }

    #[test]
    fn test_flat_ids() -> Result<()> {
        exercise(FlatIds::with_capacity(16))
    }

    #[test]
    fn test_paged_ids_across_pages() -> Result<()> {
        // 4 slots per page, last page partially filled
        let mut store = PagedIds::with_page_bits(10, 2);
        assert_eq!(store.pages.len(), 3);
        for id in 0..10 {
            store.set(id, Some(id * 2))?;
        }
        for id in 0..10 {
            assert_eq!(store.get(id)?, Some(id * 2));
        }
        exercise(PagedIds::with_page_bits(10, 2))
    }

    #[test]
    fn test_paged_ids_large_values() -> Result<()> {
        let mut store = PagedIds::with_page_bits(8, 3);
        let big = u64::from(u32::MAX) + 10;
        store.set(5, Some(big))?;
        assert_eq!(store.get(5)?, Some(big));
        Ok(())
    }
}
