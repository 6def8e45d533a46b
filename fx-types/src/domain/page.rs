//! Offset pagination for list-shaped responses.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self, DomainError> {
        if page == 0 {
            return Err(DomainError::InvalidPage("page must be at least 1".into()));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(DomainError::InvalidPage(format!(
                "pageSize must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of items to skip: `(page - 1) * page_size`.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of an ordered collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_items: usize,
    pub total_pages: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Skips `request.offset()` items and takes `page_size`. A page beyond the
    /// last one is empty rather than an error.
    pub fn paginate<I>(items: I, request: PageRequest) -> Self
    where
        I: ExactSizeIterator<Item = T>,
    {
        let total_items = items.len();
        let page_size = request.page_size as usize;
        let items = items
            .skip(request.offset())
            .take(page_size)
            .collect::<Vec<_>>();

        Self {
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: total_items.div_ceil(page_size),
            items,
        }
    }
}
