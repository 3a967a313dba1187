use thiserror::Error;

/// Why a page request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("page number must be positive")]
    PageNum,
    #[error("page size must be positive")]
    PageSize,
    #[error("page is out of range")]
    Overflow,
}

/// A validated, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_num: i64,
    page_size: i64,
    offset: i64,
}

impl Pagination {
    pub const DEFAULT_PAGE_NUM: i64 = 1;
    pub const DEFAULT_PAGE_SIZE: i64 = 10;

    /// Check the request and work out where the page starts.
    pub fn new(page_num: i64, page_size: i64) -> Result<Self, PaginationError> {
        if page_num <= 0 {
            return Err(PaginationError::PageNum);
        }
        if page_size <= 0 {
            return Err(PaginationError::PageSize);
        }
        let offset = (page_num - 1)
            .checked_mul(page_size)
            .ok_or(PaginationError::Overflow)?;
        Ok(Self {
            page_num,
            page_size,
            offset,
        })
    }

    pub fn page_num(&self) -> i64 {
        self.page_num
    }

    /// Maximum number of rows on the page.
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Number of rows before the page.
    pub fn offset(&self) -> i64 {
        self.offset
    }
}
