//! Parameters for composed post listings.
//!
//! Repositories receive a [`PostQuery`] and return a [`Page`]. Ordering is
//! always `pub_date` descending with `id` descending as tie-break; every
//! row carries its comment count and joined author/category/location.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::DomainError;

pub const POSTS_PER_PAGE: i64 = 10;
pub const COMMENTS_PER_PAGE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Category(i64),
    Author(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only posts passing the public visibility rule at `now`.
    Public { now: DateTime<Utc> },
    /// Owner view: drafts and scheduled posts included.
    Unrestricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(number: i64, size: i64) -> Self {
        Self { number, size }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }

    pub fn num_pages(&self, total: i64) -> i64 {
        if total == 0 {
            1
        } else {
            (total + self.size - 1) / self.size
        }
    }

    /// Page 1 always exists, even for an empty listing.
    pub fn check_within(&self, total: i64) -> Result<(), DomainError> {
        if self.number < 1 || self.number > self.num_pages(total) {
            return Err(DomainError::PageNotFound);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub scope: PostScope,
    pub visibility: Visibility,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub num_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let num_pages = request.num_pages(total);
        Self {
            items,
            page: request.number,
            per_page: request.size,
            total,
            num_pages,
            has_next: request.number < num_pages,
            has_previous: request.number > 1,
        }
    }

    /// Slices an already ordered, fully materialized listing.
    pub fn slice(all: Vec<T>, request: PageRequest) -> Result<Self, DomainError> {
        let total = all.len() as i64;
        request.check_within(total)?;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size as usize)
            .collect();
        Ok(Self::new(items, request, total))
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            num_pages: self.num_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
