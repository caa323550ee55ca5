use chrono::NaiveDate;

use crate::content::ContentKind;
use crate::ids::ContentId;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Read-side listing criteria. Every field is optional; absent fields
/// do not constrain the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CatalogFilter {
    pub kind: Option<ContentKind>,
    pub genre: Option<String>,
    pub country: Option<String>,
    pub year: Option<i32>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl CatalogFilter {
    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogItem {
    pub id: ContentId,
    pub external_id: String,
    pub kind: ContentKind,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub poster: Option<String>,
    pub quality: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

impl CatalogPage {
    pub fn new(items: Vec<CatalogItem>, total: u64, filter: &CatalogFilter) -> Self {
        let limit = u64::from(filter.limit());
        let total_pages = u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX);
        Self {
            items,
            total,
            page: filter.page(),
            total_pages,
        }
    }
}
