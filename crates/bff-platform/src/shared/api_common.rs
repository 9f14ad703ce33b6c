//! Common API types and utilities

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::shared::error::{BffError, Result};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 5000;

pub(crate) mod string_or_number {
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize_u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNum {
            Num(u32),
            Str(String),
        }

        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Num(n)) => Ok(Some(n)),
            Some(StringOrNum::Str(s)) if s.trim().is_empty() => Ok(None),
            Some(StringOrNum::Str(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Pagination parameters: 1-based `page`, `pageSize` up to 5000
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page index (default 1)
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    #[param(minimum = 1)]
    page: Option<u32>,
    /// Items per page (default 10, max 5000)
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    #[param(minimum = 1, maximum = 5000)]
    page_size: Option<u32>,
}

impl PaginationParams {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Reject values outside the documented bounds
    pub fn validated(self) -> Result<Self> {
        if self.page() < 1 {
            return Err(BffError::validation("page must be greater than or equal to 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size()) {
            return Err(BffError::validation(format!(
                "pageSize must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(self)
    }

    /// Zero-based offset of the first item of the page
    pub fn offset(&self) -> u64 {
        (self.page().saturating_sub(1) as u64) * (self.page_size() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), 10);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset_for_third_page() {
        let params = PaginationParams::new(3, 30);
        assert_eq!(params.offset(), 60);
    }

    #[test]
    fn test_string_values_are_accepted() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page":"2","pageSize":"25"}"#).unwrap();
        assert_eq!(params.page(), 2);
        assert_eq!(params.page_size(), 25);
    }

    #[test]
    fn test_bounds() {
        assert!(PaginationParams::new(0, 10).validated().is_err());
        assert!(PaginationParams::new(1, 0).validated().is_err());
        assert!(PaginationParams::new(1, 5001).validated().is_err());
        assert!(PaginationParams::new(1, 5000).validated().is_ok());
    }
}
