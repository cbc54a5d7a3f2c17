use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::Serialize;

use crate::{Error, error::Result};

pub const MAX_PAGE: u32 = 10_000_000;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Logical sort field to physical column
pub type SortColumns = [(&'static str, &'static str)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    Asc(String),
    Desc(String),
}

impl Order {
    pub fn field(&self) -> &str {
        match self {
            Order::Asc(s) => s.as_str(),
            Order::Desc(s) => s.as_str(),
        }
    }

    /// Renders ORDER BY term, only for fields present in `columns`.
    pub fn sql(&self, columns: &SortColumns) -> Result<String> {
        let column = columns
            .iter()
            .find(|(name, _)| *name == self.field())
            .map(|(_, column)| *column)
            .ok_or_else(|| Error::InvalidOrderByField(self.field().to_string()))?;
        let direction = match self {
            Order::Asc(_) => "ASC",
            Order::Desc(_) => "DESC",
        };
        Ok(format!("{column} {direction}"))
    }
}

impl Default for Order {
    fn default() -> Self {
        Order::Asc("id".to_string())
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Asc(s) => write!(f, "{}", s),
            Order::Desc(s) => write!(f, "-{}", s),
        }
    }
}

impl FromStr for Order {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field_name, descending) = match s.trim() {
            "" => return Err(Error::InvalidOrderByField("empty".to_string())),
            name if name.len() > 100 => {
                return Err(Error::InvalidOrderByField("name too long".to_string()));
            }
            name if name.starts_with('+') => (&name[1..], false),
            name if name.starts_with('-') => (&name[1..], true),
            name => (name, false),
        };
        if field_name.is_empty() {
            return Err(Error::InvalidOrderByField(s.to_string()));
        }

        let order = if descending {
            Order::Desc(field_name.to_string())
        } else {
            Order::Asc(field_name.to_string())
        };
        Ok(order)
    }
}

#[derive(Debug, Clone, Validate)]
#[garde(allow_unvalidated)]
pub struct Filters {
    #[garde(range(min = 1, max = 10_000_000))]
    pub page: u32,
    #[garde(range(min = 1, max = 100))]
    pub page_size: u32,
    pub sort: Order,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Order::default(),
        }
    }
}

impl Filters {
    pub fn new(page: u32, page_size: u32, sort: Order) -> Self {
        Self {
            page,
            page_size,
            sort,
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size.into()
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    /// Checks page bounds and sort field, returns ORDER BY term
    pub fn ordering(&self, columns: &SortColumns) -> Result<String> {
        self.validate()?;
        self.sort.sql(columns)
    }
}

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: u64,
}

impl Metadata {
    pub fn calculate(total_records: u64, page: u32, page_size: u32) -> Self {
        if total_records == 0 || page_size == 0 {
            return Metadata::default();
        }
        let last_page = total_records.div_ceil(u64::from(page_size));
        Metadata {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
            total_records,
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.last_page
    }
}
