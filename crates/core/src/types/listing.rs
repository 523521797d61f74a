//! Listing query and paginated result types.

use core::fmt;

use serde::Serialize;

/// Columns a patient listing may be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    /// Sort by full name (case-insensitive).
    FullName,
    /// Sort by email (case-insensitive).
    Email,
    /// Sort by registration time.
    #[default]
    CreatedAt,
}

impl SortField {
    /// Parse a client-supplied sort key.
    ///
    /// Unknown or missing keys fall back to [`SortField::CreatedAt`].
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            Some("fullName") => Self::FullName,
            Some("email") => Self::Email,
            _ => Self::CreatedAt,
        }
    }

    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::CreatedAt => "createdAt",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse `ASC`/`DESC` case-insensitively; anything else is `Desc`.
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    /// SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    limit: u32,
    offset: u32,
    search: Option<String>,
    sort_by: SortField,
    order: SortOrder,
}

/// Errors building a [`ListQuery`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListQueryError {
    /// The page size is zero.
    #[error("limit must not be less than 1")]
    ZeroLimit,
}

impl ListQuery {
    /// Page size used when the client does not send one.
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Build a listing query.
    ///
    /// An empty `search` means no filter. Any other term, whitespace
    /// included, is matched literally.
    ///
    /// # Errors
    ///
    /// Returns [`ListQueryError::ZeroLimit`] if `limit` is zero.
    pub fn new(
        limit: u32,
        offset: u32,
        search: Option<String>,
        sort_by: SortField,
        order: SortOrder,
    ) -> Result<Self, ListQueryError> {
        if limit == 0 {
            return Err(ListQueryError::ZeroLimit);
        }

        let search = search.filter(|s| !s.is_empty());

        Ok(Self {
            limit,
            offset,
            search,
            sort_by,
            order,
        })
    }

    /// Page size, at least 1.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Substring filter, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Column to order by.
    #[must_use]
    pub const fn sort_by(&self) -> SortField {
        self.sort_by
    }

    /// Sort direction.
    #[must_use]
    pub const fn order(&self) -> SortOrder {
        self.order
    }

    /// Whether `haystack` matches the search term (case-insensitive substring).
    ///
    /// Always true when there is no search term.
    #[must_use]
    pub fn matches(&self, haystack: &str) -> bool {
        self.search.as_deref().is_none_or(|needle| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        })
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
            search: None,
            sort_by: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

/// Escape LIKE wildcards so a term is matched literally (`\` is the escape char).
#[must_use]
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: u64,
    pub item_count: u64,
    pub items_per_page: u32,
    pub total_pages: u64,
    pub current_page: u64,
}

impl PageMeta {
    /// Compute page metadata. `limit` must be non-zero (guaranteed by [`ListQuery`]).
    #[must_use]
    pub fn new(total_items: u64, item_count: u64, limit: u32, offset: u32) -> Self {
        let limit = limit.max(1);
        Self {
            total_items,
            item_count,
            items_per_page: limit,
            total_pages: total_items.div_ceil(u64::from(limit)),
            current_page: u64::from(offset / limit) + 1,
        }
    }
}

/// A page of results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Wrap one page of rows for the given query and total match count.
    #[must_use]
    pub fn new(data: Vec<T>, total_items: u64, query: &ListQuery) -> Self {
        let meta = PageMeta::new(total_items, data.len() as u64, query.limit(), query.offset());
        Self { data, meta }
    }
}
