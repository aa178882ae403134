//! Submission list query model: filters, query mode, sort, and pagination.
//!
//! Free-text search and the discrete artist/genre filters are mutually
//! exclusive, expressed as the tagged [`QueryMode`]. The persistence layer
//! turns a [`SubmissionQuery`] into SQL; everything here is pure.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::submission::SubmissionStatus;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default page number when none is requested.
pub const DEFAULT_PAGE: i64 = 1;

/// Default number of submissions per page.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum number of submissions per page.
pub const MAX_PAGE_SIZE: i64 = 100;

// ---------------------------------------------------------------------------
// Query mode
// ---------------------------------------------------------------------------

/// How the text-ish parameters of a list request are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMode {
    /// Free-text search over artist name, artist email, and track titles.
    ///
    /// A genre narrows the track-title branch to tracks whose genre also
    /// matches; it never filters on its own.
    Search { term: String, genre: Option<String> },
    /// Independent containment filters, ANDed together.
    Filter {
        artist_name: Option<String>,
        genre: Option<String>,
    },
}

impl QueryMode {
    /// Pick the mode: any non-blank `search` wins and `artist_name` is dropped.
    pub fn from_params(
        search: Option<String>,
        artist_name: Option<String>,
        genre: Option<String>,
    ) -> Self {
        let genre = non_blank(genre);
        match non_blank(search) {
            Some(term) => QueryMode::Search { term, genre },
            None => QueryMode::Filter {
                artist_name: non_blank(artist_name),
                genre,
            },
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, QueryMode::Search { .. })
    }
}

impl Default for QueryMode {
    fn default() -> Self {
        QueryMode::Filter {
            artist_name: None,
            genre: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Filter predicate shared by the page query and the count query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionFilter {
    pub status: Option<SubmissionStatus>,
    /// Inclusive lower bound on `submitted_at`.
    pub submitted_from: Option<Timestamp>,
    /// Inclusive upper bound on `submitted_at`.
    pub submitted_to: Option<Timestamp>,
    pub mode: QueryMode,
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    SubmittedAt,
    Status,
    ArtistName,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::SubmittedAt => "submittedAt",
            SortKey::Status => "status",
            SortKey::ArtistName => "artistName",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Sort key plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sort {
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl Sort {
    /// Newest submissions first.
    pub const DEFAULT: Sort = Sort {
        sort_by: SortKey::SubmittedAt,
        sort_order: SortOrder::Desc,
    };

    /// Parse request parameters.
    ///
    /// An unknown sort key falls back to [`Sort::DEFAULT`] regardless of the
    /// requested direction. A missing or unknown direction means descending.
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let order = match sort_order.map(str::trim) {
            Some(o) if o.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };

        let key = match sort_by.map(str::trim).filter(|s| !s.is_empty()) {
            None | Some("submittedAt") => SortKey::SubmittedAt,
            Some("status") => SortKey::Status,
            Some("artistName") => SortKey::ArtistName,
            Some(_) => return Sort::DEFAULT,
        };

        Sort {
            sort_by: key,
            sort_order: order,
        }
    }
}

impl Default for Sort {
    fn default() -> Self {
        Sort::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// A 1-based page request. Both fields are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    /// Build a page request, clamping `page` to >= 1 and `page_size` to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Build from optional request values, applying the defaults.
    pub fn from_params(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self::new(
            page.unwrap_or(DEFAULT_PAGE),
            page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Number of rows to skip: `(page - 1) * page_size`.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    /// Derive metadata for `page` given the predicate's total row count.
    ///
    /// A page past the end is not an error; it simply reports
    /// `has_next_page = false`.
    pub fn compute(page: PageRequest, total_count: i64) -> Self {
        let total_count = total_count.max(0);
        let total_pages = (total_count + page.page_size - 1) / page.page_size;
        Self {
            page: page.page,
            page_size: page.page_size,
            total_count,
            total_pages,
            has_next_page: page.page < total_pages,
            has_previous_page: page.page > 1,
        }
    }
}

/// A complete list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionQuery {
    pub filter: SubmissionFilter,
    pub sort: Sort,
    pub page: PageRequest,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Escape `LIKE` metacharacters so user input matches literally.
///
/// Intended for patterns used with `ESCAPE '\'`.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build a case-insensitive containment pattern (`%term%`) for `ILIKE`.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// Which end of a date range a bound is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

/// Parse a date-range bound.
///
/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain date
/// means the start of that day (UTC) for [`DateBound::Start`] and the last
/// microsecond of that day for [`DateBound::End`], so both bounds include
/// the whole named day.
pub fn parse_date_bound(value: &str, bound: DateBound) -> Result<Timestamp, CoreError> {
    let value = value.trim();

    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CoreError::Validation(format!("Invalid date '{value}'")))?;

    let time = match bound {
        DateBound::Start => NaiveTime::MIN,
        DateBound::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
            .ok_or_else(|| CoreError::Internal("invalid end-of-day time".into()))?,
    };

    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

// ---------------------------------------------------------------------------
// Request parameters
// ---------------------------------------------------------------------------

/// Raw list parameters as they appear in the query string.
///
/// Everything is a string so that malformed numbers degrade to defaults
/// instead of failing extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmissionListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

/// The filters that were actually applied, echoed back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub status: Option<SubmissionStatus>,
    pub artist_name: Option<String>,
    pub genre: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub search: Option<String>,
}

impl SubmissionListParams {
    /// Turn request parameters into a [`SubmissionQuery`].
    ///
    /// A missing or unparseable page becomes 1 and page size becomes the
    /// default; an unknown status is ignored. Only an unparseable date is
    /// an error.
    pub fn to_query(&self) -> Result<(SubmissionQuery, AppliedFilters), CoreError> {
        let page = parse_positive(&self.page);
        let page_size = parse_positive(&self.page_size);

        let status = non_blank(self.status.clone()).and_then(|s| s.parse().ok());

        let from_date = non_blank(self.from_date.clone());
        let to_date = non_blank(self.to_date.clone());
        let submitted_from = from_date
            .as_deref()
            .map(|v| parse_date_bound(v, DateBound::Start))
            .transpose()?;
        let submitted_to = to_date
            .as_deref()
            .map(|v| parse_date_bound(v, DateBound::End))
            .transpose()?;

        let mode = QueryMode::from_params(
            self.search.clone(),
            self.artist_name.clone(),
            self.genre.clone(),
        );

        let applied = match &mode {
            QueryMode::Search { term, genre } => AppliedFilters {
                status,
                artist_name: None,
                genre: genre.clone(),
                from_date,
                to_date,
                search: Some(term.clone()),
            },
            QueryMode::Filter { artist_name, genre } => AppliedFilters {
                status,
                artist_name: artist_name.clone(),
                genre: genre.clone(),
                from_date,
                to_date,
                search: None,
            },
        };

        let query = SubmissionQuery {
            filter: SubmissionFilter {
                status,
                submitted_from,
                submitted_to,
                mode,
            },
            sort: Sort::parse(self.sort_by.as_deref(), self.sort_order.as_deref()),
            page: PageRequest::from_params(page, page_size),
        };
        Ok((query, applied))
    }
}

fn parse_positive(value: &Option<String>) -> Option<i64> {
    value
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
