//! SQL construction for the admin submission list.
//!
//! The page query and the count query share one predicate built by
//! [`build_submission_filter`], so `totalCount` always describes the same
//! row set the page is cut from.

use intake_core::query::{contains_pattern, QueryMode, Sort, SortKey, SortOrder, SubmissionFilter};
use intake_core::submission::SubmissionStatus;
use intake_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::submission::SubmissionRow;

/// Submission columns plus the artist columns `SubmissionRow` expects.
pub(crate) const ROW_COLUMNS: &str = "\
    s.id, s.artist_id, s.status, s.submitted_at, s.updated_at, \
    a.name AS artist_name, a.email AS artist_email, a.phone AS artist_phone, \
    a.instagram AS artist_instagram, a.soundcloud AS artist_soundcloud, \
    a.spotify AS artist_spotify, a.bio AS artist_bio, \
    a.created_at AS artist_created_at, a.updated_at AS artist_updated_at";

pub(crate) const FROM_CLAUSE: &str = "FROM submissions s JOIN artists a ON a.id = s.artist_id";

/// A value bound to a positional parameter of the list predicate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BindValue {
    Text(String),
    Timestamp(Timestamp),
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetch one page of joined submission rows.
pub(crate) async fn fetch_page(
    pool: &PgPool,
    filter: &SubmissionFilter,
    sort: &Sort,
    limit: i64,
    offset: i64,
) -> Result<Vec<SubmissionRow>, sqlx::Error> {
    let (where_clause, bind_values, bind_idx) = build_submission_filter(filter);
    let order_by = order_by_clause(sort);

    let query = format!(
        "SELECT {ROW_COLUMNS} {FROM_CLAUSE} {where_clause} \
         ORDER BY {order_by} \
         LIMIT ${bind_idx} OFFSET ${}",
        bind_idx + 1
    );

    let q = bind_values_as(sqlx::query_as::<_, SubmissionRow>(&query), &bind_values);
    q.bind(limit).bind(offset).fetch_all(pool).await
}

/// Count rows matching the filter.
pub(crate) async fn count(pool: &PgPool, filter: &SubmissionFilter) -> Result<i64, sqlx::Error> {
    let (where_clause, bind_values, _) = build_submission_filter(filter);

    let query = format!("SELECT COUNT(*)::BIGINT AS count {FROM_CLAUSE} {where_clause}");

    let q = bind_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
    q.fetch_one(pool).await
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// Build the WHERE clause for a filter.
///
/// Returns `(where_clause, bind_values, next_bind_idx)`. The clause is empty
/// when the filter has no conditions.
pub(crate) fn build_submission_filter(filter: &SubmissionFilter) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(status) = filter.status {
        conditions.push(format!("s.status = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(status.as_str().to_string()));
    }

    if let Some(from) = filter.submitted_from {
        conditions.push(format!("s.submitted_at >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = filter.submitted_to {
        conditions.push(format!("s.submitted_at <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    match &filter.mode {
        QueryMode::Search { term, genre } => {
            let term_idx = bind_idx;
            bind_idx += 1;
            bind_values.push(BindValue::Text(contains_pattern(term)));

            let mut track_match = format!("t.title ILIKE ${term_idx} ESCAPE '\\'");
            if let Some(genre) = genre {
                track_match.push_str(&format!(" AND t.genre ILIKE ${bind_idx} ESCAPE '\\'"));
                bind_idx += 1;
                bind_values.push(BindValue::Text(contains_pattern(genre)));
            }

            conditions.push(format!(
                "(a.name ILIKE ${term_idx} ESCAPE '\\' \
                 OR a.email ILIKE ${term_idx} ESCAPE '\\' \
                 OR EXISTS (SELECT 1 FROM tracks t WHERE t.submission_id = s.id AND {track_match}))"
            ));
        }
        QueryMode::Filter { artist_name, genre } => {
            if let Some(name) = artist_name {
                conditions.push(format!("a.name ILIKE ${bind_idx} ESCAPE '\\'"));
                bind_idx += 1;
                bind_values.push(BindValue::Text(contains_pattern(name)));
            }
            if let Some(genre) = genre {
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM tracks t WHERE t.submission_id = s.id \
                     AND t.genre ILIKE ${bind_idx} ESCAPE '\\')"
                ));
                bind_idx += 1;
                bind_values.push(BindValue::Text(contains_pattern(genre)));
            }
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Build the ORDER BY expression. `s.id` breaks ties so paging is stable.
pub(crate) fn order_by_clause(sort: &Sort) -> String {
    let dir = match sort.sort_order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let key = match sort.sort_by {
        SortKey::SubmittedAt => "s.submitted_at".to_string(),
        SortKey::ArtistName => "a.name".to_string(),
        SortKey::Status => status_rank_expr(),
    };
    format!("{key} {dir}, s.id {dir}")
}

/// `CASE` expression ranking statuses in lifecycle order.
fn status_rank_expr() -> String {
    let arms: String = SubmissionStatus::ALL
        .iter()
        .enumerate()
        .map(|(rank, status)| format!(" WHEN '{}' THEN {rank}", status.as_str()))
        .collect();
    format!("CASE s.status{arms} END")
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_values_as<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
