//! Integration tests for the submission repository and list query.
//!
//! Exercises the persistence layer against a real database:
//! - Atomic create with artist upsert-by-email
//! - Rollback when a track insert fails
//! - Search / filter / date / status predicates
//! - Sorting and pagination
//! - Status updates and joined reviews

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use intake_core::query::{
    PageRequest, QueryMode, Sort, SortKey, SortOrder, SubmissionFilter, SubmissionQuery,
};
use intake_core::submission::{NewArtist, NewSubmission, NewTrack, SubmissionStatus};
use intake_core::types::DbId;
use intake_db::models::review::CreateReview;
use intake_db::models::user::CreateUser;
use intake_db::repositories::{ArtistRepo, EmailTemplateRepo, ReviewRepo, SubmissionRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn artist(name: &str, email: &str) -> NewArtist {
    NewArtist {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        instagram: None,
        soundcloud: None,
        spotify: None,
        bio: None,
    }
}

fn track(title: &str, genre: Option<&str>) -> NewTrack {
    NewTrack {
        title: title.to_string(),
        genre: genre.map(str::to_string),
        bpm: Some(124),
        musical_key: None,
        description: None,
        file_url: format!("https://media.example.com/{title}.mp3"),
        stream_url: None,
        public_id: format!("demos/{title}"),
        file_type: "audio/mp3".to_string(),
        file_size: 4_200_000,
        duration: Some(215.5),
    }
}

fn submission(name: &str, email: &str, tracks: Vec<NewTrack>) -> NewSubmission {
    NewSubmission {
        artist: artist(name, email),
        tracks,
    }
}

async fn seed(pool: &PgPool, name: &str, email: &str, tracks: Vec<NewTrack>) -> DbId {
    SubmissionRepo::create(pool, &submission(name, email, tracks))
        .await
        .unwrap()
        .id
}

async fn set_submitted_at(pool: &PgPool, id: DbId, at: chrono::DateTime<Utc>) {
    sqlx::query("UPDATE submissions SET submitted_at = $2 WHERE id = $1")
        .bind(id)
        .bind(at)
        .execute(pool)
        .await
        .unwrap();
}

async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*)::BIGINT FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

fn query_with(mode: QueryMode) -> SubmissionQuery {
    SubmissionQuery {
        filter: SubmissionFilter {
            mode,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn ids(details: &[intake_db::models::submission::SubmissionDetail]) -> Vec<DbId> {
    let mut ids: Vec<DbId> = details.iter().map(|d| d.id).collect();
    ids.sort();
    ids
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_returns_pending_submission_with_tracks(pool: PgPool) {
    let input = submission(
        "Jane Doe",
        "jane@example.com",
        vec![track("Nightfall", Some("Techno")), track("Dawn", None)],
    );
    let detail = SubmissionRepo::create(&pool, &input).await.unwrap();

    assert_eq!(detail.status, SubmissionStatus::Pending);
    assert_eq!(detail.artist.email, "jane@example.com");
    assert_eq!(detail.tracks.len(), 2);
    assert_eq!(detail.tracks[0].title, "Nightfall");
    assert_eq!(detail.tracks[1].title, "Dawn");
    assert!(detail.reviews.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn created_detail_matches_a_fresh_read(pool: PgPool) {
    let mut input = submission(
        "Jane Doe",
        "jane@example.com",
        vec![track("Nightfall", Some("Techno")), track("Dawn", None)],
    );
    input.artist.bio = Some("Producer".into());

    let created = SubmissionRepo::create(&pool, &input).await.unwrap();
    let stored = SubmissionRepo::find_by_id(&pool, created.id)
        .await
        .unwrap()
        .expect("row should exist after commit");

    assert_eq!(created, stored);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_email_upserts_a_single_artist(pool: PgPool) {
    let mut first = submission("Jane", "jane@example.com", vec![track("One", None)]);
    first.artist.instagram = Some("https://instagram.com/jane".into());
    SubmissionRepo::create(&pool, &first).await.unwrap();

    let second = submission("Jane Doe", "jane@example.com", vec![track("Two", None)]);
    let detail = SubmissionRepo::create(&pool, &second).await.unwrap();

    assert_eq!(count_rows(&pool, "artists").await, 1);
    assert_eq!(count_rows(&pool, "submissions").await, 2);

    let artist = ArtistRepo::find_by_email(&pool, "jane@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(artist.id, detail.artist.id);
    assert_eq!(artist.name, "Jane Doe");
    // Absent optional fields do not erase what was stored before.
    assert_eq!(artist.instagram.as_deref(), Some("https://instagram.com/jane"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_track_insert_rolls_back_everything(pool: PgPool) {
    let mut bad = track("Too Fast", None);
    bad.bpm = Some(999);
    let input = submission("Jane", "jane@example.com", vec![track("Ok", None), bad]);

    let err = SubmissionRepo::create(&pool, &input).await.unwrap_err();
    assert_matches!(err, sqlx::Error::Database(_));

    assert_eq!(count_rows(&pool, "artists").await, 0);
    assert_eq!(count_rows(&pool, "submissions").await, 0);
    assert_eq!(count_rows(&pool, "tracks").await, 0);
}

// ---------------------------------------------------------------------------
// List: search and filter
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_with_genre_narrows_only_the_track_branch(pool: PgPool) {
    let by_name = seed(&pool, "Jane Doe", "jd@example.com", vec![track("Loop", Some("House"))]).await;
    let by_email = seed(&pool, "DJ X", "jane.x@example.com", vec![track("Pulse", None)]).await;
    let by_track = seed(&pool, "Bob", "bob@example.com", vec![track("Jane's Theme", Some("Techno"))]).await;
    let _wrong_genre = seed(&pool, "Carl", "carl@example.com", vec![track("Jane Again", Some("Ambient"))]).await;
    let _unrelated = seed(&pool, "Dana", "dana@example.com", vec![track("Other", Some("Techno"))]).await;

    let q = query_with(QueryMode::Search {
        term: "jane".into(),
        genre: Some("techno".into()),
    });
    let (items, total) = SubmissionRepo::list(&pool, &q).await.unwrap();

    let mut expected = vec![by_name, by_email, by_track];
    expected.sort();
    assert_eq!(ids(&items), expected);
    assert_eq!(total, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_without_genre_matches_any_track_title(pool: PgPool) {
    let a = seed(&pool, "Carl", "carl@example.com", vec![track("Jane Again", Some("Ambient"))]).await;
    let _b = seed(&pool, "Dana", "dana@example.com", vec![track("Other", None)]).await;

    let q = query_with(QueryMode::Search {
        term: "JANE".into(),
        genre: None,
    });
    let (items, total) = SubmissionRepo::list(&pool, &q).await.unwrap();
    assert_eq!(ids(&items), vec![a]);
    assert_eq!(total, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn filter_mode_requires_name_and_genre(pool: PgPool) {
    let hit = seed(&pool, "Jane Doe", "jd@example.com", vec![track("A", Some("Deep House"))]).await;
    let _name_only = seed(&pool, "Jane Roe", "jr@example.com", vec![track("B", Some("Techno"))]).await;
    let _genre_only = seed(&pool, "Bob", "bob@example.com", vec![track("C", Some("House"))]).await;

    let q = query_with(QueryMode::Filter {
        artist_name: Some("jane".into()),
        genre: Some("house".into()),
    });
    let (items, total) = SubmissionRepo::list(&pool, &q).await.unwrap();
    assert_eq!(ids(&items), vec![hit]);
    assert_eq!(total, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn like_metacharacters_match_literally(pool: PgPool) {
    let literal = seed(&pool, "100% Pure", "pure@example.com", vec![track("A", None)]).await;
    let _other = seed(&pool, "1000 Pure", "k@example.com", vec![track("B", None)]).await;

    let q = query_with(QueryMode::Filter {
        artist_name: Some("100%".into()),
        genre: None,
    });
    let (items, _) = SubmissionRepo::list(&pool, &q).await.unwrap();
    assert_eq!(ids(&items), vec![literal]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_and_date_range_are_anded(pool: PgPool) {
    let early = seed(&pool, "A", "a@example.com", vec![track("A", None)]).await;
    let inside = seed(&pool, "B", "b@example.com", vec![track("B", None)]).await;
    let inside_other_status = seed(&pool, "C", "c@example.com", vec![track("C", None)]).await;

    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    set_submitted_at(&pool, early, base - Duration::days(10)).await;
    set_submitted_at(&pool, inside, base).await;
    set_submitted_at(&pool, inside_other_status, base).await;

    SubmissionRepo::update_status(&pool, inside, SubmissionStatus::InReview)
        .await
        .unwrap();

    let q = SubmissionQuery {
        filter: SubmissionFilter {
            status: Some(SubmissionStatus::InReview),
            submitted_from: Some(base - Duration::days(1)),
            submitted_to: Some(base),
            mode: QueryMode::default(),
        },
        ..Default::default()
    };
    let (items, total) = SubmissionRepo::list(&pool, &q).await.unwrap();
    assert_eq!(ids(&items), vec![inside]);
    assert_eq!(total, 1);

    // Either bound alone works, and both bounds are inclusive.
    let q = SubmissionQuery {
        filter: SubmissionFilter {
            submitted_to: Some(base - Duration::days(10)),
            ..Default::default()
        },
        ..Default::default()
    };
    let (items, _) = SubmissionRepo::list(&pool, &q).await.unwrap();
    assert_eq!(ids(&items), vec![early]);
}

// ---------------------------------------------------------------------------
// List: sorting and pagination
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn pages_partition_the_result_set(pool: PgPool) {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut created = Vec::new();
    for i in 0..5 {
        let id = seed(&pool, &format!("Artist {i}"), &format!("a{i}@example.com"), vec![track("T", None)]).await;
        set_submitted_at(&pool, id, base + Duration::hours(i)).await;
        created.push(id);
    }

    let mut seen = Vec::new();
    for page in 1..=3 {
        let q = SubmissionQuery {
            page: PageRequest::new(page, 2),
            ..Default::default()
        };
        let (items, total) = SubmissionRepo::list(&pool, &q).await.unwrap();
        assert_eq!(total, 5);
        seen.extend(items.iter().map(|d| d.id));
    }

    // Default sort is newest first.
    created.reverse();
    assert_eq!(seen, created);

    let q = SubmissionQuery {
        page: PageRequest::new(4, 2),
        ..Default::default()
    };
    let (items, total) = SubmissionRepo::list(&pool, &q).await.unwrap();
    assert!(items.is_empty());
    assert_eq!(total, 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sorts_by_artist_name_and_status(pool: PgPool) {
    let c = seed(&pool, "Charlie", "c@example.com", vec![track("T", None)]).await;
    let a = seed(&pool, "Alice", "a@example.com", vec![track("T", None)]).await;
    let b = seed(&pool, "Bob", "b@example.com", vec![track("T", None)]).await;

    let q = SubmissionQuery {
        sort: Sort {
            sort_by: SortKey::ArtistName,
            sort_order: SortOrder::Asc,
        },
        ..Default::default()
    };
    let (items, _) = SubmissionRepo::list(&pool, &q).await.unwrap();
    let order: Vec<DbId> = items.iter().map(|d| d.id).collect();
    assert_eq!(order, vec![a, b, c]);

    SubmissionRepo::update_status(&pool, a, SubmissionStatus::Rejected).await.unwrap();
    SubmissionRepo::update_status(&pool, b, SubmissionStatus::Approved).await.unwrap();

    let q = SubmissionQuery {
        sort: Sort {
            sort_by: SortKey::Status,
            sort_order: SortOrder::Asc,
        },
        ..Default::default()
    };
    let (items, _) = SubmissionRepo::list(&pool, &q).await.unwrap();
    let statuses: Vec<SubmissionStatus> = items.iter().map(|d| d.status).collect();
    assert_eq!(
        statuses,
        vec![
            SubmissionStatus::Pending,
            SubmissionStatus::Approved,
            SubmissionStatus::Rejected
        ]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn identical_list_calls_return_identical_results(pool: PgPool) {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    for i in 0..4 {
        let id = seed(&pool, "Same Name", &format!("s{i}@example.com"), vec![track("T", None)]).await;
        set_submitted_at(&pool, id, base).await;
    }

    let q = SubmissionQuery {
        sort: Sort {
            sort_by: SortKey::ArtistName,
            sort_order: SortOrder::Desc,
        },
        page: PageRequest::new(1, 3),
        ..Default::default()
    };
    let first = SubmissionRepo::list(&pool, &q).await.unwrap();
    let second = SubmissionRepo::list(&pool, &q).await.unwrap();
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Status updates and reviews
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_status_allows_any_transition(pool: PgPool) {
    let id = seed(&pool, "Jane", "jane@example.com", vec![track("T", None)]).await;

    let approved = SubmissionRepo::update_status(&pool, id, SubmissionStatus::Approved)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approved.status, SubmissionStatus::Approved);

    let back = SubmissionRepo::update_status(&pool, id, SubmissionStatus::Pending)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(back.status, SubmissionStatus::Pending);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_status_of_missing_submission_is_none(pool: PgPool) {
    let result = SubmissionRepo::update_status(&pool, 9_999, SubmissionStatus::Approved)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reviews_are_joined_with_reviewer(pool: PgPool) {
    let id = seed(&pool, "Jane", "jane@example.com", vec![track("T", None)]).await;
    let reviewer = UserRepo::create(
        &pool,
        &CreateUser {
            name: "Rita Reviewer".into(),
            email: "rita@label.example".into(),
            password_hash: "not-a-real-hash".into(),
            role: "reviewer".into(),
        },
    )
    .await
    .unwrap();

    ReviewRepo::create(
        &pool,
        &CreateReview {
            submission_id: id,
            reviewer_id: reviewer.id,
            grade: Some(8),
            feedback: "Strong groove.".into(),
            internal_notes: Some("Sign for the summer EP".into()),
        },
    )
    .await
    .unwrap();

    let detail = SubmissionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(detail.reviews.len(), 1);
    assert_eq!(detail.reviews[0].reviewer.name, "Rita Reviewer");
    assert_eq!(detail.reviews[0].grade, Some(8));

    let latest = ReviewRepo::latest_for_submission(&pool, id).await.unwrap().unwrap();
    assert_eq!(latest.feedback, "Strong groove.");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn seeded_email_templates_exist(pool: PgPool) {
    for name in [
        "submission_confirmation",
        "submission_approved",
        "submission_rejected",
    ] {
        let template = EmailTemplateRepo::find_by_name(&pool, name).await.unwrap();
        assert!(template.is_some(), "missing template {name}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn templates_list_alphabetically(pool: PgPool) {
    let names: Vec<String> = EmailTemplateRepo::list(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(
        names,
        [
            "submission_approved",
            "submission_confirmation",
            "submission_rejected"
        ]
    );
}
