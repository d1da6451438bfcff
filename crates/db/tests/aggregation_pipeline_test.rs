//! End-to-end aggregation over the SQLite store: sessions in, summaries out.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use cogtrain_core::{
    round_channel, Aggregator, Domain, DomainOutcome, NewGameSession, OutcomeKind, Period,
    RoundCompleted, SummaryKey,
};
use cogtrain_db::Database;
use pretty_assertions::assert_eq;

fn period() -> Period {
    Period::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
    .unwrap()
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

fn computed_at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, hour, 0, 0).unwrap()
}

async fn play(db: &Database, user: &str, domain: Domain, score: i64, when: DateTime<Utc>) {
    let new = NewGameSession::new(user, domain, score)
        .unwrap()
        .duration(Some(60))
        .unwrap()
        .accuracy(Some(80.0))
        .unwrap()
        .played_at(Some(when));
    db.insert_game_session(&new).await.unwrap();
}

#[tokio::test]
async fn test_compute_persists_every_domain() {
    let db = Database::new_in_memory().await.unwrap();
    play(&db, "u1", Domain::DepthPerception, 10, at(2, 8)).await;
    play(&db, "u1", Domain::DepthPerception, 30, at(3, 8)).await;
    play(&db, "u1", Domain::ProcessingSpeed, 50, at(4, 8)).await;

    let report = Aggregator::new(&db, &db)
        .compute_for_user("u1", period(), computed_at(9))
        .await;

    assert_eq!(report.outcomes[&Domain::DepthPerception].kind(), OutcomeKind::Computed);
    assert_eq!(report.outcomes[&Domain::ProcessingSpeed].kind(), OutcomeKind::Computed);
    assert_eq!(report.outcomes[&Domain::PeripheralVision].kind(), OutcomeKind::Empty);
    assert_eq!(report.outcomes[&Domain::VisualTracking].kind(), OutcomeKind::Empty);

    let depth = db
        .get_domain_performance(&SummaryKey::new("u1", Domain::DepthPerception, period()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(depth.total_sessions, 2);
    assert_eq!(depth.average_score, 20.0);
    assert_eq!(depth.median_score, 20.0);
    assert_eq!(depth.best_score, 30);
    assert_eq!(depth.score_stddev, 10.0);
    assert_eq!(depth.average_accuracy, Some(80.0));
    assert_eq!(depth.total_playtime_seconds, 120);
    assert_eq!(depth.last_played, Some(at(3, 8)));
    assert_eq!(depth.last_updated, computed_at(9));
}

#[tokio::test]
async fn test_empty_domain_row_distinct_from_absent() {
    let db = Database::new_in_memory().await.unwrap();
    let aggregator = Aggregator::new(&db, &db);

    // Never computed: every domain reads as absent.
    let before = aggregator.cached_for_user("u1", period()).await.unwrap();
    assert!(before.values().all(Option::is_none));

    aggregator
        .compute_for_user("u1", period(), computed_at(9))
        .await;

    // Computed with zero sessions: rows exist with zero counts.
    let after = aggregator.cached_for_user("u1", period()).await.unwrap();
    for (domain, row) in after {
        let row = row.unwrap_or_else(|| panic!("{domain} should have a persisted row"));
        assert_eq!(row.total_sessions, 0);
        assert_eq!(row.average_accuracy, None);
        assert_eq!(row.last_played, None);
    }
}

#[tokio::test]
async fn test_recompute_is_idempotent_apart_from_last_updated() {
    let db = Database::new_in_memory().await.unwrap();
    play(&db, "u1", Domain::VisualTracking, 12, at(10, 8)).await;
    play(&db, "u1", Domain::VisualTracking, 18, at(11, 8)).await;
    let aggregator = Aggregator::new(&db, &db);

    let first = aggregator
        .compute_for_user("u1", period(), computed_at(9))
        .await;
    let second = aggregator
        .compute_for_user("u1", period(), computed_at(10))
        .await;

    for domain in Domain::ALL {
        let a = first.outcomes[&domain].summary().unwrap();
        let b = second.outcomes[&domain].summary().unwrap();
        assert!(a.same_statistics(b), "{domain} changed between runs");
        assert_eq!(b.last_updated, computed_at(10));
    }

    let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM domain_performance")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(rows.0, 4);
}

#[tokio::test]
async fn test_new_session_reflected_after_recompute() {
    let db = Database::new_in_memory().await.unwrap();
    let aggregator = Aggregator::new(&db, &db);
    play(&db, "u1", Domain::PeripheralVision, 5, at(5, 8)).await;
    aggregator
        .compute_for_user("u1", period(), computed_at(9))
        .await;

    play(&db, "u1", Domain::PeripheralVision, 15, at(6, 8)).await;
    let report = aggregator
        .compute_for_user("u1", period(), computed_at(10))
        .await;

    let summary = report.outcomes[&Domain::PeripheralVision].summary().unwrap();
    assert_eq!(summary.total_sessions, 2);
    assert_eq!(summary.best_score, 15);
}

#[tokio::test]
async fn test_read_is_exact_key_only() {
    let db = Database::new_in_memory().await.unwrap();
    play(&db, "u1", Domain::DepthPerception, 10, at(2, 8)).await;
    let aggregator = Aggregator::new(&db, &db);
    aggregator
        .compute_for_user("u1", period(), computed_at(9))
        .await;

    let narrower = Period::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 30).unwrap(),
    )
    .unwrap();
    let cached = aggregator.cached_for_user("u1", narrower).await.unwrap();
    assert!(cached.values().all(Option::is_none));

    let other_user = aggregator.cached_for_user("u2", period()).await.unwrap();
    assert!(other_user.values().all(Option::is_none));
}

#[tokio::test]
async fn test_concurrent_computes_leave_one_row_per_key() {
    let tmp = tempfile::tempdir().unwrap();
    let db = Database::new(&tmp.path().join("concurrent.db")).await.unwrap();
    for day in 1..=10 {
        play(&db, "u1", Domain::ProcessingSpeed, day as i64 * 3, at(day, 12)).await;
    }

    let runs = (0..6).map(|i| {
        let db = db.clone();
        tokio::spawn(async move {
            Aggregator::new(&db, &db)
                .compute_for_user("u1", period(), computed_at(9 + i))
                .await
        })
    });
    let reports = futures_util::future::join_all(runs).await;
    for report in reports {
        let report = report.unwrap();
        assert!(report.failed_domains().next().is_none());
    }

    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT domain, total_sessions FROM domain_performance ORDER BY domain")
            .fetch_all(db.pool())
            .await
            .unwrap();
    assert_eq!(rows.len(), 4);
    let speed = rows.iter().find(|(d, _)| d == "processing-speed").unwrap();
    assert_eq!(speed.1, 10);
}

#[tokio::test]
async fn test_round_listener_feeds_session_log() {
    let db = Database::new_in_memory().await.unwrap();
    let (emitter, listener) = round_channel(16);
    let listener_db = db.clone();
    let task = tokio::spawn(async move { listener.run(&listener_db).await });

    let first = RoundCompleted::new(
        NewGameSession::new("u1", Domain::VisualTracking, 40)
            .unwrap()
            .played_at(Some(at(20, 8))),
    );
    emitter.emit(first.clone()).await.unwrap();
    emitter.emit(first).await.unwrap();
    emitter
        .emit(RoundCompleted::new(
            NewGameSession::new("u1", Domain::VisualTracking, 60)
                .unwrap()
                .played_at(Some(at(21, 8))),
        ))
        .await
        .unwrap();
    drop(emitter);

    let report = task.await.unwrap();
    assert_eq!(report.forwarded, 2);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.failed, 0);

    let outcome = Aggregator::new(&db, &db)
        .compute_domain(
            SummaryKey::new("u1", Domain::VisualTracking, period()),
            computed_at(9),
        )
        .await;
    match outcome {
        DomainOutcome::Computed(summary) => {
            assert_eq!(summary.total_sessions, 2);
            assert_eq!(summary.average_score, 50.0);
        }
        other => panic!("expected computed outcome, got {other:?}"),
    }
}
