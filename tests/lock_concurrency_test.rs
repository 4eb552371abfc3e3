mod common;

use chrono::{Duration, Utc};
use common::{PolicySeed, TestApp};
use rebook_backend::domain::ports::ControlStore;
use tokio::task::JoinSet;

#[tokio::test]
async fn only_one_contender_wins_a_named_lock() {
    let app = TestApp::new().await;

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let control = app.state.control.clone();
        tasks.spawn(async move { control.try_acquire_lock("nightly_rescore").await.unwrap() });
    }

    let mut winners = 0;
    while let Some(result) = tasks.join_next().await {
        if result.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn released_locks_can_be_reacquired() {
    let app = TestApp::new().await;
    let control = &app.state.control;

    assert!(control.try_acquire_lock("sweep").await.unwrap());
    assert!(!control.try_acquire_lock("sweep").await.unwrap());

    control.release_lock("sweep").await.unwrap();
    assert!(control.try_acquire_lock("sweep").await.unwrap());
}

#[tokio::test]
async fn stale_locks_are_reclaimed() {
    let app = TestApp::new().await;

    // A holder that died without releasing; its TTL has lapsed.
    sqlx::query("INSERT INTO control_entries (key, expires_at) VALUES ('lock:dead_job', ?)")
        .bind(Utc::now() - Duration::minutes(1))
        .execute(&app.pool)
        .await
        .unwrap();

    assert!(app.state.control.try_acquire_lock("dead_job").await.unwrap());
    assert!(!app.state.control.try_acquire_lock("dead_job").await.unwrap());
}

#[tokio::test]
async fn cooldown_entries_expire() {
    let app = TestApp::new().await;
    let control = &app.state.control;

    assert!(!control.is_in_cooldown("cust-1").await.unwrap());
    control.set_cooldown("cust-1", 60).await.unwrap();
    assert!(control.is_in_cooldown("cust-1").await.unwrap());

    sqlx::query("UPDATE control_entries SET expires_at = ? WHERE key = 'cooldown:cust-1'")
        .bind(Utc::now() - Duration::minutes(1))
        .execute(&app.pool)
        .await
        .unwrap();
    assert!(!control.is_in_cooldown("cust-1").await.unwrap());

    // Re-contact refreshes the entry in place.
    control.set_cooldown("cust-1", 60).await.unwrap();
    assert!(control.is_in_cooldown("cust-1").await.unwrap());
}

#[tokio::test]
async fn concurrent_sweeps_expire_each_offer_once() {
    let app = TestApp::new().await;
    app.seed_shop("shop-1", "UTC", 1440, true).await;
    app.seed_policy("shop-1", PolicySeed::default()).await;
    app.seed_customer("cust-src", "shop-1", "+15550000000", false).await;
    app.seed_customer("cust-1", "shop-1", "+15550000001", true).await;

    let start = Utc::now() + Duration::hours(24);
    app.seed_booked_appointment(
        "appt-src",
        "shop-1",
        "cust-src",
        start,
        start + Duration::minutes(60),
        "succeeded",
    )
    .await;
    app.seed_opening("open-1", "shop-1", "appt-src", start, start + Duration::minutes(60), "open")
        .await;
    app.seed_offer("offer-1", "open-1", "cust-1", "sent", Utc::now() - Duration::minutes(5))
        .await;

    let mut tasks = JoinSet::new();
    for _ in 0..2 {
        let recovery = app.state.recovery.clone();
        tasks.spawn(async move { recovery.run_expiry_sweep().await.unwrap() });
    }

    let mut total_expired = 0;
    while let Some(result) = tasks.join_next().await {
        total_expired += result.unwrap().expired;
    }

    assert_eq!(total_expired, 1);
    assert_eq!(app.offer_status("offer-1").await, "expired");
    assert_eq!(app.trigger.triggered.lock().unwrap().len(), 1);
}
