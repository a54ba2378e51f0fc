//! Reminder passes over data created through the HTTP API.
//!
//! Owners, customers and templates go in through the router; the scheduler
//! then runs against the same store with a recording delivery channel.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::watch;

use glamdesk_integration_tests::TestApp;
use glamdesk_server::clock::FixedClock;
use glamdesk_server::config::SmsConfig;
use glamdesk_server::delivery::{RecordingChannel, SentMessage, SmsClient};
use glamdesk_server::reminders::{
    NotificationDispatcher, ReminderScheduler, ReminderSettings, RepeatPolicy,
};
use glamdesk_server::store::MemoryStore;

type Scheduler = ReminderScheduler<MemoryStore, RecordingChannel, FixedClock>;

/// Seven days before the 15th of June.
fn june_8() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 8, 9, 0, 0).unwrap()
}

fn scheduler(app: &TestApp, channel: &RecordingChannel, settings: ReminderSettings) -> Scheduler {
    ReminderScheduler::new(
        app.store.clone(),
        Arc::new(app.cipher.clone()),
        NotificationDispatcher::new(channel.clone()),
        FixedClock::new(june_8()),
        settings,
    )
}

async fn add_customer(app: &TestApp, token: &str, body: Value) {
    let response = app
        .send_json(Method::POST, "/api/customers", &body, Some(token))
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
}

async fn save_template(app: &TestApp, token: &str, event_type: &str, template: &str) {
    let response = app
        .post_form(
            "/api/settings/reminders",
            &[("event_type", event_type), ("template", template)],
            Some(token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
}

fn sent_to<'a>(sent: &'a [SentMessage], destination: &str) -> &'a str {
    &sent
        .iter()
        .find(|m| m.destination == destination)
        .unwrap_or_else(|| panic!("nothing sent to {destination}: {sent:?}"))
        .body
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_list_default_and_saved_templates() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;

    let empty = app.get("/api/settings/reminders", Some(&token)).await;
    assert_eq!(
        empty.body["default_template"],
        "Dear [CustomerName], greetings from [SalonName] on your [Event]!"
    );
    assert_eq!(empty.body["templates"], json!([]));

    save_template(&app, &token, "birthday", "First [CustomerName]").await;
    save_template(&app, &token, "birthday", "Second [CustomerName]").await;

    let listed = app.get("/api/settings/reminders", Some(&token)).await;
    let templates = listed.body["templates"].as_array().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0]["event_type"], "birthday");
    assert_eq!(templates[0]["template"], "Second [CustomerName]");
}

#[tokio::test]
async fn test_settings_reject_unknown_event_and_blank_template() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;

    let unknown = app
        .post_form(
            "/api/settings/reminders",
            &[("event_type", "graduation"), ("template", "Hi")],
            Some(&token),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let blank = app
        .post_form(
            "/api/settings/reminders",
            &[("event_type", "birthday"), ("template", "   ")],
            Some(&token),
        )
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Passes
// ============================================================================

#[tokio::test]
async fn test_pass_uses_each_owners_templates_and_salon() {
    let app = TestApp::new();
    let shear = app.owner_token("owner@shear.test", "Shear Bliss").await;
    let glow = app.owner_token("owner@glow.test", "Glow Studio").await;

    save_template(
        &app,
        &shear,
        "birthday",
        "Hi [CustomerName]! [SalonName] wishes you a happy [Event].",
    )
    .await;

    add_customer(
        &app,
        &shear,
        json!({ "name": "Alice Moreau", "phone": "+1 415 555 0100", "birthday": "1990-06-15" }),
    )
    .await;
    add_customer(
        &app,
        &shear,
        json!({ "name": "Bob Chen", "phone": "+1 415 555 0101", "anniversary": "2010-06-15" }),
    )
    .await;
    add_customer(
        &app,
        &shear,
        json!({ "name": "Carol Diaz", "phone": "+1 415 555 0102", "birthday": "1985-06-16" }),
    )
    .await;
    add_customer(
        &app,
        &glow,
        json!({ "name": "Dana Okafor", "phone": "+44 20 7946 0000", "birthday": "2001-06-15" }),
    )
    .await;

    let channel = RecordingChannel::new();
    let report = scheduler(&app, &channel, ReminderSettings::default())
        .run_pass_at(june_8())
        .await
        .unwrap();

    assert_eq!(report.matched, 3);
    assert_eq!(report.sent, 3);

    let sent = channel.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(
        sent_to(&sent, "+1 415 555 0100"),
        "Hi Alice Moreau! Shear Bliss wishes you a happy birthday."
    );
    assert_eq!(
        sent_to(&sent, "+1 415 555 0101"),
        "Dear Bob Chen, greetings from Shear Bliss on your anniversary!"
    );
    assert_eq!(
        sent_to(&sent, "+44 20 7946 0000"),
        "Dear Dana Okafor, greetings from Glow Studio on your birthday!"
    );
}

#[tokio::test]
async fn test_repeat_policy_controls_second_pass() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;
    add_customer(
        &app,
        &token,
        json!({ "name": "Alice Moreau", "phone": "+1 415 555 0100", "birthday": "1990-06-15" }),
    )
    .await;

    let once = RecordingChannel::new();
    let scheduler_once = scheduler(&app, &once, ReminderSettings::default());
    scheduler_once.run_pass_at(june_8()).await.unwrap();
    let second = scheduler_once.run_pass_at(june_8()).await.unwrap();
    assert_eq!(second.skipped, 1);
    assert_eq!(once.sent().len(), 1);

    let every = RecordingChannel::new();
    let settings = ReminderSettings {
        repeat_policy: RepeatPolicy::EveryTick,
        ..ReminderSettings::default()
    };
    let scheduler_every = scheduler(&app, &every, settings);
    scheduler_every.run_pass_at(june_8()).await.unwrap();
    scheduler_every.run_pass_at(june_8()).await.unwrap();
    assert_eq!(every.sent().len(), 2);
}

#[tokio::test]
async fn test_profile_salon_rename_reaches_next_message() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;
    add_customer(
        &app,
        &token,
        json!({ "name": "Alice Moreau", "phone": "+1 415 555 0100", "birthday": "1990-06-15" }),
    )
    .await;

    let renamed = app
        .post_form(
            "/api/profile",
            &[
                ("name", "Maya Lopez"),
                ("salon_name", "Glow Studio"),
                ("phone", "+14155550123"),
                ("address", "12 Market Street, Springfield"),
            ],
            Some(&token),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);

    let channel = RecordingChannel::new();
    scheduler(&app, &channel, ReminderSettings::default())
        .run_pass_at(june_8())
        .await
        .unwrap();

    assert!(channel.sent()[0].body.contains("Glow Studio"));
}

#[tokio::test]
async fn test_deleted_customer_is_not_notified() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;
    let created = app
        .send_json(
            Method::POST,
            "/api/customers",
            &json!({ "name": "Alice Moreau", "phone": "+1 415 555 0100", "birthday": "1990-06-15" }),
            Some(&token),
        )
        .await;
    let id = created.body["id"].as_i64().unwrap();
    app.delete(&format!("/api/customers/{id}"), Some(&token))
        .await;

    let channel = RecordingChannel::new();
    let report = scheduler(&app, &channel, ReminderSettings::default())
        .run_pass_at(june_8())
        .await
        .unwrap();

    assert_eq!(report.matched, 0);
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn test_unresponsive_sms_provider_fails_sends_but_pass_completes() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;
    for (name, phone) in [("Alice Moreau", "+1 415 555 0100"), ("Bob Chen", "+1 415 555 0101")] {
        add_customer(
            &app,
            &token,
            json!({ "name": name, "phone": phone, "birthday": "1990-06-15" }),
        )
        .await;
    }

    // Accepts connections and never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    let sms = SmsClient::new(&SmsConfig {
        account_sid: "AC123".to_string(),
        auth_token: SecretString::from("tok-abc"),
        from_number: "+15550001111".to_string(),
        api_base: format!("http://{addr}"),
        timeout: Duration::from_millis(200),
    });

    let scheduler = ReminderScheduler::new(
        app.store.clone(),
        Arc::new(app.cipher.clone()),
        NotificationDispatcher::new(sms),
        FixedClock::new(june_8()),
        ReminderSettings::default(),
    );
    let report = tokio::time::timeout(Duration::from_secs(10), scheduler.run_pass_at(june_8()))
        .await
        .expect("pass must not hang on the provider")
        .unwrap();

    assert_eq!(report.matched, 2);
    assert_eq!((report.sent, report.failed), (0, 2));
}

// ============================================================================
// Background loop
// ============================================================================

#[tokio::test]
async fn test_spawned_scheduler_sends_then_stops() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;
    add_customer(
        &app,
        &token,
        json!({ "name": "Alice Moreau", "phone": "+1 415 555 0100", "birthday": "1990-06-15" }),
    )
    .await;

    let channel = RecordingChannel::new();
    let settings = ReminderSettings {
        interval: Duration::from_millis(20),
        ..ReminderSettings::default()
    };
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = scheduler(&app, &channel, settings).spawn(shutdown_rx);

    tokio::time::timeout(Duration::from_secs(5), async {
        while channel.sent().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(channel.sent().len(), 1);
}
