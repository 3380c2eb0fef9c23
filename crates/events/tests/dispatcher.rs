//! Integration tests for the notification dispatcher.
//!
//! Runs the dispatcher against a real database with in-memory mailers:
//! - In-app rows land for the borrower and every other active staff member
//! - Email failures are swallowed and do not stop in-app delivery
//! - The background loop drains the bus and exits when it closes

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use unilib_core::roles::Role;
use unilib_db::models::borrow::Borrow;
use unilib_db::models::user::{CreateUser, UserContact};
use unilib_db::repositories::{NotificationRepo, UserRepo};
use unilib_events::{
    BookRef, EmailError, EventBus, LibraryEvent, Links, Mailer, NotificationDispatcher,
    OutgoingEmail,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), EmailError> {
        Err(EmailError::Build("smtp unavailable".to_string()))
    }
}

async fn create_user(pool: &PgPool, username: &str, role: Role) -> UserContact {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@uni.test"),
            first_name: username.to_string(),
            last_name: "Tester".to_string(),
            university_id: format!("U-{username}"),
            phone: None,
            address: None,
            password_hash: "hash".to_string(),
            role,
        },
    )
    .await
    .unwrap();
    UserContact::from(&user)
}

fn issued(borrower: &UserContact) -> LibraryEvent {
    LibraryEvent::BorrowIssued {
        borrow: Borrow {
            id: 1,
            user_id: borrower.id,
            book_id: 1,
            issued_by: None,
            issue_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 6, 8).unwrap(),
            return_date: None,
            is_returned: false,
            created_at: Utc::now(),
        },
        book: BookRef {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
        },
        borrower: borrower.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_handle_writes_notifications_and_sends_email(pool: PgPool) {
    let admin = create_user(&pool, "admin", Role::Admin).await;
    let student = create_user(&pool, "student", Role::Student).await;

    let mailer = Arc::new(RecordingMailer::default());
    let dispatcher =
        NotificationDispatcher::new(pool.clone(), mailer.clone(), Links::new("http://lib.test"));
    dispatcher.handle(&issued(&student)).await;

    let mine = NotificationRepo::list_for_user(&pool, student.id, false, 10, 0)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].message, "You borrowed 'Dune'");
    assert_eq!(mine[0].notification_type, "BORROW");

    let staff = NotificationRepo::list_for_user(&pool, admin.id, true, 10, 0)
        .await
        .unwrap();
    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0].message, "student Tester borrowed 'Dune'");

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "student@uni.test");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_email_failure_is_swallowed(pool: PgPool) {
    let student = create_user(&pool, "student", Role::Student).await;

    let dispatcher = NotificationDispatcher::new(
        pool.clone(),
        Arc::new(FailingMailer),
        Links::new("http://lib.test"),
    );
    dispatcher.handle(&issued(&student)).await;

    let counts = NotificationRepo::counts(&pool, student.id).await.unwrap();
    assert_eq!(counts.total, 1);
    assert_eq!(counts.unread, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_run_loop_exits_when_bus_closes(pool: PgPool) {
    let student = create_user(&pool, "student", Role::Faculty).await;

    let bus = EventBus::default();
    let receiver = bus.subscribe();
    let dispatcher = NotificationDispatcher::new(
        pool.clone(),
        Arc::new(RecordingMailer::default()),
        Links::new("http://lib.test"),
    );
    let handle = tokio::spawn(dispatcher.run(receiver));

    bus.publish(issued(&student));
    drop(bus);
    handle.await.unwrap();

    let counts = NotificationRepo::counts(&pool, student.id).await.unwrap();
    assert_eq!(counts.total, 1);
}
