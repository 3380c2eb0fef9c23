//! Integration tests for the lifecycle engine.
//!
//! Exercises issue / return / fine / reservation transitions against a real
//! database:
//! - Copy counts stay within `0..=total` through issue, return and races
//! - Duplicate active borrows conflict; double returns are rejected
//! - Returns promote the oldest pending reservation, one per return
//! - Fine creation and payment are idempotent
//! - Events are published only for transitions that actually happened

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::sync::broadcast;
use unilib_core::catalog::CopyCounts;
use unilib_core::error::CoreError;
use unilib_core::fine::FineStatus;
use unilib_core::reservation::{ReservationStatus, NOT_CANCELLABLE};
use unilib_core::roles::Role;
use unilib_core::types::{Date, DbId};
use unilib_db::models::book::CreateBook;
use unilib_db::models::user::CreateUser;
use unilib_db::repositories::{BookRepo, FineRepo, ReservationRepo, UserRepo};
use unilib_events::{EventBus, LibraryEvent};
use unilib_lifecycle::{
    Actor, IssueRequest, Lifecycle, LifecycleError, ReserveRequest,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    lifecycle: Lifecycle,
    events: broadcast::Receiver<LibraryEvent>,
    librarian: Actor,
    student: Actor,
    faculty: Actor,
}

async fn setup(pool: &PgPool) -> Fixture {
    let bus = Arc::new(EventBus::default());
    let events = bus.subscribe();
    Fixture {
        lifecycle: Lifecycle::new(pool.clone(), bus),
        events,
        librarian: create_user(pool, "libby", Role::Librarian).await,
        student: create_user(pool, "stu", Role::Student).await,
        faculty: create_user(pool, "fac", Role::Faculty).await,
    }
}

async fn create_user(pool: &PgPool, username: &str, role: Role) -> Actor {
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
    Actor::new(user.id, role)
}

async fn create_book(pool: &PgPool, isbn: &str, copies: i32) -> DbId {
    BookRepo::create(
        pool,
        &CreateBook {
            title: format!("Book {isbn}"),
            author: "Ada Author".to_string(),
            isbn: isbn.to_string(),
            publisher: None,
            category_id: None,
            publication_date: None,
            description: None,
            total_copies: copies,
        },
        CopyCounts::new_book(copies).unwrap(),
    )
    .await
    .unwrap()
    .id
}

async fn available(pool: &PgPool, book_id: DbId) -> i32 {
    BookRepo::find_by_id(pool, book_id)
        .await
        .unwrap()
        .unwrap()
        .available_copies
}

fn today() -> Date {
    NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
}

fn days_later(n: i64) -> Date {
    today() + chrono::Duration::days(n)
}

fn self_issue(book_id: DbId) -> IssueRequest {
    IssueRequest {
        book_id,
        borrower_id: None,
        due_date: None,
    }
}

fn drain(rx: &mut broadcast::Receiver<LibraryEvent>) -> Vec<&'static str> {
    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.name());
    }
    names
}

fn core_err(err: LifecycleError) -> CoreError {
    match err {
        LifecycleError::Core(e) => e,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Borrow lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_issue_conflict_and_return_scenario(pool: PgPool) {
    let mut fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000001", 1).await;

    let borrow = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    assert_eq!(available(&pool, book).await, 0);
    assert_eq!(borrow.issued_by, Some(fx.student.id));

    // The faculty member queues up while no copy is on the shelf.
    let reservation = fx
        .lifecycle
        .reserve(
            fx.faculty,
            &ReserveRequest {
                book_id: book,
                user_id: None,
            },
        )
        .await
        .unwrap();

    let err = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap_err();
    assert_matches!(core_err(err), CoreError::Conflict(_));
    assert_eq!(available(&pool, book).await, 0);

    let outcome = fx
        .lifecycle
        .return_borrow(fx.student, borrow.id, days_later(3))
        .await
        .unwrap();
    assert!(outcome.borrow.is_returned);
    assert_eq!(outcome.borrow.return_date, Some(days_later(3)));
    assert_eq!(outcome.fine_status, None);
    assert_eq!(outcome.message, "Book returned successfully!");
    assert_eq!(available(&pool, book).await, 1);

    let promoted = outcome.promoted.expect("pending reservation should be promoted");
    assert_eq!(promoted.id, reservation.id);
    assert_eq!(promoted.status().unwrap(), ReservationStatus::Available);
    assert!(promoted.notified_at.is_some());

    assert_eq!(
        drain(&mut fx.events),
        vec!["borrow.issued", "reservation.created", "borrow.returned"]
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_self_service_cannot_issue_for_others(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000002", 2).await;

    let err = fx
        .lifecycle
        .issue(
            fx.student,
            &IssueRequest {
                book_id: book,
                borrower_id: Some(fx.faculty.id),
                due_date: None,
            },
            today(),
        )
        .await
        .unwrap_err();
    assert_matches!(core_err(err), CoreError::Forbidden(_));
    assert_eq!(available(&pool, book).await, 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_self_service_due_date_is_always_a_week(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000003", 1).await;

    let borrow = fx
        .lifecycle
        .issue(
            fx.student,
            &IssueRequest {
                book_id: book,
                borrower_id: None,
                due_date: Some(days_later(60)),
            },
            today(),
        )
        .await
        .unwrap();
    assert_eq!(borrow.due_date, days_later(7));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_staff_issue_with_custom_and_past_due_dates(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000004", 2).await;

    let err = fx
        .lifecycle
        .issue(
            fx.librarian,
            &IssueRequest {
                book_id: book,
                borrower_id: Some(fx.student.id),
                due_date: Some(days_later(-1)),
            },
            today(),
        )
        .await
        .unwrap_err();
    assert_matches!(core_err(err), CoreError::Validation(_));

    let borrow = fx
        .lifecycle
        .issue(
            fx.librarian,
            &IssueRequest {
                book_id: book,
                borrower_id: Some(fx.student.id),
                due_date: Some(days_later(14)),
            },
            today(),
        )
        .await
        .unwrap();
    assert_eq!(borrow.user_id, fx.student.id);
    assert_eq!(borrow.issued_by, Some(fx.librarian.id));
    assert_eq!(borrow.due_date, days_later(14));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_issue_without_copies_conflicts(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000005", 1).await;

    fx.lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    let err = fx
        .lifecycle
        .issue(fx.faculty, &self_issue(book), today())
        .await
        .unwrap_err();
    assert_matches!(core_err(err), CoreError::Conflict(msg) if msg.contains("No copies"));
    assert_eq!(available(&pool, book).await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_double_return_is_rejected_without_side_effects(pool: PgPool) {
    let mut fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000006", 2).await;

    let borrow = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    fx.lifecycle
        .return_borrow(fx.librarian, borrow.id, today())
        .await
        .unwrap();
    assert_eq!(available(&pool, book).await, 2);
    drain(&mut fx.events);

    let err = fx
        .lifecycle
        .return_borrow(fx.librarian, borrow.id, today())
        .await
        .unwrap_err();
    assert_matches!(
        core_err(err),
        CoreError::Validation(msg) if msg == "This book has already been returned"
    );
    assert_eq!(available(&pool, book).await, 2);
    assert!(drain(&mut fx.events).is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_only_borrower_or_staff_may_return(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000007", 1).await;

    let borrow = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    let err = fx
        .lifecycle
        .return_borrow(fx.faculty, borrow.id, today())
        .await
        .unwrap_err();
    assert_matches!(core_err(err), CoreError::Forbidden(_));

    let err = fx
        .lifecycle
        .return_borrow(fx.student, 999_999, today())
        .await
        .unwrap_err();
    assert_matches!(core_err(err), CoreError::NotFound { entity: "Borrow", .. });
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_return_promotes_oldest_pending_reservation(pool: PgPool) {
    let fx = setup(&pool).await;
    let other = create_user(&pool, "other", Role::Student).await;
    let book = create_book(&pool, "1000000000008", 1).await;

    let borrow = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    let reserve = |actor: Actor| {
        let lifecycle = fx.lifecycle.clone();
        async move {
            lifecycle
                .reserve(
                    actor,
                    &ReserveRequest {
                        book_id: book,
                        user_id: None,
                    },
                )
                .await
                .unwrap()
        }
    };
    let r1 = reserve(fx.faculty).await;
    let r2 = reserve(other).await;

    let outcome = fx
        .lifecycle
        .return_borrow(fx.student, borrow.id, today())
        .await
        .unwrap();
    assert_eq!(outcome.promoted.map(|r| r.id), Some(r1.id));

    let r2 = ReservationRepo::find_by_id(&pool, r2.id).await.unwrap().unwrap();
    assert_eq!(r2.status().unwrap(), ReservationStatus::Pending);
    assert!(r2.notified_at.is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_concurrent_issues_never_oversell(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000009", 1).await;

    let a = {
        let lifecycle = fx.lifecycle.clone();
        let actor = fx.student;
        tokio::spawn(async move { lifecycle.issue(actor, &self_issue(book), today()).await })
    };
    let b = {
        let lifecycle = fx.lifecycle.clone();
        let actor = fx.faculty;
        tokio::spawn(async move { lifecycle.issue(actor, &self_issue(book), today()).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(available(&pool, book).await, 0);
}

// ---------------------------------------------------------------------------
// Fine lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_fine_creation_is_idempotent(pool: PgPool) {
    let mut fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000010", 1).await;

    let borrow = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    let due_day = borrow.due_date;
    drain(&mut fx.events);

    assert!(!fx.lifecycle.check_and_create_fine(&borrow, due_day).await.unwrap());

    let day_after = due_day + chrono::Duration::days(1);
    assert!(fx.lifecycle.check_and_create_fine(&borrow, day_after).await.unwrap());
    assert!(!fx.lifecycle.check_and_create_fine(&borrow, day_after).await.unwrap());

    let mut conn = pool.acquire().await.unwrap();
    let fine = FineRepo::find_by_borrow(&mut conn, borrow.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fine.amount, Decimal::new(5000, 2));
    assert!(!fine.is_paid);
    assert_eq!(drain(&mut fx.events), vec!["fine.created"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_stale_borrow_returned_in_between_gets_no_fine(pool: PgPool) {
    let mut fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000014", 1).await;
    let stale = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    let later = days_later(30);

    let outcome = fx
        .lifecycle
        .return_borrow(fx.student, stale.id, later)
        .await
        .unwrap();
    assert_eq!(outcome.fine_status, None);
    drain(&mut fx.events);

    // `stale` still says unreturned; the locked row must win.
    assert!(!stale.is_returned);
    assert!(!fx.lifecycle.check_and_create_fine(&stale, later).await.unwrap());

    let mut conn = pool.acquire().await.unwrap();
    assert!(FineRepo::find_by_borrow(&mut conn, stale.id)
        .await
        .unwrap()
        .is_none());
    assert!(drain(&mut fx.events).is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_fine_check_by_id_reads_current_row(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000015", 1).await;
    let borrow = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();

    assert!(fx
        .lifecycle
        .check_and_create_fine_by_id(borrow.id, days_later(30))
        .await
        .unwrap());
    assert_matches!(
        fx.lifecycle.check_and_create_fine_by_id(999_999, days_later(30)).await,
        Err(LifecycleError::Core(CoreError::NotFound { entity: "Borrow", .. }))
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_concurrent_fine_checks_create_one_fine(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000011", 1).await;
    let borrow = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    let later = days_later(30);

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let lifecycle = fx.lifecycle.clone();
            let borrow = borrow.clone();
            tokio::spawn(async move { lifecycle.check_and_create_fine(&borrow, later).await })
        })
        .collect();
    let mut created = 0;
    for task in tasks {
        if task.await.unwrap().unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_return_with_unpaid_fine_is_allowed(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000012", 1).await;
    let borrow = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    let later = days_later(10);
    assert!(fx.lifecycle.check_and_create_fine(&borrow, later).await.unwrap());

    let outcome = fx
        .lifecycle
        .return_borrow(fx.librarian, borrow.id, later)
        .await
        .unwrap();
    assert_eq!(outcome.fine_status, Some(FineStatus::Unpaid));
    assert_eq!(
        outcome.message,
        "Book returned successfully, but user stu Tester hasn't paid the fine yet!"
    );
    assert_eq!(available(&pool, book).await, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_pay_fine_is_staff_only_and_idempotent(pool: PgPool) {
    let mut fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000013", 1).await;
    let borrow = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    fx.lifecycle
        .check_and_create_fine(&borrow, days_later(9))
        .await
        .unwrap();
    let mut conn = pool.acquire().await.unwrap();
    let fine = FineRepo::find_by_borrow(&mut conn, borrow.id)
        .await
        .unwrap()
        .unwrap();
    drain(&mut fx.events);

    let err = fx.lifecycle.pay_fine(fx.student, fine.id).await.unwrap_err();
    assert_matches!(core_err(err), CoreError::Forbidden(_));

    let paid = fx.lifecycle.pay_fine(fx.librarian, fine.id).await.unwrap();
    assert!(paid.is_paid);
    let paid_at = paid.paid_at.expect("paid_at should be stamped");

    let again = fx.lifecycle.pay_fine(fx.librarian, fine.id).await.unwrap();
    assert!(again.is_paid);
    assert_eq!(again.paid_at, Some(paid_at));

    assert_eq!(drain(&mut fx.events), vec!["fine.paid"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_sweep_fines_each_overdue_borrow_once(pool: PgPool) {
    let fx = setup(&pool).await;
    let a = create_book(&pool, "1000000000014", 1).await;
    let b = create_book(&pool, "1000000000015", 1).await;
    let c = create_book(&pool, "1000000000016", 1).await;

    fx.lifecycle.issue(fx.student, &self_issue(a), today()).await.unwrap();
    fx.lifecycle.issue(fx.faculty, &self_issue(b), today()).await.unwrap();
    let returned = fx
        .lifecycle
        .issue(fx.faculty, &self_issue(c), today())
        .await
        .unwrap();
    fx.lifecycle
        .return_borrow(fx.faculty, returned.id, today())
        .await
        .unwrap();

    let later = days_later(20);
    let first = fx.lifecycle.sweep_overdue(later).await.unwrap();
    assert_eq!(first.examined, 2);
    assert_eq!(first.fines_created, 2);

    let second = fx.lifecycle.sweep_overdue(later).await.unwrap();
    assert_eq!(second.examined, 0);
    assert_eq!(second.fines_created, 0);
}

// ---------------------------------------------------------------------------
// Reservation lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_self_service_cannot_reserve_available_book(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000017", 3).await;
    let request = ReserveRequest {
        book_id: book,
        user_id: None,
    };

    let err = fx.lifecycle.reserve(fx.student, &request).await.unwrap_err();
    assert_matches!(core_err(err), CoreError::Validation(_));

    // Staff may queue on behalf of a student at any availability level.
    let reservation = fx
        .lifecycle
        .reserve(
            fx.librarian,
            &ReserveRequest {
                book_id: book,
                user_id: Some(fx.student.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(reservation.user_id, fx.student.id);
    assert_eq!(reservation.status().unwrap(), ReservationStatus::Pending);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_cancel_permissions_and_terminal_states(pool: PgPool) {
    let mut fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000018", 0).await;
    let reservation = fx
        .lifecycle
        .reserve(
            fx.student,
            &ReserveRequest {
                book_id: book,
                user_id: None,
            },
        )
        .await
        .unwrap();

    let err = fx
        .lifecycle
        .cancel_reservation(fx.faculty, reservation.id)
        .await
        .unwrap_err();
    assert_matches!(core_err(err), CoreError::Forbidden(_));

    let cancelled = fx
        .lifecycle
        .cancel_reservation(fx.librarian, reservation.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status().unwrap(), ReservationStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());

    let err = fx
        .lifecycle
        .cancel_reservation(fx.student, reservation.id)
        .await
        .unwrap_err();
    assert_matches!(core_err(err), CoreError::Validation(msg) if msg == NOT_CANCELLABLE);

    assert_eq!(
        drain(&mut fx.events),
        vec!["reservation.created", "reservation.cancelled"]
    );
}

/// COMPLETED is a stored status that no operation produces. Walk every
/// transition and confirm no reservation ends up there.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_no_operation_completes_a_reservation(pool: PgPool) {
    let fx = setup(&pool).await;
    let book = create_book(&pool, "1000000000019", 1).await;

    let borrow = fx
        .lifecycle
        .issue(fx.student, &self_issue(book), today())
        .await
        .unwrap();
    let reservation = fx
        .lifecycle
        .reserve(
            fx.faculty,
            &ReserveRequest {
                book_id: book,
                user_id: None,
            },
        )
        .await
        .unwrap();
    fx.lifecycle
        .return_borrow(fx.student, borrow.id, today())
        .await
        .unwrap();
    // The reserver now borrows the promoted copy.
    fx.lifecycle
        .issue(fx.faculty, &self_issue(book), today())
        .await
        .unwrap();

    let reservation = ReservationRepo::find_by_id(&pool, reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reservation.status().unwrap(), ReservationStatus::Available);

    let counts = ReservationRepo::counts(&pool, None).await.unwrap();
    assert_eq!(counts.completed, 0);
}
