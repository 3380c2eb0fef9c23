//! Message composition: turns a [`LibraryEvent`] into concrete deliveries.
//!
//! Pure and synchronous so every message can be asserted without I/O.
//! Staff copies always skip the person the event is about (or, for a
//! cancellation, the person who cancelled).

use unilib_core::fine::{format_amount, FineStatus};
use unilib_core::notification::NotificationType;
use unilib_core::roles::Role;
use unilib_core::types::DbId;
use unilib_db::models::notification::CreateNotification;
use unilib_db::models::user::UserContact;

use crate::bus::{BookRef, LibraryEvent};

/// An email ready to hand to a [`Mailer`](crate::delivery::email::Mailer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    InApp(CreateNotification),
    Email(OutgoingEmail),
}

/// Builds the relative links stored on notifications and the absolute
/// links embedded in emails.
#[derive(Debug, Clone)]
pub struct Links {
    base_url: String,
}

impl Links {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn book(&self, book_id: DbId) -> String {
        format!("/books/{book_id}")
    }

    pub fn reservations(&self) -> String {
        "/reservations".to_string()
    }

    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// All deliveries for one event. `staff` is the current list of active
/// staff contacts.
pub fn compose(event: &LibraryEvent, staff: &[UserContact], links: &Links) -> Vec<Delivery> {
    let mut out = Vec::new();

    match event {
        LibraryEvent::BorrowIssued {
            borrow,
            book,
            borrower,
        } => {
            let url = links.book(book.id);
            in_app(
                &mut out,
                borrower.id,
                NotificationType::Borrowed,
                format!("You borrowed '{}'", book.title),
                &url,
            );
            to_staff(
                &mut out,
                staff,
                borrower.id,
                NotificationType::Borrowed,
                &format!("{} borrowed '{}'", borrower.full_name, book.title),
                &url,
            );
            email(
                &mut out,
                borrower,
                format!("You borrowed '{}'", book.title),
                &[
                    format!("You have borrowed <strong>{}</strong>.", escape(&book.title)),
                    format!("Please return it by <strong>{}</strong>.", borrow.due_date),
                ],
                book,
                links,
            );
        }

        LibraryEvent::BorrowReturned {
            book,
            borrower,
            fine_status,
            promoted,
            ..
        } => {
            let url = links.book(book.id);
            in_app(
                &mut out,
                borrower.id,
                NotificationType::Returned,
                format!("You returned '{}'", book.title),
                &url,
            );
            to_staff(
                &mut out,
                staff,
                borrower.id,
                NotificationType::Returned,
                &format!("{} returned '{}'", borrower.full_name, book.title),
                &url,
            );
            let mut lines = vec![format!(
                "Thank you for returning <strong>{}</strong>.",
                escape(&book.title)
            )];
            if *fine_status == Some(FineStatus::Unpaid) {
                lines.push("An overdue fine on this loan is still unpaid.".to_string());
            }
            email(
                &mut out,
                borrower,
                format!("You returned '{}'", book.title),
                &lines,
                book,
                links,
            );

            if let Some(promoted) = promoted {
                in_app(
                    &mut out,
                    promoted.owner.id,
                    NotificationType::Reservation,
                    format!("Your reserved book '{}' is now available", book.title),
                    &url,
                );
                email(
                    &mut out,
                    &promoted.owner,
                    format!("'{}' is now available", book.title),
                    &[format!(
                        "Good news: <strong>{}</strong>, which you reserved, is now available.",
                        escape(&book.title)
                    )],
                    book,
                    links,
                );
            }
        }

        LibraryEvent::FineCreated {
            fine,
            borrow,
            book,
            borrower,
            overdue_days,
        } => {
            let url = links.book(book.id);
            let amount = format_amount(fine.amount);
            in_app(
                &mut out,
                borrower.id,
                NotificationType::Fine,
                format!(
                    "Your book '{}' is overdue by {} days. A fine of {} has been applied.",
                    book.title, overdue_days, amount
                ),
                &url,
            );
            to_staff(
                &mut out,
                staff,
                borrower.id,
                NotificationType::Fine,
                &format!(
                    "Book '{}' borrowed by {} is overdue by {} days. Fine applied: {}",
                    book.title, borrower.full_name, overdue_days, amount
                ),
                &url,
            );
            if borrower.role().is_some_and(Role::is_self_service) {
                email(
                    &mut out,
                    borrower,
                    format!("UniLib - Overdue Book: '{}'", book.title),
                    &[
                        "<strong>Overdue Book Notice</strong>".to_string(),
                        format!("Book Title: {}", escape(&book.title)),
                        format!("Author: {}", escape(&book.author)),
                        format!("Due Date: {}", borrow.due_date),
                        format!("Days Overdue: {overdue_days}"),
                        format!("Fine Amount: {amount}"),
                        "Please return this book to the library as soon as possible."
                            .to_string(),
                    ],
                    book,
                    links,
                );
            }
        }

        LibraryEvent::FinePaid { fine, book, user } => {
            let url = links.book(book.id);
            let amount = format_amount(fine.amount);
            in_app(
                &mut out,
                user.id,
                NotificationType::Fine,
                format!(
                    "Your fine of {} for '{}' has been paid successfully.",
                    amount, book.title
                ),
                &url,
            );
            to_staff(
                &mut out,
                staff,
                user.id,
                NotificationType::Fine,
                &format!(
                    "Fine of {} for '{}' has been paid by {}.",
                    amount, book.title, user.full_name
                ),
                &url,
            );
            email(
                &mut out,
                user,
                format!("Payment received for '{}'", book.title),
                &[format!(
                    "We received your payment of {} for <strong>{}</strong>.",
                    amount,
                    escape(&book.title)
                )],
                book,
                links,
            );
        }

        LibraryEvent::ReservationCreated { book, reserver, .. } => {
            let url = links.book(book.id);
            in_app(
                &mut out,
                reserver.id,
                NotificationType::Reservation,
                format!(
                    "You reserved '{}'. You'll be notified when it becomes available.",
                    book.title
                ),
                &url,
            );
            to_staff(
                &mut out,
                staff,
                reserver.id,
                NotificationType::Reservation,
                &format!("{} reserved '{}'", reserver.full_name, book.title),
                &url,
            );
            email(
                &mut out,
                reserver,
                format!("You reserved '{}'", book.title),
                &[format!(
                    "Your reservation for <strong>{}</strong> is confirmed. \
                     We will let you know when a copy is available.",
                    escape(&book.title)
                )],
                book,
                links,
            );
        }

        LibraryEvent::ReservationCancelled {
            book, owner, actor, ..
        } => {
            let url = links.reservations();
            in_app(
                &mut out,
                owner.id,
                NotificationType::ReservationCancelled,
                format!("Your reservation for '{}' has been cancelled.", book.title),
                &url,
            );
            to_staff(
                &mut out,
                staff,
                actor.id,
                NotificationType::ReservationCancelled,
                &format!(
                    "Reservation for '{}' by {} was cancelled.",
                    book.title, owner.full_name
                ),
                &url,
            );
            email(
                &mut out,
                owner,
                format!("Reservation Cancelled: {}", book.title),
                &[
                    format!(
                        "Your reservation for <strong>{}</strong> has been cancelled.",
                        escape(&book.title)
                    ),
                    format!("Cancelled by: {}", escape(&actor.full_name)),
                ],
                book,
                links,
            );
        }
    }

    out
}

fn in_app(
    out: &mut Vec<Delivery>,
    user_id: DbId,
    kind: NotificationType,
    message: String,
    url: &str,
) {
    out.push(Delivery::InApp(CreateNotification {
        user_id,
        notification_type: kind,
        message,
        related_url: Some(url.to_string()),
    }));
}

fn to_staff(
    out: &mut Vec<Delivery>,
    staff: &[UserContact],
    except: DbId,
    kind: NotificationType,
    message: &str,
    url: &str,
) {
    for member in staff.iter().filter(|s| s.id != except) {
        in_app(out, member.id, kind, message.to_string(), url);
    }
}

fn email(
    out: &mut Vec<Delivery>,
    to: &UserContact,
    subject: String,
    lines: &[String],
    book: &BookRef,
    links: &Links,
) {
    let book_url = links.absolute(&links.book(book.id));
    let body: String = lines.iter().map(|l| format!("<p>{l}</p>")).collect();
    let html = format!(
        "<html><body>\
         <p>Dear {name},</p>\
         {body}\
         <p><a href=\"{book_url}\">View the book</a></p>\
         <p>Thank you,<br>UniLib Team</p>\
         </body></html>",
        name = escape(&to.full_name),
    );
    out.push(Delivery::Email(OutgoingEmail {
        to: to.email.clone(),
        subject,
        html,
    }));
}

/// Minimal HTML escaping for user-supplied text.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
