//! External delivery channels for library notifications.

pub mod email;
