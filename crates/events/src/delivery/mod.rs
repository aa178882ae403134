//! External delivery channels for submission notifications.

pub mod email;
