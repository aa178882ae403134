pub mod auth;
pub mod email_templates;
pub mod realtime;
pub mod submissions;
