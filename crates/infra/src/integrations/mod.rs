//! External service integrations

pub mod oauth;
pub mod twitch;
