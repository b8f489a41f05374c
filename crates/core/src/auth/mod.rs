//! Authorization ports

pub mod ports;

pub use ports::{AuthObserver, BrowserLauncher, TokenProvider};
