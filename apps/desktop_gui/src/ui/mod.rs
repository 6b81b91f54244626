//! UI layer for desktop GUI: app shell and the transfer list screen.

pub mod app;
pub mod transfers;

pub use app::TransfersApp;
