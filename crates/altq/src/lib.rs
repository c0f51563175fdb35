//! Command-line tools for the altq tab switcher: grid preview, state
//! inspection, and scripted replays against an in-memory host.

pub mod error;
pub mod grid;
pub mod replay;
pub mod show;

pub use error::{Error, Result};
