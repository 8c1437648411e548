//! An out-of-the-box agent that remembers the conversation and can look up
//! the weather, do arithmetic, recall past messages and check emails.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring agent functionality into your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod session;
pub mod tools;

pub use session::{Session, SessionBuilder};

/// Re-exports of [`recall_agent_core`] crate.
pub mod core {
    pub use recall_agent_core::*;
}
