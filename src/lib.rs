//! Terminal Hacker News reader.
//!
//! Story lists and items come from the Firebase JSON API through an [`hn_client::ItemService`];
//! pages of items are fetched concurrently by [`pipeline::FetchPipeline`], with every item passing
//! through a process-lifetime [`cache::MemCache`].

pub mod app;
pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod hn_client;
pub mod models;
pub mod pipeline;

#[cfg(test)]
mod test_helpers;

pub use error::{Error, Result};
