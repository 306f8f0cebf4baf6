//! Twitter syndication: OAuth authorization, reading tweets as contexts, and
//! publishing posts as statuses, retweets or favorites.

pub mod client;
pub mod error;
pub mod plugin;
pub mod routes;
pub mod types;

pub use {
    client::TwitterClient,
    error::{Error, Result},
    plugin::descriptor,
};
