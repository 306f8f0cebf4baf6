//! Posts, external contexts and users, their SQLite stores, and the content
//! helpers syndication needs (link detection, first-image lookup, downloads).

pub mod autolink;
pub mod download;
pub mod error;
pub mod images;
pub mod models;
pub mod store;
pub mod users;

pub use {
    error::{Error, Result},
    models::{Context, ContentFormat, Location, Post, PostContext, User},
    store::{PostStore, WriteablePost},
    users::UserStore,
};
