//! Plugin registration: descriptors with an optional startup hook, the host
//! they register into, and the capabilities plugins may contribute.

pub mod error;
pub mod fetcher;
pub mod host;

pub use {
    error::{Error, Result},
    fetcher::ExternalPostFetcher,
    host::{PluginDescriptor, PluginHost, PluginReport, RegisterFn, register_plugins},
};
