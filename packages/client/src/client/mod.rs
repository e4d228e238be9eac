//! The fetcher: proxy resolution, pooled connections and request exchange

pub mod core;

pub use self::core::Fetcher;
