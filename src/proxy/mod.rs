pub mod client;

pub use client::ProxySource;
