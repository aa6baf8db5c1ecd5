// Library for tests to access modules

pub mod aggregator;
pub mod classify;
pub mod collections;
pub mod config;
pub mod discovery;
pub mod forwarder;
pub mod local;
pub mod merge;
pub mod messages;
pub mod metrics;
pub mod registry;
pub mod rewrite;
pub mod routes;
pub mod version;
