// Library for tests to access modules

pub mod auth;
pub mod cancel;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod provider;
pub mod query;
pub mod registry;
pub mod routes;
pub mod service;
pub mod units;
pub mod version;
pub mod worker;
