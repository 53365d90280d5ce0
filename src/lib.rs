pub mod config;
pub mod humanize;
pub mod jobs;
pub mod ledger;
pub mod messaging;
pub mod mirror;
pub mod observability;
pub mod service;
