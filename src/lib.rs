pub mod config;
pub mod constants;
pub mod feeds;
pub mod formatters;
pub mod gazetteer;
pub mod geo;
pub mod geocode;
pub mod markers;
pub mod models;
pub mod poller;
pub mod sequence;
pub mod service;
pub mod severity;
