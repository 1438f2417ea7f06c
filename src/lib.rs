// Coordinates, location samples, great-circle distance
pub mod geo;

// Facility model, record parsing and write validation
pub mod facility;

// Object filter engine and gym grouping
pub mod filter;

// Proximity notification engine
pub mod proximity;

// Facility directory storage
pub mod store;

// Configuration loading
pub mod config;

// HTTP API
pub mod api;
