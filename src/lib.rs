// Library for the binary and integration tests

pub mod config;
pub mod convert;
pub mod docker_names;
pub mod emit;
pub mod error;
pub mod load_test;
pub mod merge;
pub mod models;
pub mod rates;
pub mod select;
pub mod sources;
pub mod version;
