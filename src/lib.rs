#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod analyzers;
pub mod app;
pub mod config;
pub mod export;
pub mod learn;
pub mod model;
pub mod observability;
pub mod pipeline;
pub(crate) mod schema;
pub mod util;
