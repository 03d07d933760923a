pub(crate) mod json;
pub mod stats;
pub mod text;
