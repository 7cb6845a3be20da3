// Document-to-PDF conversion core: a coordinator/worker session protocol
// around a single embedded office-engine instance.

pub mod api;
pub mod config;
pub mod detect;
pub mod engine;
pub mod protocol;
