//! Infrastructure Layer
//!
//! Adapters (implementations) for the ports defined in the application
//! layer:
//!
//! - `persistence/`: in-memory and JSON-on-disk contract repository and
//!   artifact sink

pub mod persistence;
