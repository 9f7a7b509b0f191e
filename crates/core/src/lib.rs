//! dumpkeeper_core - pure building blocks of the dumpkeeper backup tool.
//!
//! Nothing in this crate performs I/O: it parses connection URLs, names and
//! recognises dump files, derives restore point IDs and (de)serialises the
//! marker and metadata files. The `dumpkeeper` crate does the rest.

pub mod backup;
pub mod connection;
pub mod error;

pub use connection::{ConnectionInfo, POSTGRESQL, SQLITE};
pub use error::{CoreError, Result};
