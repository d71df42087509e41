//! Conversion services.
//!
//! Services contain the work behind the HTTP handlers: staging files on disk
//! and driving the external converter.

pub mod pandoc;
pub mod staging;
