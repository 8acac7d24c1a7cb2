//! Phyto Shared Library
//!
//! Boundary types shared by the acquisition layer, the transport layer and the
//! classification engine.
//!
//! This library provides:
//! - [`PlantState`], the closed state enumeration every classifier reports in
//! - [`RawSample`], one reading from the bioelectric sensor
//! - [`Mailbox`], the single-slot operator channel polled once per tick

pub mod mailbox;
pub mod sample;
pub mod state;

pub use mailbox::{Mailbox, MailboxError};
pub use sample::RawSample;
pub use state::{ParseStateError, PlantState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
