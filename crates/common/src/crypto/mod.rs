//! Symmetric encryption used for secrets at rest.

pub mod encryption;

pub use encryption::{EncryptionService, SealedPayload};
