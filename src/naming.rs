//! # Unique name generation.
//!
//! Units and pipelines submitted without a name get one from a [`NameSource`].
//! The default, [`UuidNames`], draws 16 bytes from the operating system's
//! entropy source and formats them as a random (v4) UUID; it fails only when
//! that source does.

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::NamingError;

/// Produces statistically unique names.
pub trait NameSource: Send + Sync + 'static {
    /// Returns a fresh name, or an error if the entropy source failed.
    fn generate(&self) -> Result<String, NamingError>;
}

/// Random UUID names backed by the OS entropy source.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidNames;

impl NameSource for UuidNames {
    fn generate(&self) -> Result<String, NamingError> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| NamingError::Entropy {
                reason: e.to_string(),
            })?;
        Ok(uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string())
    }
}

impl<F> NameSource for F
where
    F: Fn() -> Result<String, NamingError> + Send + Sync + 'static,
{
    fn generate(&self) -> Result<String, NamingError> {
        self()
    }
}
