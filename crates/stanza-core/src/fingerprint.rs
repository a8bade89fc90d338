//! Content fingerprints for render requests
//!
//! A fingerprint is a 128-bit xxh3 digest over the normalized text, font id
//! and background id. Every field is length-prefixed so `("ab", "c")` and
//! `("a", "bc")` never collide.

use std::fmt;
use std::str::FromStr;

use xxhash_rust::xxh3::Xxh3;

use crate::error::{Result, StanzaError};
use crate::RenderRequest;

/// Bumped whenever the rendered output for the same request would change
const DOMAIN: &[u8] = b"stanza/render/v1";

/// Stable id of a render request, also used as the cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Fingerprint a request, normalizing it first
    pub fn of(request: &RenderRequest) -> Result<Self> {
        if request.is_normalized() {
            Ok(Self::of_normalized(request))
        } else {
            Ok(Self::of_normalized(&request.normalized()?))
        }
    }

    /// Fingerprint a request that has already been through `normalized()`
    pub fn of_normalized(request: &RenderRequest) -> Self {
        let mut hasher = Xxh3::new();
        hasher.update(DOMAIN);
        for field in [request.text(), request.font(), request.background()] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Self(hasher.digest128())
    }

    /// Parse the 32-character hex form produced by `Display`
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != 32 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StanzaError::Config(format!("not a fingerprint: {hex:?}")));
        }
        u128::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|e| StanzaError::Config(format!("not a fingerprint: {hex:?} ({e})")))
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = StanzaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}
