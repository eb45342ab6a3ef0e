//! Applying and inverting chunk storage transforms.
//!
//! The content address is always computed over the raw bytes, so a
//! transform only changes the on-disk representation. [`Transform::Identity`]
//! is the only transform currently shipped; the record format leaves room
//! for compression codecs without changing any address.

use bytes::Bytes;
use nest_types::Transform;

/// Apply a transform to raw chunk bytes before persisting.
pub(crate) fn apply(transform: Transform, raw: Bytes) -> Bytes {
    match transform {
        Transform::Identity => raw,
    }
}

/// Invert a recorded transform, recovering the raw chunk bytes.
pub(crate) fn invert(transform: Transform, stored: Bytes) -> Bytes {
    match transform {
        Transform::Identity => stored,
    }
}
