//! Tests for the nest-engine crate.

mod helpers;
