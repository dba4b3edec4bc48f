//! Integration test crate for SwarmTrack.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It drives whole hindsight sessions over synthetic recordings.

#[cfg(test)]
mod hindsight;

#[cfg(test)]
mod replay;
