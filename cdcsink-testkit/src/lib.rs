//! Test helpers for cdcsink.
//!
//! Provides change-event builders and decoding of what landed in a memory log.

mod helpers;

pub use helpers::{
    decode_partition, delete_event, event_without_id, insert_event, row, update_event,
};
