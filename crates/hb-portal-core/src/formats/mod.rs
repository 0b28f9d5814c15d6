//! On-disk formats.

mod persistence;

pub use persistence::{MAX_SNAPSHOT_SIZE, SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
