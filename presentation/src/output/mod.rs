//! Output formatting for debate snapshots

pub mod console;
