//! Progress reporting for automated debates

pub mod reporter;
