//! Per-thread state shared by the single-threaded and worker paths.

pub mod thread;
