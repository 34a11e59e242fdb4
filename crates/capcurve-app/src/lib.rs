// Library root: exposes the I/O layer around capcurve-core so the binary and
// integration tests share one code path.

pub mod config;
pub mod report;
pub mod run;
pub mod tables;
