//! Problem codes for QuickSFC diagnostics.
//!
//! The enumeration is generated by the build script from
//! `resources/problem-codes.csv`.

include!(concat!(env!("OUT_DIR"), "/problems.rs"));

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}
