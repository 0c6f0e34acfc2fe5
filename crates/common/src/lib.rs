//! Shared types used by input, scene state and rendering crates.

pub mod types;

pub use types::{MoveDirection, ObjectKind, RasterMode, WORLD_UP, wrap_degrees};

pub fn crate_info() -> &'static str {
    "umbra-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
