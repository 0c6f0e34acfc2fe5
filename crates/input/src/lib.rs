//! Input: discrete actions produced by whatever polls the keyboard and mouse.
//!
//! # Invariants
//! - The scene consumes actions, never raw key codes.
//! - Unit conversion (pixels to degrees) happens here, before the scene sees it.

pub mod action;
pub mod look;

pub use action::Action;
pub use look::LookController;

pub fn crate_info() -> &'static str {
    "umbra-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
