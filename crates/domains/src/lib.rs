//! # domains
//!
//! The central domain types and port definitions for the boulder catalogue.
//! Nothing in this crate performs I/O; adapters implement the ports.

pub mod errors;
pub mod models;
pub mod ports;
pub mod style;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn test_persisted_boulder_keeps_its_id() {
        let id = Uuid::new_v4();
        let boulder = Boulder {
            id: Some(id),
            name: "La Proa".to_string(),
            ..Boulder::default()
        };
        assert_eq!(boulder.id, Some(id));
        assert!(boulder.is_persisted());
        assert!(!Boulder::default().is_persisted());
    }
}
