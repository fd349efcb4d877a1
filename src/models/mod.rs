use uuid::Uuid;

pub mod product;
pub mod quote;
pub mod row;
pub mod site;

// Re-exports for convenience
pub use product::*;
pub use quote::*;
pub use row::*;
pub use site::*;

// Helper function to generate product ids when the catalog does not supply them
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
