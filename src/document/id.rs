//! Document identifiers

use uuid::Uuid;

/// Source of fresh `_id` values
pub trait IdGenerator: Send + Sync {
    /// Produce an identifier never returned before
    fn new_id(&self) -> String;
}

/// Random UUID v4 identifiers, 32 lowercase hex chars
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
