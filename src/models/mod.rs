pub mod coordinate;
pub mod responses;

// Re-export commonly used types
pub use coordinate::{CoordinateInput, CoordinateRecord};
pub use responses::{ErrorResponse, RecordCreatedResponse};
