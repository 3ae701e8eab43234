pub mod firebase;
pub mod store;
