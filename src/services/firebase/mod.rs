//! Firebase Realtime Database client authenticated with a service account.

pub mod credentials;
pub mod database;
pub mod token;

pub use credentials::ServiceAccount;
pub use database::RealtimeDatabase;
pub use token::TokenProvider;
