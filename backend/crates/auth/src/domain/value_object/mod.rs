//! Value Object Module

pub mod account_id;
pub mod email;
pub mod public_id;
pub mod token_version;
pub mod username;

pub use account_id::AccountId;
pub use email::Email;
pub use public_id::PublicId;
pub use token_version::TokenVersion;
pub use username::Username;
