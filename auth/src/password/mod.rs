pub mod argon2;
pub mod errors;
pub(crate) mod legacy;
pub mod record;

pub use argon2::PasswordHasher;
pub use errors::PasswordError;
pub use record::HashRecord;
pub use record::PasswordVerdict;
