pub mod claims;
pub mod errors;
mod handler;
pub mod issuer;
pub mod validator;

pub use claims::Audience;
pub use claims::Claims;
pub use claims::ExtraClaims;
pub use errors::IssueError;
pub use errors::ValidationFailure;
pub use issuer::IssuedToken;
pub use issuer::TokenIssuer;
pub use validator::TokenValidator;
