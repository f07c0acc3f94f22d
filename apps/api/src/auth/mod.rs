pub mod identity;
pub mod viewer;
pub mod webhook;

pub use identity::IdentityVerifier;
pub use viewer::Identity;
