//! Infrastructure layer: concrete session providers and membership stores.

pub mod membership;
pub mod session;

pub use membership::{InMemoryMembershipStore, PostgresMembershipStore};
pub use session::JwtSessionProvider;
