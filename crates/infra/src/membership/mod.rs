//! Tenant-membership store adapters.
//!
//! Both adapters implement `tenantgate_auth::MembershipStore`; the guard only
//! ever reads through that trait.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryMembershipStore;
pub use postgres::PostgresMembershipStore;
