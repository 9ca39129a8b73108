//! Standard extensions of the grant flows.
//!
//! Extensions add requirements on top of a grant type, they are configured on the grant type they
//! apply to.
mod pkce;

pub use self::pkce::Pkce;
