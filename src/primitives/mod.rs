//! A collection of primitives shared by all grant types.
//!
//! A primitive is the smallest independent unit of policy used by the grant flows. The [`model`]
//! is the contract a host implements to store and recover grants, the other modules provide the
//! value types exchanged with it and the default policies for token values and parameter formats.
//!
//! [`model`]: model/index.html

use chrono::DateTime;
use chrono::Utc;

pub mod format;
pub mod generator;
pub mod issuer;
pub mod model;
pub mod scope;

/// Points in time, always in Utc.
pub type Time = DateTime<Utc>;

/// Commonly used primitives for hosts implementing a model.
pub mod prelude {
    pub use super::generator::{RandomGenerator, TagToken};
    pub use super::issuer::{AuthorizationCodeRecord, RefreshTokenRecord, Token};
    pub use super::model::{
        AuthorizationCodeStore, ClientIdentity, ClientPrincipal, Model, ModelError, RefreshTokenStore,
        ScopeValidation, TokenPersistence, UserLookup,
    };
    pub use super::scope::Scope;
}
