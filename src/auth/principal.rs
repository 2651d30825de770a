use std::sync::Arc;

/// Contract an authenticated entity must satisfy
///
/// The auth layer treats users as opaque beyond these accessors: a stable
/// identifier, the stored password hash (PHC string), and an optional
/// remember token.
pub trait Authenticatable: Send + Sync {
    /// Stable identifier for the principal
    fn auth_id(&self) -> String;

    /// Stored password hash in PHC string format
    fn password_hash(&self) -> String;

    /// Current remember token, if the principal carries one
    fn remember_token(&self) -> Option<String>;
}

/// Shared handle to a resolved principal
pub type Principal = Arc<dyn Authenticatable>;
