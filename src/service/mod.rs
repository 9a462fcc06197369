pub mod cleanup;
pub mod credentials;
pub mod roster;
pub mod sessions;
