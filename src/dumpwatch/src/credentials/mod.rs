//! Background-refreshed bearer credentials for cluster control-plane clients.
//!
//! A [`CredentialStore`] is a single-writer, many-reader "latest value" cell.
//! The [`CredentialRefresher`] is its only writer; the propagation loop in
//! [`propagation`] mirrors the current value into the authorization header
//! that every outgoing control-plane request carries.

mod propagation;
mod refresher;
mod store;
mod supervisor;

pub use propagation::{spawn_header_propagation, AuthorizationHeader};
pub use refresher::{CredentialRefresher, RefreshSettings, TokenIssuer};
pub use store::CredentialStore;
pub use supervisor::supervise;
