//! Core logic for the mailbox

mod authorization;

pub use authorization::{check_role, AuthorizationContext, AuthorizationGate, RoleError};
