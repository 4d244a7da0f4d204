/// Router Module Index
///
/// Organizes the shell's pages by access level. Every protected router is wrapped by the
/// session gate through `auth::require` with its own route requirement.

/// Pages and auth-flow endpoints reachable without a session.
pub mod public;

/// Pages open to any authenticated user.
pub mod authenticated;

/// Pages restricted to specific roles. Visitors with another role are relocated to their
/// own home rather than refused.
pub mod restricted;
