//! Authorisation helpers used by HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by resolving the
//! caller and checking its capability here, before any driving port runs.

use crate::domain::{Caller, Capability, authorize};

use super::ApiResult;
use super::session::SessionContext;

/// Resolve the session caller and require `capability`.
///
/// Missing sessions yield `401`, insufficient roles `403`.
pub fn require_capability(session: &SessionContext, capability: Capability) -> ApiResult<Caller> {
    let caller = session.require_caller()?;
    authorize(&caller, capability)?;
    Ok(caller)
}
