//! Visibility policy for agent access.
//!
//! - `public` — any authenticated user.
//! - `private` — creator only; organization membership does not override.
//! - `organization` — creator, or a member of the agent's owning
//!   organization. An `organization` agent with no owning organization is a
//!   data inconsistency and is denied.

use mn_backend::PlatformStore;
use mn_domain::error::{Error, Result};
use mn_domain::model::{Agent, Visibility};

/// Check whether `user_id` may use `agent`.
///
/// The membership set is fetched only when the decision actually needs it
/// (an `organization` agent whose requester isn't the creator).
pub async fn check(store: &dyn PlatformStore, user_id: &str, agent: &Agent) -> Result<()> {
    let membership = if needs_membership(user_id, agent) {
        store.user_organizations(user_id).await?
    } else {
        Vec::new()
    };
    decide(user_id, agent, &membership)
}

fn needs_membership(user_id: &str, agent: &Agent) -> bool {
    agent.visibility == Visibility::Organization
        && !agent.is_creator(user_id)
        && agent.organization_id.is_some()
}

/// The pure decision, once the requester's membership set is known.
pub fn decide(user_id: &str, agent: &Agent, membership: &[String]) -> Result<()> {
    match agent.visibility {
        Visibility::Public => Ok(()),
        Visibility::Private => {
            if agent.is_creator(user_id) {
                Ok(())
            } else {
                Err(Error::PermissionDenied("this agent is private".into()))
            }
        }
        Visibility::Organization => {
            if agent.is_creator(user_id) {
                return Ok(());
            }
            match agent.organization_id.as_deref() {
                // No owning organization: inconsistent data, deny.
                None => Err(Error::PermissionDenied(
                    "agent has organization visibility but no owning organization".into(),
                )),
                Some(org_id) if membership.iter().any(|m| m == org_id) => Ok(()),
                Some(_) => Err(Error::PermissionDenied(
                    "not a member of the agent's organization".into(),
                )),
            }
        }
    }
}
