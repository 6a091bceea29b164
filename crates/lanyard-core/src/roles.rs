use lanyard_db::DbPool;
use lanyard_models::Role;

use crate::error::CoreError;

/// The authenticated caller as seen by the service layer: stored account
/// role, not the raw token claim.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

/// Check a role against a route's allow-list. An empty list means the
/// route is open to any authenticated caller.
pub fn require_role(role: Role, allowed: &[Role]) -> Result<(), CoreError> {
    if allowed.is_empty() || allowed.contains(&role) {
        return Ok(());
    }
    Err(CoreError::Forbidden)
}

/// Door guard: admins may always check attendees in; staff only for events
/// they are assigned to.
pub async fn ensure_event_staff(
    pool: &DbPool,
    event_id: i64,
    actor: &Actor,
) -> Result<(), CoreError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Staff => {
            if lanyard_db::events::is_staff(pool, event_id, actor.id).await? {
                Ok(())
            } else {
                Err(CoreError::Forbidden)
            }
        }
        Role::User => Err(CoreError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: i64, role: Role) -> Actor {
        Actor {
            id,
            email: format!("u{id}@example.com"),
            role,
        }
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        for role in [Role::Admin, Role::Staff, Role::User] {
            assert!(require_role(role, &[]).is_ok());
        }
    }

    #[test]
    fn allow_list_rejects_missing_role() {
        assert!(require_role(Role::Staff, &[Role::Admin]).is_err());
        assert!(require_role(Role::Admin, &[Role::Admin]).is_ok());
    }

    #[tokio::test]
    async fn staff_must_be_assigned_to_the_event() {
        let pool = crate::testutil::pool_with_event(10).await;
        lanyard_db::users::get_or_create_user(&pool, 2, "staff@example.com", None)
            .await
            .unwrap();
        lanyard_db::events::set_staff_ids(&pool, 10, &[2]).await.unwrap();

        assert!(ensure_event_staff(&pool, 10, &actor(2, Role::Staff)).await.is_ok());
        assert!(matches!(
            ensure_event_staff(&pool, 10, &actor(3, Role::Staff)).await,
            Err(CoreError::Forbidden)
        ));
        // Admins bypass the assignment set entirely.
        assert!(ensure_event_staff(&pool, 10, &actor(99, Role::Admin)).await.is_ok());
        // Plain users are never allowed at the door.
        assert!(matches!(
            ensure_event_staff(&pool, 10, &actor(2, Role::User)).await,
            Err(CoreError::Forbidden)
        ));
    }
}
