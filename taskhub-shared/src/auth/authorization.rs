/// Ownership checks for project and task operations
///
/// TaskHub has a single permission rule: only the owner of a project or
/// task may read, change, delete or invite to it. Every service operation
/// on those resources goes through [`authorize`], which checks existence
/// first and ownership second. A non-owner probing an ID that does not
/// exist therefore sees `NotFound`, and one probing somebody else's
/// resource sees `Forbidden`.
///
/// The checks are pure functions over an explicit [`Actor`]; there is no
/// ambient "current user".
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::authorization::{authorize, Actor, Owned};
/// use taskhub_shared::error::CoreError;
/// use uuid::Uuid;
///
/// struct Doc { owner: Uuid }
/// impl Owned for Doc {
///     fn owner_id(&self) -> Uuid { self.owner }
/// }
///
/// let alice = Actor { user_id: Uuid::new_v4(), email: "alice@example.com".into() };
/// let bob = Actor { user_id: Uuid::new_v4(), email: "bob@example.com".into() };
///
/// let doc = authorize(&alice, Some(Doc { owner: alice.user_id }), "doc").unwrap();
/// assert!(matches!(authorize(&bob, Some(doc), "doc"), Err(CoreError::Forbidden(_))));
/// assert!(matches!(authorize::<Doc>(&bob, None, "doc"), Err(CoreError::NotFound(_))));
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::{Project, Task, User};

/// The authenticated user on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub email: String,
}

impl Actor {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
        }
    }
}

/// A resource with a single owning user
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Project {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Task {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

/// Returns true if `actor` owns `resource`
pub fn owns<R: Owned + ?Sized>(actor: &Actor, resource: &R) -> bool {
    resource.owner_id() == actor.user_id
}

/// Fails with `Forbidden` unless `actor` owns `resource`
///
/// `what` names the resource kind in the error message ("project", "task").
pub fn require_ownership<R: Owned + ?Sized>(
    actor: &Actor,
    resource: &R,
    what: &str,
) -> CoreResult<()> {
    if !owns(actor, resource) {
        tracing::debug!(
            actor = %actor.user_id,
            owner = %resource.owner_id(),
            resource = what,
            "Ownership check failed"
        );
        return Err(CoreError::forbidden(format!("not your {}", what)));
    }

    Ok(())
}

/// Existence check followed by ownership check
///
/// # Errors
///
/// - `NotFound` if `resource` is `None`
/// - `Forbidden` if the actor is not the owner
pub fn authorize<R: Owned>(actor: &Actor, resource: Option<R>, what: &str) -> CoreResult<R> {
    let resource = resource.ok_or_else(|| CoreError::not_found(what.to_string()))?;
    require_ownership(actor, &resource, what)?;
    Ok(resource)
}
