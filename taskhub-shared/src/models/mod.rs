/// Database models for TaskHub
///
/// Each model owns its SQL as associated functions taking a `&PgPool`.
/// Services never call these directly; they go through the store ports in
/// [`crate::store`], which [`crate::db::PgStore`] implements on top of them.
///
/// # Models
///
/// - `user`: accounts, credentials and VIP status
/// - `session`: login sessions keyed by token hash
/// - `verification`: single-use email verification codes
/// - `invitation`: single-use project invitation codes
/// - `project`: projects and the membership set
/// - `task`: tasks inside projects
/// - `notification`: the notification idempotency ledger

pub mod invitation;
pub mod notification;
pub mod project;
pub mod session;
pub mod task;
pub mod user;
pub mod verification;

pub use invitation::{InvitationCode, MembershipGrant};
pub use notification::{MarkOutcome, NotificationRecord};
pub use project::{CreateProject, Project, UpdateProject};
pub use session::Session;
pub use task::{CreateTask, Task, UpdateTask};
pub use user::{CreateUser, User, UserCredentials, VipStatus};
pub use verification::VerificationCode;
