pub use super::audit_logs::Entity as AuditLogs;
pub use super::class_invites::Entity as ClassInvites;
pub use super::class_members::Entity as ClassMembers;
pub use super::classes::Entity as Classes;
pub use super::users::Entity as Users;
