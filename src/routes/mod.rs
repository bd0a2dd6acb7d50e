pub mod audit;
pub mod class_members;
pub mod classes;
pub mod invites;

pub use audit::configure_audit_routes;
pub use class_members::configure_class_members_routes;
pub use classes::configure_classes_routes;
pub use invites::configure_invites_routes;
