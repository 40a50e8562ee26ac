// src/middleware.rs

pub mod auth;
pub mod rbac;

pub use auth::{AuthenticatedUser, auth_middleware};
pub use rbac::{RequireRole, RolConciliacion, RolModificacion, RolSuperadmin};
