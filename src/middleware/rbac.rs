// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{common::error::AppError, models::auth::{Role, User}};

/// Conjunto de roles que autoriza una acción. Los roles son fijos: el
/// chequeo no toca la base de datos.
pub trait RoleSet: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
    fn nombre() -> &'static str;
}

/// Extractor guardián: poner `RequireRole<RolModificacion>` como argumento
/// del handler hace el chequeo de rol en la frontera de la API.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or(AppError::InvalidToken)?;

        if !T::allowed().contains(&user.role) {
            return Err(AppError::Forbidden(T::nombre()));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// CONJUNTOS DE ROLES
// ---

/// Altas, ediciones y cancelaciones (pagos, clientes, catálogo).
pub struct RolModificacion;
impl RoleSet for RolModificacion {
    fn allowed() -> &'static [Role] {
        &[Role::Superadmin, Role::Admin]
    }
    fn nombre() -> &'static str {
        "ADMIN"
    }
}

/// Conciliación bancaria e importaciones masivas.
pub struct RolConciliacion;
impl RoleSet for RolConciliacion {
    fn allowed() -> &'static [Role] {
        &[Role::Superadmin, Role::Admin]
    }
    fn nombre() -> &'static str {
        "ADMIN"
    }
}

/// Operaciones destructivas (borrar transacciones bancarias).
pub struct RolSuperadmin;
impl RoleSet for RolSuperadmin {
    fn allowed() -> &'static [Role] {
        &[Role::Superadmin]
    }
    fn nombre() -> &'static str {
        "SUPERADMIN"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lector_no_modifica() {
        assert!(!RolModificacion::allowed().contains(&Role::Lector));
        assert!(RolModificacion::allowed().contains(&Role::Admin));
    }

    #[test]
    fn solo_superadmin_borra() {
        assert_eq!(RolSuperadmin::allowed(), &[Role::Superadmin]);
    }
}
