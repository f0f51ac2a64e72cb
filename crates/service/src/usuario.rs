//! Profile maintenance for authenticated users.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};

use models::usuario;

use crate::auth::domain::AuthUser;
use crate::auth::errors::AuthError;
use crate::auth::password::{check_length, hash_password};
use crate::errors::ServiceError;
use crate::repository::{ExtratoRepository, UsuarioRepository};

/// Profile edit form; password fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfile {
    pub nome: String,
    pub email: String,
    #[serde(default)]
    pub nova_senha: Option<String>,
    #[serde(default)]
    pub confirmar_senha: Option<String>,
}

#[derive(Clone)]
pub struct UsuarioService {
    usuarios: Arc<dyn UsuarioRepository>,
    extratos: Arc<dyn ExtratoRepository>,
    min_password_len: usize,
}

fn hash_err(e: AuthError) -> ServiceError {
    match e {
        AuthError::Validation(msg) => ServiceError::Validation(msg),
        other => ServiceError::Db(other.to_string()),
    }
}

impl UsuarioService {
    pub fn new(usuarios: Arc<dyn UsuarioRepository>, extratos: Arc<dyn ExtratoRepository>, min_password_len: usize) -> Self {
        Self { usuarios, extratos, min_password_len }
    }

    pub async fn get_profile(&self, usuario_id: i32) -> Result<AuthUser, ServiceError> {
        let u = self.usuarios.find_by_id(usuario_id).await?.ok_or_else(|| ServiceError::not_found("usuario"))?;
        Ok(u.into())
    }

    pub async fn list_all(&self) -> Result<Vec<AuthUser>, ServiceError> {
        Ok(self.usuarios.list().await?.into_iter().map(AuthUser::from).collect())
    }

    /// Only the user themself may edit the profile.
    #[instrument(skip(self, input))]
    pub async fn update_profile(&self, usuario_id: i32, target_id: i32, input: UpdateProfile) -> Result<AuthUser, ServiceError> {
        if usuario_id != target_id {
            return Err(ServiceError::Unauthorized("cannot edit another user's profile".into()));
        }
        usuario::validate(&input.nome, &input.email)?;
        let mut current = self.usuarios.find_by_id(target_id).await?.ok_or_else(|| ServiceError::not_found("usuario"))?;

        let email = usuario::normalize_email(&input.email);
        if email != current.email {
            if let Some(other) = self.usuarios.find_by_email(&email).await? {
                if other.id != target_id {
                    return Err(ServiceError::Conflict("email already registered".into()));
                }
            }
        }

        if let Some(nova) = input.nova_senha.as_deref().filter(|s| !s.is_empty()) {
            if input.confirmar_senha.as_deref() != Some(nova) {
                return Err(ServiceError::Validation("password confirmation does not match".into()));
            }
            check_length(nova, self.min_password_len).map_err(hash_err)?;
            current.senha = hash_password(nova).map_err(hash_err)?;
        }

        current.nome = input.nome.trim().to_string();
        current.email = email;
        let updated = self.usuarios.update(current).await?;
        info!(usuario_id = updated.id, "profile_updated");
        Ok(updated.into())
    }

    /// Blocked while the user still owns statements.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, usuario_id: i32, target_id: i32) -> Result<(), ServiceError> {
        if usuario_id != target_id {
            return Err(ServiceError::Unauthorized("cannot delete another user's account".into()));
        }
        let owned = self.extratos.count_by_usuario(target_id).await?;
        if owned > 0 {
            return Err(ServiceError::Conflict(format!("user still owns {owned} extrato(s); delete them first")));
        }
        self.usuarios.delete(target_id).await?;
        info!(usuario_id, "account_deleted");
        Ok(())
    }
}
