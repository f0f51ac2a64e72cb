use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use tracing::{debug, info, instrument};

use models::usuario;

use super::domain::{AuthSession, AuthUser, Claims, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::password::{check_length, hash_password, verify_password};
use crate::repository::UsuarioRepository;

/// Auth service configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub min_password_len: usize,
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(c: &configs::AuthConfig) -> Self {
        Self {
            jwt_secret: c.jwt_secret.clone(),
            token_ttl_hours: c.token_ttl_hours,
            min_password_len: c.min_password_len,
        }
    }
}

/// Auth business service independent of web framework
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UsuarioRepository>,
    cfg: AuthConfig,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UsuarioRepository>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig, domain::RegisterInput};
    /// use service::repo::memory::InMemoryRepository;
    /// use std::sync::Arc;
    /// let svc = AuthService::new(
    ///     Arc::new(InMemoryRepository::default()),
    ///     AuthConfig { jwt_secret: "secret".into(), token_ttl_hours: 12, min_password_len: 6 },
    /// );
    /// let input = RegisterInput { nome: "Ana".into(), email: "Ana@Example.com".into(), senha: "segredo".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "ana@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        usuario::validate(&input.nome, &input.email).map_err(|e| AuthError::Validation(e.to_string()))?;
        check_length(&input.senha, self.cfg.min_password_len)?;

        let email = usuario::normalize_email(&input.email);
        if let Some(existing) = self.repo.find_by_email(&email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.senha)?;
        let created = self.repo.insert(input.nome.trim(), &email, &hash).await?;
        info!(usuario_id = created.id, email = %created.email, "user_registered");
        Ok(created.into())
    }

    /// Authenticate a user and issue a signed token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig, domain::{RegisterInput, LoginInput}};
    /// use service::repo::memory::InMemoryRepository;
    /// use std::sync::Arc;
    /// let svc = AuthService::new(
    ///     Arc::new(InMemoryRepository::default()),
    ///     AuthConfig { jwt_secret: "secret".into(), token_ttl_hours: 12, min_password_len: 6 },
    /// );
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { nome: "N".into(), email: "u@e.com".into(), senha: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), senha: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert_eq!(svc.verify_token(&session.token).unwrap().uid, session.user.id);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let email = usuario::normalize_email(&input.email);
        let user = self.repo.find_by_email(&email).await?.ok_or(AuthError::Unauthorized)?;

        if !verify_password(&input.senha, &user.senha)? {
            debug!(usuario_id = user.id, "password mismatch");
            return Err(AuthError::Unauthorized);
        }

        let expires_at = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp();
        let claims = Claims { sub: user.email.clone(), uid: user.id, name: user.nome.clone(), exp: expires_at as usize };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;

        info!(usuario_id = user.id, "user_logged_in");
        Ok(AuthSession { user: user.into(), token, expires_at })
    }

    /// Decode and check a token issued by [`AuthService::login`].
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthError::Unauthorized
        })?;
        Ok(data.claims)
    }

    /// Current user behind a verified token.
    pub async fn me(&self, usuario_id: i32) -> Result<AuthUser, AuthError> {
        let user = self.repo.find_by_id(usuario_id).await?.ok_or(AuthError::NotFound)?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::memory::InMemoryRepository;

    fn svc() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryRepository::default()),
            AuthConfig { jwt_secret: "test-secret".into(), token_ttl_hours: 1, min_password_len: 6 },
        )
    }

    fn reg(email: &str) -> RegisterInput {
        RegisterInput { nome: "Bia".into(), email: email.into(), senha: "segredo".into() }
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict_case_insensitive() {
        let s = svc();
        s.register(reg("bia@example.com")).await.unwrap();
        let err = s.register(reg("BIA@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
        assert_eq!(err.code(), 1002);
    }

    #[tokio::test]
    async fn short_password_rejected() {
        let s = svc();
        let err = s
            .register(RegisterInput { nome: "Bia".into(), email: "b@e.com".into(), senha: "123".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_unauthorized() {
        let s = svc();
        s.register(reg("bia@example.com")).await.unwrap();
        let wrong = s.login(LoginInput { email: "bia@example.com".into(), senha: "errada!".into() }).await;
        assert!(matches!(wrong, Err(AuthError::Unauthorized)));
        let unknown = s.login(LoginInput { email: "x@example.com".into(), senha: "segredo".into() }).await;
        assert!(matches!(unknown, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn token_carries_identity() {
        let s = svc();
        let u = s.register(reg("bia@example.com")).await.unwrap();
        let session = s.login(LoginInput { email: " Bia@Example.com ".into(), senha: "segredo".into() }).await.unwrap();
        let claims = s.verify_token(&session.token).unwrap();
        assert_eq!(claims.uid, u.id);
        assert_eq!(claims.sub, "bia@example.com");
        assert_eq!(claims.name, "Bia");
        assert_eq!(s.me(u.id).await.unwrap(), u);
    }

    #[test]
    fn foreign_token_rejected() {
        let s = svc();
        let other = AuthService::new(
            Arc::new(InMemoryRepository::default()),
            AuthConfig { jwt_secret: "another".into(), token_ttl_hours: 1, min_password_len: 6 },
        );
        let claims = Claims { sub: "a@b.c".into(), uid: 1, name: "A".into(), exp: (chrono::Utc::now().timestamp() + 60) as usize };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(b"another")).unwrap();
        assert!(other.verify_token(&token).is_ok());
        assert!(matches!(s.verify_token(&token), Err(AuthError::Unauthorized)));
    }
}
