//! Registration, login and email verification

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{RegisterUser, Role, User, UserClaims, UserSummary, VerificationClaims},
    repository::Repository,
    services::email::EmailService,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    public_url: String,
    email: EmailService,
}

impl AuthService {
    pub fn new(
        repository: Repository,
        config: AuthConfig,
        public_url: String,
        email: EmailService,
    ) -> Self {
        Self {
            repository,
            config,
            public_url,
            email,
        }
    }

    /// Register a new (unverified) user and send the verification email.
    /// Email delivery failure is logged and does not fail registration.
    pub async fn register(&self, request: RegisterUser) -> AppResult<UserSummary> {
        if self.repository.users.email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = self.hash_password(&request.password)?;

        let now = Utc::now().timestamp();
        let verification_claims = VerificationClaims {
            sub: request.email.clone(),
            exp: now + (self.config.verification_expiration_hours as i64 * 3600),
            iat: now,
        };
        let verification_token = verification_claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        let user = self
            .repository
            .users
            .create(
                &request.email,
                &password_hash,
                &request.name,
                request.role.unwrap_or(Role::Member),
                &verification_token,
            )
            .await?;

        let link = format!("{}/auth/verify/{}", self.public_url, verification_token);
        if let Err(e) = self
            .email
            .send_verification_email(&user.email, &user.name, &link)
            .await
        {
            tracing::warn!("Failed to send verification email to {}: {}", user.email, e);
        }

        Ok(user.into())
    }

    /// Authenticate by email/password and return a signed access token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, UserSummary)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        if !user.is_verified {
            return Err(AppError::Authorization(
                "Verify your email first".to_string(),
            ));
        }

        if !user.is_active {
            return Err(AppError::Authorization(
                "Account is deactivated".to_string(),
            ));
        }

        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            exp: now + (self.config.jwt_expiration_hours as i64 * 3600),
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((token, user.into()))
    }

    /// Verify an email address from its verification token.
    /// Welcome email failure is logged and non-fatal.
    pub async fn verify_email(&self, token: &str) -> AppResult<UserSummary> {
        let claims = VerificationClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Validation("Invalid or expired verification token".to_string()))?;

        let user = self.repository.users.mark_verified(&claims.sub).await?;

        if let Err(e) = self.email.send_welcome_email(&user.email, &user.name).await {
            tracing::warn!("Failed to send welcome email to {}: {}", user.email, e);
        }

        Ok(user.into())
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
