use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{generate_reset_token, hash_password, hash_token, verify_password};
use crate::auth::{
    AuthError, AuthResponse, ChangePasswordRequest, ClientInfo, ForgotPasswordRequest, JwtService,
    MessageResponse, ResetPasswordRequest, Session, SessionInfo, SessionResponse, SignInRequest,
    SignUpRequest, UserSession,
};
use crate::config::AppConfig;
use crate::error::is_unique_violation;
use crate::models::{User, UserCredentials};
use crate::services::mail_service::{password_reset_body, Mailer};
use crate::validation::{invalid_field, normalize_email, Validate};

const RESET_TOKEN_TTL_MINUTES: i64 = 60;
const RESET_IDENTIFIER_PREFIX: &str = "reset-password:";

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.email_verified, u.created_at, u.updated_at";

#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    db: PgPool,
    session_ttl: Duration,
    mailer: Mailer,
    public_url: String,
}

impl AuthService {
    pub fn new(db: PgPool, config: &AppConfig, mailer: Mailer) -> Self {
        Self {
            jwt_service: JwtService::new(&config.jwt_secret),
            db,
            session_ttl: Duration::hours(config.session_ttl_hours),
            mailer,
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Register a new user with an email/password account and open a session
    pub async fn sign_up(
        &self,
        request: SignUpRequest,
        client: ClientInfo,
    ) -> Result<AuthResponse, AuthError> {
        let request = SignUpRequest {
            name: request.name.trim().to_string(),
            email: normalize_email(&request.email),
            password: request.password,
        };
        request.validate()?;
        let SignUpRequest {
            name,
            email,
            password,
        } = request;

        if self.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_blocking(password).await?;
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, email_verified, created_at, updated_at)
             VALUES ($1, $2, $3, FALSE, $4, $4)
             RETURNING id, name, email, email_verified, created_at, updated_at",
        )
        .bind(user_id)
        .bind(&name)
        .bind(&email)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AuthError::EmailAlreadyExists
            } else {
                AuthError::Database(err)
            }
        })?;

        sqlx::query(
            "INSERT INTO accounts (id, user_id, provider_id, password_hash, created_at, updated_at)
             VALUES ($1, $2, 'credential', $3, $4, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(&password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user_id = %user.id, "User registered");
        self.open_session(user, client).await
    }

    /// Sign in with email and password
    pub async fn sign_in(
        &self,
        request: SignInRequest,
        client: ClientInfo,
    ) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&request.email);

        let credentials = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {USER_COLUMNS}, a.password_hash
             FROM users u
             JOIN accounts a ON a.user_id = u.id AND a.provider_id = 'credential'
             WHERE u.email = $1"
        ))
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        let (user, password_hash) = credentials.into_user();

        if !verify_blocking(request.password, password_hash).await? {
            warn!(user_id = %user.id, "Failed sign-in attempt");
            return Err(AuthError::InvalidCredentials);
        }

        self.open_session(user, client).await
    }

    /// Revoke the caller's session
    pub async fn sign_out(&self, session: &UserSession) -> Result<MessageResponse, AuthError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session.session_id)
            .execute(&self.db)
            .await?;

        Ok(MessageResponse::new("Signed out"))
    }

    /// Validate a token against the sessions table
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let session = self.jwt_service.extract_user_session(token)?;

        let expires_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT expires_at FROM sessions WHERE id = $1 AND user_id = $2",
        )
        .bind(session.session_id)
        .bind(session.user_id)
        .fetch_optional(&self.db)
        .await?;

        match expires_at {
            None => Err(AuthError::InvalidToken),
            Some(expires_at) if expires_at <= Utc::now() => Err(AuthError::SessionExpired),
            Some(_) => Ok(session),
        }
    }

    pub async fn get_session(&self, session: &UserSession) -> Result<SessionResponse, AuthError> {
        let user = self.get_user(session.user_id).await?;

        let row = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, expires_at, ip_address, user_agent, created_at
             FROM sessions WHERE id = $1",
        )
        .bind(session.session_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::InvalidToken)?;

        Ok(SessionResponse {
            user,
            session: SessionInfo {
                id: row.id,
                expires_at: row.expires_at,
                created_at: row.created_at,
            },
        })
    }

    pub async fn change_password(
        &self,
        session: &UserSession,
        request: ChangePasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        request.validate()?;

        self.verify_user_password(session.user_id, &request.current_password, "current_password")
            .await?;

        let password_hash = hash_blocking(request.new_password).await?;
        self.store_password_hash(session.user_id, &password_hash).await?;

        if request.revoke_other_sessions {
            sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND id <> $2")
                .bind(session.user_id)
                .bind(session.session_id)
                .execute(&self.db)
                .await?;
        }

        info!(user_id = %session.user_id, "Password changed");
        Ok(MessageResponse::new("Password changed"))
    }

    /// Start the reset flow. The response never reveals whether the account exists.
    pub async fn request_password_reset(
        &self,
        request: ForgotPasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        let response = MessageResponse::new(
            "If an account with that email exists, a password reset link has been sent.",
        );

        let email = normalize_email(&request.email);
        let Some(user) = self.find_user_by_email(&email).await? else {
            return Ok(response);
        };

        let token = generate_reset_token();
        let identifier = format!("{RESET_IDENTIFIER_PREFIX}{}", user.id);
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM verifications WHERE identifier = $1")
            .bind(&identifier)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO verifications (id, identifier, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(&identifier)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let link = format!("{}/reset-password?token={}", self.public_url, token);
        if let Err(err) = self
            .mailer
            .send(&user.email, "Reset hasła", &password_reset_body(&user.name, &link))
            .await
        {
            // The token stays valid; the user can ask again.
            warn!(user_id = %user.id, error = %err, "Failed to send password reset email");
        }

        Ok(response)
    }

    /// Consume a reset token, set the new password and revoke every session
    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        request.validate()?;

        let password_hash = hash_blocking(request.new_password).await?;

        let mut tx = self.db.begin().await?;

        let identifier: Option<String> = sqlx::query_scalar(
            "DELETE FROM verifications
             WHERE token_hash = $1 AND expires_at > NOW() AND identifier LIKE 'reset-password:%'
             RETURNING identifier",
        )
        .bind(hash_token(request.token.trim()))
        .fetch_optional(&mut *tx)
        .await?;

        let user_id = identifier
            .as_deref()
            .and_then(|identifier| identifier.strip_prefix(RESET_IDENTIFIER_PREFIX))
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or(AuthError::InvalidResetToken)?;

        sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = NOW()
             WHERE user_id = $1 AND provider_id = 'credential'",
        )
        .bind(user_id)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(user_id = %user_id, "Password reset");
        Ok(MessageResponse::new("Password has been reset"))
    }

    /// Check a password typed by a signed-in user; a mismatch is reported on `field`.
    pub async fn verify_user_password(
        &self,
        user_id: Uuid,
        password: &str,
        field: &'static str,
    ) -> Result<(), AuthError> {
        let password_hash: String = sqlx::query_scalar(
            "SELECT password_hash FROM accounts WHERE user_id = $1 AND provider_id = 'credential'",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::InvalidToken)?;

        if verify_blocking(password.to_string(), password_hash).await? {
            Ok(())
        } else {
            Err(invalid_field(field, "incorrect_password", "is incorrect").into())
        }
    }

    /// Delete the user row; sessions, accounts and journal rows cascade
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1"))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// Delete expired sessions and verification tokens, returning how many rows went
    pub async fn purge_expired(&self) -> Result<(u64, u64), AuthError> {
        let sessions = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.db)
            .await?
            .rows_affected();
        let verifications = sqlx::query("DELETE FROM verifications WHERE expires_at <= NOW()")
            .execute(&self.db)
            .await?
            .rows_affected();

        Ok((sessions, verifications))
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    // Private helper methods

    async fn open_session(&self, user: User, client: ClientInfo) -> Result<AuthResponse, AuthError> {
        let session_id = Uuid::new_v4();
        let expires_at = Utc::now() + self.session_ttl;

        sqlx::query(
            "INSERT INTO sessions (id, user_id, expires_at, ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(session_id)
        .bind(user.id)
        .bind(expires_at)
        .bind(client.ip_address)
        .bind(client.user_agent)
        .execute(&self.db)
        .await?;

        let token = self
            .jwt_service
            .create_session_token(user.id, &user.email, session_id, expires_at)?;

        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_at,
            user,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn store_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), AuthError> {
        sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = NOW()
             WHERE user_id = $1 AND provider_id = 'credential'",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

/// bcrypt is CPU bound; keep it off the async workers.
async fn hash_blocking(password: String) -> Result<String, AuthError> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| AuthError::Internal(err.into()))??;
    Ok(hash)
}

async fn verify_blocking(password: String, password_hash: String) -> Result<bool, AuthError> {
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|err| AuthError::Internal(err.into()))??;
    Ok(matches)
}
