//! Service wiring and the business operations behind every route.
//!
//! Handlers stay thin: authorization guards run first, then exactly one
//! method here. Every security-relevant operation appends exactly one
//! audit entry, success or failure.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use attest_audit::{AuditAction, AuditEntry, AuditRecorder, InMemoryAuditSink};
use attest_auth::{
    authorize_owner_or, ensure_can_grant, has_permission, perm, Argon2PasswordHasher, NewUser,
    PasswordHasher, PermissionCatalog, Role, TokenConfig, TokenPair, TokenService, User,
};
use attest_certs::{
    evaluate, Certificate, CertificateSigner, NewCertificate, VerificationOutcome,
    VerificationRecord, VerificationReport,
};
use attest_core::{CertId, UserId};
use attest_store::{
    CertificateStore, InMemoryCertificateStore, InMemoryUserStore, StoreError, UserStore,
};

use crate::app::dto::{
    CreateCertificateRequest, CreateUserRequest, LoginRequest, RegisterRequest,
};
use crate::app::errors::ApiError;
use crate::context::{CurrentUser, RequestMeta};

const MIN_PASSWORD_LEN: usize = 8;

/// Runtime configuration, read from the environment by the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub signing_secret: String,
    /// Seeded on first start so the instance is administrable.
    pub bootstrap_admin_email: String,
    pub bootstrap_admin_password: String,
}

/// Shared application services. One instance per process, cloned via `Arc`.
pub struct AppServices {
    pub catalog: PermissionCatalog,
    pub tokens: TokenService,
    pub hasher: Arc<dyn PasswordHasher>,
    pub signer: CertificateSigner,
    pub users: Arc<dyn UserStore>,
    pub certs: Arc<dyn CertificateStore>,
    pub audit: AuditRecorder,
    /// Concrete handle kept for test inspection of the audit trail.
    pub audit_sink: Arc<InMemoryAuditSink>,
}

impl AppServices {
    /// Wire every service against in-memory stores and seed the bootstrap
    /// super-admin account.
    pub fn new(config: &AppConfig) -> anyhow::Result<Arc<Self>> {
        let audit_sink = Arc::new(InMemoryAuditSink::new());

        let services = Arc::new(Self {
            catalog: PermissionCatalog::builtin(),
            tokens: TokenService::new(&TokenConfig::new(
                config.access_secret.clone(),
                config.refresh_secret.clone(),
            )),
            hasher: Arc::new(Argon2PasswordHasher),
            signer: CertificateSigner::new(config.signing_secret.as_bytes().to_vec()),
            users: Arc::new(InMemoryUserStore::new()),
            certs: Arc::new(InMemoryCertificateStore::new()),
            audit: AuditRecorder::new(audit_sink.clone()),
            audit_sink,
        });

        services.seed_bootstrap_admin(config)?;
        Ok(services)
    }

    fn seed_bootstrap_admin(&self, config: &AppConfig) -> anyhow::Result<()> {
        let email = config.bootstrap_admin_email.trim().to_lowercase();
        if self
            .users
            .get_by_email(&email)
            .map_err(|e| anyhow::anyhow!("user store: {e}"))?
            .is_some()
        {
            return Ok(());
        }

        let now = Utc::now();
        let hash = self
            .hasher
            .hash(&config.bootstrap_admin_password)
            .map_err(|e| anyhow::anyhow!("password hash: {e}"))?;
        let admin = User::register(
            NewUser {
                email,
                password_hash: hash,
                name: "Bootstrap Admin".to_string(),
                organization: None,
                role: Role::SuperAdmin,
            },
            now,
        )
        .map_err(|e| anyhow::anyhow!("bootstrap admin: {e}"))?;

        tracing::info!(email = %admin.email, "seeded bootstrap super-admin");
        self.users
            .insert(admin)
            .map_err(|e| anyhow::anyhow!("user store: {e}"))?;
        Ok(())
    }

    // ── auth ────────────────────────────────────────────────────────────

    /// Self-registration: default role is `holder`, never caller-chosen.
    pub fn register(
        &self,
        req: RegisterRequest,
        meta: &RequestMeta,
    ) -> Result<(User, TokenPair), ApiError> {
        validate_password(&req.password)?;

        let now = Utc::now();
        let hash = self
            .hasher
            .hash(&req.password)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        let user = User::register(
            NewUser {
                email: req.email,
                password_hash: hash,
                name: req.name,
                organization: req.organization,
                role: Role::Holder,
            },
            now,
        )?;

        self.users.insert(user.clone())?;
        let pair = self.issue_pair(&user)?;

        self.audit.record(
            AuditEntry::new(AuditAction::Registered, true, now)
                .with_actor(user.id.to_string(), user.email.clone(), user.role.as_str())
                .with_target("user", user.id.to_string())
                .with_request(meta.to_request_info()),
        );
        Ok((user, pair))
    }

    /// Login with the lockout state machine applied before any password
    /// comparison.
    pub fn login(
        &self,
        req: LoginRequest,
        meta: &RequestMeta,
    ) -> Result<(User, TokenPair), ApiError> {
        let now = Utc::now();
        let email = req.email.trim().to_lowercase();

        let Some(mut user) = self.users.get_by_email(&email)? else {
            self.audit_login_failure(&email, meta, "unknown email");
            return Err(ApiError::InvalidCredentials);
        };

        // A locked account rejects before the password is ever compared.
        if user.is_locked(now) {
            let lock_until = user.lockout.lock_until.unwrap_or(now);
            self.audit_login_failure(&email, meta, "account locked");
            return Err(ApiError::AccountLocked { lock_until });
        }

        if !user.active {
            self.audit_login_failure(&email, meta, "account inactive");
            return Err(ApiError::AccountInactive);
        }

        if !self.hasher.verify(&req.password, &user.password_hash) {
            user.record_failed_login(now);
            let attempts = user.lockout.attempts;
            self.users.update(user)?;
            self.audit_login_failure(&email, meta, &format!("bad password (attempt {attempts})"));
            return Err(ApiError::InvalidCredentials);
        }

        user.record_successful_login(now);
        self.users.update(user.clone())?;
        let pair = self.issue_pair(&user)?;

        self.audit.record(
            AuditEntry::new(AuditAction::LoginSucceeded, true, now)
                .with_actor(user.id.to_string(), user.email.clone(), user.role.as_str())
                .with_request(meta.to_request_info()),
        );
        Ok((user, pair))
    }

    /// Exchange a refresh token for a brand-new pair. The old refresh token
    /// stays valid until its natural expiry (no revocation list). The
    /// subject must still exist and be active.
    pub fn refresh(
        &self,
        refresh_token: &str,
        meta: &RequestMeta,
    ) -> Result<(User, TokenPair), ApiError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let Some(user) = self.users.get(claims.sub)? else {
            return Err(ApiError::TokenInvalid);
        };
        if !user.active {
            return Err(ApiError::AccountInactive);
        }

        // The new pair snapshots the user's current role, not the old one.
        let pair = self.issue_pair(&user)?;

        self.audit.record(
            AuditEntry::new(AuditAction::TokenRefreshed, true, Utc::now())
                .with_actor(user.id.to_string(), user.email.clone(), user.role.as_str())
                .with_request(meta.to_request_info()),
        );
        Ok((user, pair))
    }

    /// The authenticated caller's live record.
    pub fn current_user(&self, current: &CurrentUser) -> Result<User, ApiError> {
        self.users
            .get(current.id)?
            .ok_or(ApiError::TokenInvalid)
    }

    // ── users ───────────────────────────────────────────────────────────

    pub fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.users.list()?)
    }

    pub fn get_user(&self, id: UserId) -> Result<User, ApiError> {
        self.users
            .get(id)?
            .ok_or_else(|| ApiError::NotFound("user not found".to_string()))
    }

    /// Admin-create with a caller-chosen role, gated by the escalation rule.
    pub fn create_user(
        &self,
        actor: &CurrentUser,
        req: CreateUserRequest,
        meta: &RequestMeta,
    ) -> Result<User, ApiError> {
        ensure_can_grant(actor.role, req.role)?;
        validate_password(&req.password)?;

        let now = Utc::now();
        let hash = self
            .hasher
            .hash(&req.password)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        let user = User::register(
            NewUser {
                email: req.email,
                password_hash: hash,
                name: req.name,
                organization: req.organization,
                role: req.role,
            },
            now,
        )?;

        self.users.insert(user.clone())?;

        self.audit.record(
            AuditEntry::new(AuditAction::UserCreated, true, now)
                .with_actor(actor.id.to_string(), actor.email.clone(), actor.role.as_str())
                .with_target("user", user.id.to_string())
                .with_details(format!("role: {}", user.role.as_str()))
                .with_request(meta.to_request_info()),
        );
        Ok(user)
    }

    pub fn assign_role(
        &self,
        actor: &CurrentUser,
        target_id: UserId,
        role: Role,
        meta: &RequestMeta,
    ) -> Result<User, ApiError> {
        ensure_can_grant(actor.role, role)?;

        let now = Utc::now();
        let mut user = self.get_user(target_id)?;
        let previous = user.role;
        user.assign_role(role, now);
        self.users.update(user.clone())?;

        self.audit.record(
            AuditEntry::new(AuditAction::RoleAssigned, true, now)
                .with_actor(actor.id.to_string(), actor.email.clone(), actor.role.as_str())
                .with_target("user", user.id.to_string())
                .with_change(
                    json!({ "role": previous.as_str() }),
                    json!({ "role": role.as_str() }),
                )
                .with_request(meta.to_request_info()),
        );
        Ok(user)
    }

    pub fn set_user_active(
        &self,
        actor: &CurrentUser,
        target_id: UserId,
        active: bool,
        meta: &RequestMeta,
    ) -> Result<User, ApiError> {
        if !active && target_id == actor.id {
            return Err(ApiError::SelfDeactivation);
        }

        let now = Utc::now();
        let mut user = self.get_user(target_id)?;
        user.set_active(active, now);
        self.users.update(user.clone())?;

        let action = if active {
            AuditAction::UserActivated
        } else {
            AuditAction::UserDeactivated
        };
        self.audit.record(
            AuditEntry::new(action, true, now)
                .with_actor(actor.id.to_string(), actor.email.clone(), actor.role.as_str())
                .with_target("user", user.id.to_string())
                .with_request(meta.to_request_info()),
        );
        Ok(user)
    }

    /// Hard delete. The role-exact super-admin guard runs in the handler;
    /// self-deletion is rejected here.
    pub fn delete_user(
        &self,
        actor: &CurrentUser,
        target_id: UserId,
        meta: &RequestMeta,
    ) -> Result<(), ApiError> {
        if target_id == actor.id {
            return Err(ApiError::SelfDeletion);
        }

        match self.users.delete(target_id) {
            Ok(()) => {}
            Err(StoreError::NotFound) => {
                return Err(ApiError::NotFound("user not found".to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        self.audit.record(
            AuditEntry::new(AuditAction::UserDeleted, true, Utc::now())
                .with_actor(actor.id.to_string(), actor.email.clone(), actor.role.as_str())
                .with_target("user", target_id.to_string())
                .with_request(meta.to_request_info()),
        );
        Ok(())
    }

    // ── certificates ────────────────────────────────────────────────────

    /// Issue a certificate. Creation starts at `pending` and auto-advances
    /// to `active` (with signature) iff the creator's role can sign.
    pub fn create_certificate(
        &self,
        actor: &CurrentUser,
        req: CreateCertificateRequest,
        meta: &RequestMeta,
    ) -> Result<Certificate, ApiError> {
        let now = Utc::now();
        let mut cert = Certificate::issue(
            NewCertificate {
                title: req.title,
                kind: req.kind,
                holder_id: req.holder_id,
                holder_name: req.holder_name,
                issuer_id: actor.id,
                issuing_organization: req.issuing_organization,
                skills: req.skills,
                grade: req.grade,
                score: req.score,
                expires_at: req.expires_at,
            },
            now,
        )?;

        let auto_signed = has_permission(&self.catalog, actor.role, perm::CERT_SIGN);
        if auto_signed {
            cert.sign(&self.signer, now)?;
        }

        self.certs.insert(cert.clone())?;

        let mut entry = AuditEntry::new(AuditAction::CertificateCreated, true, now)
            .with_actor(actor.id.to_string(), actor.email.clone(), actor.role.as_str())
            .with_target("certificate", cert.id.to_string())
            .with_request(meta.to_request_info());
        if auto_signed {
            entry = entry.with_details("auto-signed at creation");
        }
        self.audit.record(entry);

        Ok(cert)
    }

    /// Listing: unscoped readers see everything, `:own`-scoped readers see
    /// only certificates they hold.
    pub fn list_certificates(&self, actor: &CurrentUser) -> Result<Vec<Certificate>, ApiError> {
        if has_permission(&self.catalog, actor.role, perm::CERT_READ) {
            Ok(self.certs.list()?)
        } else {
            Ok(self.certs.list_by_holder(actor.id)?)
        }
    }

    pub fn get_certificate(
        &self,
        actor: &CurrentUser,
        id: CertId,
        meta: &RequestMeta,
    ) -> Result<Certificate, ApiError> {
        let cert = self.certs.get(id)?.ok_or(ApiError::CertNotFound)?;

        if let Err(err) = authorize_owner_or(
            &self.catalog,
            actor.role,
            perm::CERT_READ,
            cert.holder_id == actor.id,
        ) {
            self.audit_forbidden(actor, meta, "certificate read: not the holder");
            return Err(err.into());
        }
        Ok(cert)
    }

    /// Explicit sign: promotes a stuck-`pending` certificate to `active`.
    pub fn sign_certificate(
        &self,
        actor: &CurrentUser,
        id: CertId,
        meta: &RequestMeta,
    ) -> Result<Certificate, ApiError> {
        let now = Utc::now();
        let mut cert = self.certs.get(id)?.ok_or(ApiError::CertNotFound)?;
        cert.sign(&self.signer, now)?;
        self.certs.update(cert.clone())?;

        self.audit.record(
            AuditEntry::new(AuditAction::CertificateSigned, true, now)
                .with_actor(actor.id.to_string(), actor.email.clone(), actor.role.as_str())
                .with_target("certificate", cert.id.to_string())
                .with_request(meta.to_request_info()),
        );
        Ok(cert)
    }

    pub fn revoke_certificate(
        &self,
        actor: &CurrentUser,
        id: CertId,
        reason: Option<String>,
        meta: &RequestMeta,
    ) -> Result<Certificate, ApiError> {
        let now = Utc::now();
        let mut cert = self.certs.get(id)?.ok_or(ApiError::CertNotFound)?;
        cert.revoke(actor.id, reason, now)?;
        self.certs.update(cert.clone())?;

        self.audit.record(
            AuditEntry::new(AuditAction::CertificateRevoked, true, now)
                .with_actor(actor.id.to_string(), actor.email.clone(), actor.role.as_str())
                .with_target("certificate", cert.id.to_string())
                .with_details(
                    cert.revocation_reason
                        .clone()
                        .unwrap_or_else(|| "no reason".to_string()),
                )
                .with_request(meta.to_request_info()),
        );
        Ok(cert)
    }

    /// Portable export: the full record plus its public verification URL.
    /// Gated to `certificate:export` holders or the certificate's holder.
    pub fn export_certificate(
        &self,
        actor: &CurrentUser,
        id: CertId,
        meta: &RequestMeta,
    ) -> Result<Certificate, ApiError> {
        let cert = self.certs.get(id)?.ok_or(ApiError::CertNotFound)?;

        if !has_permission(&self.catalog, actor.role, perm::CERT_EXPORT)
            && cert.holder_id != actor.id
        {
            self.audit_forbidden(actor, meta, "certificate export: not the holder");
            return Err(ApiError::PermissionDenied {
                required: perm::CERT_EXPORT.to_string(),
                role: actor.role,
            });
        }

        self.audit.record(
            AuditEntry::new(AuditAction::CertificateExported, true, Utc::now())
                .with_actor(actor.id.to_string(), actor.email.clone(), actor.role.as_str())
                .with_target("certificate", cert.id.to_string())
                .with_request(meta.to_request_info()),
        );
        Ok(cert)
    }

    /// Atomic conditional bulk expiry. Returns the number of certificates
    /// flipped.
    pub fn expire_sweep(
        &self,
        actor: &CurrentUser,
        meta: &RequestMeta,
    ) -> Result<u64, ApiError> {
        let now = Utc::now();
        let flipped = self.certs.expire_sweep(now)?;

        self.audit.record(
            AuditEntry::new(AuditAction::CertificateExpireSweep, true, now)
                .with_actor(actor.id.to_string(), actor.email.clone(), actor.role.as_str())
                .with_details(format!("{flipped} certificates expired"))
                .with_request(meta.to_request_info()),
        );
        Ok(flipped)
    }

    // ── public verification ─────────────────────────────────────────────

    /// Anonymous token lookup. Every attempt on an existing certificate is
    /// appended to its history and audited exactly once. An unknown token
    /// is not an error: it reports `invalid` with no certificate, so the
    /// endpoint never distinguishes "no such token" from "bad signature".
    pub fn verify_public(
        &self,
        token: &str,
        meta: &RequestMeta,
    ) -> Result<(Option<Certificate>, VerificationReport), ApiError> {
        let now = Utc::now();

        let Some(mut cert) = self.certs.find_by_verification_token(token)? else {
            self.audit.record(
                AuditEntry::new(AuditAction::CertificateVerifyFailed, false, now)
                    .with_details("verification token not found")
                    .with_request(meta.to_request_info()),
            );
            return Ok((
                None,
                VerificationReport {
                    outcome: VerificationOutcome::Invalid,
                    message: "Certificate not found".to_string(),
                },
            ));
        };

        let report = evaluate(&cert, &self.signer, now);

        cert.record_verification(VerificationRecord {
            verifier: None,
            at: now,
            ip: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
            result: report.outcome.as_str().to_string(),
        });
        self.certs.update(cert.clone())?;

        let action = if report.outcome.is_valid() {
            AuditAction::CertificateVerified
        } else {
            AuditAction::CertificateVerifyFailed
        };
        self.audit.record(
            AuditEntry::new(action, report.outcome.is_valid(), now)
                .with_target("certificate", cert.id.to_string())
                .with_details(report.message.clone())
                .with_request(meta.to_request_info()),
        );

        Ok((Some(cert), report))
    }

    // ── audit helpers ───────────────────────────────────────────────────

    fn issue_pair(&self, user: &User) -> Result<TokenPair, ApiError> {
        self.tokens
            .issue_pair(user.id, &user.email, user.role, Utc::now())
            .map_err(|_| ApiError::Internal("token issuance failed".to_string()))
    }

    fn audit_login_failure(&self, email: &str, meta: &RequestMeta, details: &str) {
        self.audit.record(
            AuditEntry::new(AuditAction::LoginFailed, false, Utc::now())
                .with_target("user", email)
                .with_details(details)
                .with_request(meta.to_request_info()),
        );
    }

    pub(crate) fn audit_forbidden(&self, actor: &CurrentUser, meta: &RequestMeta, details: &str) {
        self.audit.record(
            AuditEntry::new(AuditAction::Forbidden, false, Utc::now())
                .with_actor(actor.id.to_string(), actor.email.clone(), actor.role.as_str())
                .with_details(details)
                .with_request(meta.to_request_info()),
        );
    }

    pub(crate) fn audit_unauthorized(&self, meta: &RequestMeta, details: &str) {
        self.audit.record(
            AuditEntry::new(AuditAction::Unauthorized, false, Utc::now())
                .with_details(details)
                .with_request(meta.to_request_info()),
        );
    }
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_audit::Severity;
    use chrono::Duration;

    fn config() -> AppConfig {
        AppConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            signing_secret: "test-signing-secret".to_string(),
            bootstrap_admin_email: "root@example.com".to_string(),
            bootstrap_admin_password: "bootstrap-pw".to_string(),
        }
    }

    fn services() -> Arc<AppServices> {
        AppServices::new(&config()).unwrap()
    }

    fn meta() -> RequestMeta {
        RequestMeta::default()
    }

    fn register(services: &AppServices, email: &str) -> (User, TokenPair) {
        services
            .register(
                RegisterRequest {
                    email: email.to_string(),
                    password: "Pw12345!".to_string(),
                    name: "Test User".to_string(),
                    organization: None,
                },
                &meta(),
            )
            .unwrap()
    }

    fn as_current(user: &User) -> CurrentUser {
        CurrentUser::new(user.id, user.email.clone(), user.role)
    }

    fn issuer(services: &AppServices) -> CurrentUser {
        let (user, _) = register(services, "issuer@example.com");
        let admin = CurrentUser::new(UserId::new(), "root@example.com".to_string(), Role::SuperAdmin);
        let user = services
            .assign_role(&admin, user.id, Role::Issuer, &meta())
            .unwrap();
        as_current(&user)
    }

    fn certificate_request(holder: UserId) -> CreateCertificateRequest {
        CreateCertificateRequest {
            title: "Advanced Rust".to_string(),
            kind: "course".to_string(),
            holder_id: holder,
            holder_name: "Alice".to_string(),
            issuing_organization: "Acme Academy".to_string(),
            skills: vec![],
            grade: None,
            score: None,
            expires_at: None,
        }
    }

    #[test]
    fn bootstrap_admin_is_seeded_once() {
        let services = services();
        let admin = services
            .users
            .get_by_email("root@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::SuperAdmin);

        // Re-seeding against an existing email is a no-op.
        services.seed_bootstrap_admin(&config()).unwrap();
        assert_eq!(services.users.list().unwrap().len(), 1);
    }

    #[test]
    fn register_defaults_to_holder() {
        let services = services();
        let (user, pair) = register(&services, "new@example.com");
        assert_eq!(user.role, Role::Holder);
        assert!(!pair.access_token.is_empty());
    }

    #[test]
    fn login_locks_after_five_failures_without_password_check() {
        let services = services();
        let (user, _) = register(&services, "victim@example.com");

        for _ in 0..5 {
            let err = services
                .login(
                    LoginRequest {
                        email: "victim@example.com".to_string(),
                        password: "wrong-password".to_string(),
                    },
                    &meta(),
                )
                .unwrap_err();
            assert_eq!(err, ApiError::InvalidCredentials);
        }

        // Sixth attempt is rejected as locked even with the right password.
        let err = services
            .login(
                LoginRequest {
                    email: "victim@example.com".to_string(),
                    password: "Pw12345!".to_string(),
                },
                &meta(),
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::AccountLocked { .. }));

        let stored = services.users.get(user.id).unwrap().unwrap();
        assert_eq!(stored.lockout.attempts, 5);
        assert!(stored.lockout.lock_until.is_some());
    }

    #[test]
    fn successful_login_resets_lockout_counters() {
        let services = services();
        let (user, _) = register(&services, "a@example.com");

        services
            .login(
                LoginRequest {
                    email: "a@example.com".to_string(),
                    password: "nope-nope".to_string(),
                },
                &meta(),
            )
            .unwrap_err();

        let (logged_in, _) = services
            .login(
                LoginRequest {
                    email: "a@example.com".to_string(),
                    password: "Pw12345!".to_string(),
                },
                &meta(),
            )
            .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(logged_in.lockout.attempts, 0);
        assert!(logged_in.last_login.is_some());
    }

    #[test]
    fn refresh_requires_a_live_active_user() {
        let services = services();
        let (user, pair) = register(&services, "r@example.com");

        assert!(services.refresh(&pair.refresh_token, &meta()).is_ok());

        // Access tokens are rejected in the refresh slot.
        assert_eq!(
            services.refresh(&pair.access_token, &meta()).unwrap_err(),
            ApiError::TokenTypeInvalid
        );

        let admin = CurrentUser::new(UserId::new(), "root@example.com".to_string(), Role::SuperAdmin);
        services
            .set_user_active(&admin, user.id, false, &meta())
            .unwrap();
        assert_eq!(
            services.refresh(&pair.refresh_token, &meta()).unwrap_err(),
            ApiError::AccountInactive
        );
    }

    #[test]
    fn admin_cannot_mint_admins() {
        let services = services();
        let admin = CurrentUser::new(UserId::new(), "a@example.com".to_string(), Role::Admin);
        let err = services
            .create_user(
                &admin,
                CreateUserRequest {
                    email: "x@example.com".to_string(),
                    password: "Pw12345!".to_string(),
                    name: "X".to_string(),
                    organization: None,
                    role: Role::Admin,
                },
                &meta(),
            )
            .unwrap_err();
        assert_eq!(err, ApiError::InsufficientPrivilege);
    }

    #[test]
    fn self_deactivation_and_self_deletion_are_rejected() {
        let services = services();
        let admin = services
            .users
            .get_by_email("root@example.com")
            .unwrap()
            .unwrap();
        let current = as_current(&admin);

        assert_eq!(
            services
                .set_user_active(&current, admin.id, false, &meta())
                .unwrap_err(),
            ApiError::SelfDeactivation
        );
        assert_eq!(
            services.delete_user(&current, admin.id, &meta()).unwrap_err(),
            ApiError::SelfDeletion
        );
    }

    #[test]
    fn issuer_creation_auto_signs() {
        let services = services();
        let issuer = issuer(&services);
        let (holder, _) = register(&services, "holder@example.com");

        let cert = services
            .create_certificate(&issuer, certificate_request(holder.id), &meta())
            .unwrap();
        assert_eq!(cert.status, attest_certs::CertificateStatus::Active);
        assert!(cert.digital_signature.is_some());
        assert_eq!(cert.issuer_id, issuer.id);
    }

    #[test]
    fn holder_reads_own_certificate_only() {
        let services = services();
        let issuer = issuer(&services);
        let (holder, _) = register(&services, "holder@example.com");
        let (other, _) = register(&services, "other@example.com");

        let cert = services
            .create_certificate(&issuer, certificate_request(holder.id), &meta())
            .unwrap();

        assert!(services
            .get_certificate(&as_current(&holder), cert.id, &meta())
            .is_ok());
        assert_eq!(
            services
                .get_certificate(&as_current(&other), cert.id, &meta())
                .unwrap_err(),
            ApiError::OwnershipRequired
        );

        assert_eq!(
            services.list_certificates(&as_current(&holder)).unwrap().len(),
            1
        );
        assert!(services
            .list_certificates(&as_current(&other))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn revocation_is_critical_and_guarded() {
        let services = services();
        let issuer = issuer(&services);
        let (holder, _) = register(&services, "holder@example.com");
        let cert = services
            .create_certificate(&issuer, certificate_request(holder.id), &meta())
            .unwrap();

        services
            .revoke_certificate(&issuer, cert.id, Some("policy violation".to_string()), &meta())
            .unwrap();
        assert_eq!(
            services
                .revoke_certificate(&issuer, cert.id, None, &meta())
                .unwrap_err(),
            ApiError::AlreadyRevoked
        );

        let revoked_entries: Vec<_> = services
            .audit_sink
            .snapshot()
            .into_iter()
            .filter(|e| e.action == AuditAction::CertificateRevoked)
            .collect();
        assert_eq!(revoked_entries.len(), 1);
        assert_eq!(revoked_entries[0].severity, Severity::Critical);
    }

    #[test]
    fn public_verify_records_history_and_one_audit_entry() {
        let services = services();
        let issuer = issuer(&services);
        let (holder, _) = register(&services, "holder@example.com");
        let cert = services
            .create_certificate(&issuer, certificate_request(holder.id), &meta())
            .unwrap();

        let (verified, report) = services
            .verify_public(&cert.verification_token, &meta())
            .unwrap();
        assert!(report.outcome.is_valid());
        assert_eq!(verified.unwrap().verification_history.len(), 1);

        let verify_entries = services
            .audit_sink
            .snapshot()
            .into_iter()
            .filter(|e| e.action == AuditAction::CertificateVerified)
            .count();
        assert_eq!(verify_entries, 1);
    }

    #[test]
    fn unknown_token_verifies_invalid_not_error() {
        let services = services();

        let (cert, report) = services.verify_public("unknown-token", &meta()).unwrap();
        assert!(cert.is_none());
        assert_eq!(report.outcome, attest_certs::VerificationOutcome::Invalid);

        // Still audited as a failed verification.
        let failed_entries = services
            .audit_sink
            .snapshot()
            .into_iter()
            .filter(|e| e.action == AuditAction::CertificateVerifyFailed)
            .count();
        assert_eq!(failed_entries, 1);
    }

    #[test]
    fn revoked_certificate_verifies_revoked_with_reason() {
        let services = services();
        let issuer = issuer(&services);
        let (holder, _) = register(&services, "holder@example.com");
        let cert = services
            .create_certificate(&issuer, certificate_request(holder.id), &meta())
            .unwrap();
        services
            .revoke_certificate(&issuer, cert.id, Some("policy violation".to_string()), &meta())
            .unwrap();

        let (_, report) = services
            .verify_public(&cert.verification_token, &meta())
            .unwrap();
        assert_eq!(report.outcome, attest_certs::VerificationOutcome::Revoked);
        assert!(report.message.contains("policy violation"));
    }

    #[test]
    fn expire_sweep_flips_past_expiry_actives() {
        let services = services();
        let issuer = issuer(&services);
        let (holder, _) = register(&services, "holder@example.com");

        let mut req = certificate_request(holder.id);
        req.expires_at = Some(Utc::now() + Duration::seconds(30));
        let cert = services.create_certificate(&issuer, req, &meta()).unwrap();

        // Backdate the expiry under the store's nose.
        let mut stored = services.certs.get(cert.id).unwrap().unwrap();
        stored.expires_at = Some(Utc::now() - Duration::days(1));
        services.certs.update(stored).unwrap();

        assert_eq!(services.expire_sweep(&issuer, &meta()).unwrap(), 1);
        assert_eq!(services.expire_sweep(&issuer, &meta()).unwrap(), 0);
    }
}
