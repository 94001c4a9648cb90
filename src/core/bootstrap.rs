use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

/// Create the default admin account on startup. Idempotent: guarded by an
/// existence check so restarts and multiple processes never duplicate it.
pub(crate) async fn ensure_default_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.default_admin_password.is_empty() {
        tracing::warn!("DEFAULT_ADMIN_PASSWORD not configured; skipping default admin creation");
        return Ok(());
    }

    if repositories::users::any_admin_exists(state.db()).await? {
        tracing::info!("Admin account already exists; skipping default admin creation");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.default_admin_password)?;
    let now = primitive_now_utc();

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &admin.default_admin_username,
            email: &admin.default_admin_email,
            hashed_password,
            is_admin: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!(username = %user.username, "Created default admin user");
    Ok(())
}
