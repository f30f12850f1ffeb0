//! Account use cases: OAuth sign-in and lookup.

use tracing::info;
use uuid::Uuid;

use inkwell_core::{
    Account, AccountRepository, Error, OAuthAccountInput, Result, Storage,
};

use super::{finish, require_text};

#[derive(Clone)]
pub struct AccountService<S> {
    storage: S,
}

impl<S: Storage> AccountService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create or refresh the account behind an OAuth identity.
    ///
    /// Signing in stamps `last_login_at` and re-activates a deactivated account.
    pub async fn sign_in(&self, mut input: OAuthAccountInput) -> Result<Account> {
        require_text("provider", &input.provider)?;
        require_text("providerAccountId", &input.provider_account_id)?;
        input.email = input.email.trim().to_string();
        if input.email.is_empty() || !input.email.contains('@') {
            return Err(Error::InvalidInput(format!(
                "invalid email address '{}'",
                input.email
            )));
        }

        let mut tx = self.storage.begin().await?;
        let result = self
            .storage
            .accounts()
            .upsert_oauth_account(&mut tx, input)
            .await;
        let account = finish(&self.storage, tx, result).await?;

        info!(
            subsystem = "api",
            component = "accounts",
            op = "sign_in",
            owner_id = %account.id,
            provider = %account.provider,
            "Account signed in"
        );
        Ok(account)
    }

    pub async fn get(&self, id: Uuid) -> Result<Account> {
        let mut tx = self.storage.begin().await?;
        let result = self.storage.accounts().get_by_id(&mut tx, id).await;
        finish(&self.storage, tx, result).await
    }
}
