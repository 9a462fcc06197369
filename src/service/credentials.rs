use crate::db::sqlite::AccountsStorage;
use crate::error::GateError;
use crate::service::roster::Account;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Decides whether a submitted password matches what is stored.
pub trait SecretVerifier: Send + Sync {
    fn matches(&self, stored: &str, submitted: &str) -> bool;
}

/// Stored secrets are plaintext; compare bytes in constant time.
pub struct PlaintextVerifier;

impl SecretVerifier for PlaintextVerifier {
    fn matches(&self, stored: &str, submitted: &str) -> bool {
        bool::from(stored.as_bytes().ct_eq(submitted.as_bytes()))
    }
}

/// Immutable username -> secret table, exact-match lookups.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    table: HashMap<String, String>,
}

impl StaticCredentials {
    /// The first entry for a username wins, as with seeding.
    pub fn from_roster(accounts: &[Account]) -> Self {
        let mut table = HashMap::with_capacity(accounts.len());
        for a in accounts {
            table
                .entry(a.username.clone())
                .or_insert_with(|| a.password.clone());
        }
        Self { table }
    }

    fn secret_for(&self, username: &str) -> Option<&str> {
        self.table.get(username).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[derive(Clone)]
pub enum CredentialSource {
    Static(Arc<StaticCredentials>),
    Persisted(AccountsStorage),
}

/// Credential lookup plus the comparison seam.
#[derive(Clone)]
pub struct CredentialStore {
    backend: CredentialSource,
    verifier: Arc<dyn SecretVerifier>,
}

impl CredentialStore {
    pub fn new(backend: CredentialSource) -> Self {
        Self::with_verifier(backend, Arc::new(PlaintextVerifier))
    }

    pub fn with_verifier(backend: CredentialSource, verifier: Arc<dyn SecretVerifier>) -> Self {
        Self { backend, verifier }
    }

    /// `Ok(false)` for both unknown usernames and wrong passwords.
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, GateError> {
        let stored = match &self.backend {
            CredentialSource::Static(table) => table.secret_for(username).map(str::to_owned),
            CredentialSource::Persisted(storage) => storage
                .find_by_username(username)
                .await?
                .map(|row| row.password),
        };
        Ok(stored.is_some_and(|s| self.verifier.matches(&s, password)))
    }
}
