//! Identity bridge between the account store and an OAuth provider.

use crate::model::identity::{Identity, OAuthProfile};
use crate::service::account_service::{AccountError, AccountService};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const GOOGLE_PROVIDER: &str = "google";
pub const OAUTH_CALLBACK_PATH: &str = "/oauth/callback";
pub const SELECT_ACCOUNT_PROMPT: &str = "select_account consent";
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/gmail.readonly",
];

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug)]
pub enum BridgeError {
    MissingEmail,
    IncompleteProfile,
    Provider {
        provider_id: String,
        message: String,
    },
    Account(AccountError),
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEmail => write!(f, "email is required to switch accounts"),
            Self::IncompleteProfile => write!(f, "oauth profile is missing name or email"),
            Self::Provider {
                provider_id,
                message,
            } => write!(f, "provider `{provider_id}` failed to start sign-in: {message}"),
            Self::Account(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Account(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AccountError> for BridgeError {
    fn from(value: AccountError) -> Self {
        Self::Account(value)
    }
}

/// Parameters handed to the provider to start one sign-in flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRequest {
    pub provider: String,
    pub redirect_to: String,
    pub scopes: Vec<String>,
    /// Pre-selects an account in the provider's picker.
    pub login_hint: Option<String>,
    pub prompt: String,
}

impl SignInRequest {
    /// Space-separated scope list as OAuth expects it.
    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

/// External OAuth collaborator.
///
/// Implementations start the flow and return; completion is observed later
/// through the `oauth_profile` key.
pub trait IdentityProvider: Send + Sync {
    fn provider_id(&self) -> &str;
    fn start_sign_in(&self, request: &SignInRequest) -> BridgeResult<()>;
}

/// Account switching and onboarding through one provider.
pub struct IdentityBridge {
    provider: Arc<dyn IdentityProvider>,
    accounts: Arc<AccountService>,
    redirect_to: String,
}

impl IdentityBridge {
    /// `origin` is the app origin the provider redirects back to.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        accounts: Arc<AccountService>,
        origin: &str,
    ) -> Self {
        Self {
            provider,
            accounts,
            redirect_to: format!("{}{OAUTH_CALLBACK_PATH}", origin.trim_end_matches('/')),
        }
    }

    pub fn sign_in_request(&self, login_hint: Option<&str>) -> SignInRequest {
        SignInRequest {
            provider: GOOGLE_PROVIDER.to_string(),
            redirect_to: self.redirect_to.clone(),
            scopes: DEFAULT_SCOPES.iter().map(|scope| scope.to_string()).collect(),
            login_hint: login_hint.map(str::to_string),
            prompt: SELECT_ACCOUNT_PROMPT.to_string(),
        }
    }

    /// Starts sign-in pre-selecting `email`.
    pub fn switch_to_account(&self, email: &str) -> BridgeResult<()> {
        if email.is_empty() {
            return Err(BridgeError::MissingEmail);
        }
        self.start(self.sign_in_request(Some(email)))
    }

    /// Starts sign-in with the provider's account picker.
    pub fn add_account(&self) -> BridgeResult<()> {
        self.start(self.sign_in_request(None))
    }

    /// Activates `identity` locally, then asks the provider to switch.
    ///
    /// Only the local write can fail the call; a provider failure is
    /// logged since the local switch already happened.
    pub fn select_account(&self, identity: &Identity) -> BridgeResult<()> {
        if identity.email.is_empty() {
            return Err(BridgeError::MissingEmail);
        }
        self.accounts.update_active_account(identity)?;
        if let Err(err) = self.switch_to_account(&identity.email) {
            error!("event=account_select module=auth status=error error={err}");
        }
        Ok(())
    }

    /// Stores the profile returned by a completed sign-in and activates it.
    pub fn store_account_from_oauth(&self, profile: &OAuthProfile) -> BridgeResult<Identity> {
        let identity = profile
            .to_identity()
            .ok_or(BridgeError::IncompleteProfile)?;
        self.accounts.store_account(&identity)?;
        Ok(identity)
    }

    fn start(&self, request: SignInRequest) -> BridgeResult<()> {
        let has_hint = request.login_hint.is_some();
        match self.provider.start_sign_in(&request) {
            Ok(()) => {
                info!(
                    "event=sign_in_start module=auth status=ok provider={} login_hint={has_hint}",
                    self.provider.provider_id()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=sign_in_start module=auth status=error provider={} error={err}",
                    self.provider.provider_id()
                );
                Err(err)
            }
        }
    }
}
