//! Identity and OAuth profile records.
//!
//! # Invariants
//! - JSON field names match the persisted key space (`profileImgUrl`).
//! - An OAuth profile maps to an identity only when `name` and `email` are
//!   both non-empty.

use serde::{Deserialize, Serialize};

/// Cached account data for one signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    /// Identity key inside the stored account list.
    pub email: String,
    /// Avatar URL; empty when the provider sent none.
    #[serde(rename = "profileImgUrl", default)]
    pub profile_img_url: String,
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        profile_img_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            profile_img_url: profile_img_url.into(),
        }
    }
}

/// Profile payload written under `oauth_profile` by the sign-in callback.
///
/// Fields are optional because the payload comes from outside the core and
/// is validated on conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl OAuthProfile {
    /// Maps the profile to an identity, or `None` when name or email is
    /// missing or empty.
    pub fn to_identity(&self) -> Option<Identity> {
        let name = self.name.as_deref().filter(|value| !value.is_empty())?;
        let email = self.email.as_deref().filter(|value| !value.is_empty())?;
        Some(Identity::new(
            name,
            email,
            self.picture.clone().unwrap_or_default(),
        ))
    }
}
