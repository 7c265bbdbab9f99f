use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::session::{Profile, Session};
use crate::types::Account;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

pub const LOGIN_PATH: &str = "accounts/login/";
pub const REGISTER_PATH: &str = "accounts/register/";
pub const REFRESH_PATH: &str = "accounts/token/refresh/";
pub const DELETE_ACCOUNT_PATH: &str = "accounts/account/delete/";

/// Token pair plus profile, as returned by both the login and the refresh
/// endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub organization_name: Option<String>,
}

impl TokenGrant {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let grant: TokenGrant = serde_json::from_str(body)?;
        if grant.access.trim().is_empty() {
            return Err(serde_json::Error::custom("access token is empty"));
        }
        Ok(grant)
    }

    fn into_session(self) -> Session {
        Session {
            access_token: self.access,
            refresh_token: self.refresh,
            profile: Profile {
                name: self.name,
                role: self.role,
                organization_name: self.organization_name,
            },
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub organization_name: String,
    pub password: String,
}

impl ApiClient {
    /// Exchanges credentials for a token pair and stores it as the new
    /// session, replacing whatever was stored before.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).json(&Credentials {
            email: email.trim(),
            password,
        })?;
        let response = self.send_anonymous(request).await?;
        let grant = TokenGrant::parse(&response.body)?;

        self.session().clear()?;
        self.session().persist_grant(&grant)?;
        tracing::info!(role = grant.role.as_deref().unwrap_or("-"), "signed in");
        Ok(grant.into_session())
    }

    /// Creates an organization owner account. Does not sign in.
    pub async fn register(&self, registration: &Registration) -> Result<Account, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).json(registration)?;
        self.send_anonymous(request).await?.json()
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.end_session()?;
        tracing::info!("signed out");
        Ok(())
    }

    /// Deletes the signed-in account, then ends the local session.
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(DELETE_ACCOUNT_PATH)).await?;
        self.end_session()?;
        tracing::info!("account deleted");
        Ok(())
    }
}
