use chrono::Utc;
use google_cloud_auth::credentials::CacheableResource;
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Lifetime of a self-signed service account token
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Errors raised while loading or using Google credentials
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Failed to read credentials file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid credentials file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Credentials file is missing '{0}'")]
    MissingField(&'static str),

    #[error("Private key is not a valid RSA key: {0}")]
    InvalidKey(jsonwebtoken::errors::Error),

    #[error("Failed to sign access token: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("Application Default Credentials unavailable: {0}")]
    ApplicationDefault(String),

    #[error("Access token is not a valid header value")]
    InvalidToken(#[from] http::header::InvalidHeaderValue),
}

/// Where outbound credentials come from, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource<'a> {
    Disabled,
    KeyFile(&'a str),
    AccessToken(&'a str),
    ApplicationDefault,
}

impl<'a> CredentialSource<'a> {
    /// Empty values count as unset. With nothing configured this falls back
    /// to Application Default Credentials.
    pub fn select(
        credentials_file: Option<&'a str>,
        access_token: Option<&'a str>,
        disable_auth: bool,
    ) -> Self {
        if disable_auth {
            return CredentialSource::Disabled;
        }
        if let Some(path) = credentials_file.filter(|p| !p.is_empty()) {
            return CredentialSource::KeyFile(path);
        }
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            return CredentialSource::AccessToken(token);
        }
        CredentialSource::ApplicationDefault
    }
}

/// How outbound prediction calls authenticate
#[derive(Clone, Default)]
pub enum Credentials {
    /// No `Authorization` header is sent
    #[default]
    None,
    /// Pre-issued OAuth access token
    AccessToken(String),
    /// Service account key used to sign a JWT per call
    ServiceAccount(ServiceAccountCredentials),
    /// Application Default Credentials: gcloud user login, a key named by
    /// `GOOGLE_APPLICATION_CREDENTIALS`, or the GCE/Cloud Run metadata server
    ApplicationDefault(google_cloud_auth::credentials::Credentials),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::AccessToken(_) => f.write_str("AccessToken([redacted])"),
            Credentials::ServiceAccount(sa) => f.debug_tuple("ServiceAccount").field(sa).finish(),
            Credentials::ApplicationDefault(_) => f.write_str("ApplicationDefault"),
        }
    }
}

impl Credentials {
    pub fn resolve(
        credentials_file: Option<&str>,
        access_token: Option<&str>,
        disable_auth: bool,
    ) -> Result<Self, CredentialsError> {
        match CredentialSource::select(credentials_file, access_token, disable_auth) {
            CredentialSource::Disabled => Ok(Credentials::None),
            CredentialSource::KeyFile(path) => Ok(Credentials::ServiceAccount(
                ServiceAccountCredentials::from_file(path)?,
            )),
            CredentialSource::AccessToken(token) => Ok(Credentials::AccessToken(token.to_string())),
            CredentialSource::ApplicationDefault => Self::application_default(),
        }
    }

    pub fn application_default() -> Result<Self, CredentialsError> {
        google_cloud_auth::credentials::Builder::default()
            .build()
            .map(Credentials::ApplicationDefault)
            .map_err(|e| CredentialsError::ApplicationDefault(e.to_string()))
    }

    /// Headers authenticating a request to `audience`
    pub async fn auth_headers(&self, audience: &str) -> Result<HeaderMap, CredentialsError> {
        let token = match self {
            Credentials::None => return Ok(HeaderMap::new()),
            Credentials::AccessToken(token) => token.clone(),
            Credentials::ServiceAccount(sa) => sa.sign_token(audience)?,
            Credentials::ApplicationDefault(creds) => {
                let headers = creds
                    .headers(http::Extensions::default())
                    .await
                    .map_err(|e| CredentialsError::ApplicationDefault(e.to_string()))?;
                return match headers {
                    CacheableResource::New { data, .. } => Ok(data),
                    // No entity tag is passed in, so the SDK always returns fresh headers
                    CacheableResource::NotModified => Err(CredentialsError::ApplicationDefault(
                        "credentials returned no headers".to_string(),
                    )),
                };
            }
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Credentials::None => "none",
            Credentials::AccessToken(_) => "access token",
            Credentials::ServiceAccount(_) => "service account",
            Credentials::ApplicationDefault(_) => "application default",
        }
    }
}

/// Signing material taken from a service account JSON key
#[derive(Clone)]
pub struct ServiceAccountCredentials {
    private_key_id: String,
    private_key: EncodingKey,
    client_email: String,
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"[redacted]")
            .field("client_email", &self.client_email)
            .finish()
    }
}

#[derive(Deserialize)]
struct ServiceAccountKeyFile {
    private_key_id: Option<String>,
    private_key: Option<String>,
    client_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl ServiceAccountCredentials {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CredentialsError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| CredentialsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, CredentialsError> {
        let key_file: ServiceAccountKeyFile = serde_json::from_str(contents)?;

        let private_key_id = key_file
            .private_key_id
            .ok_or(CredentialsError::MissingField("private_key_id"))?;
        let private_key = key_file
            .private_key
            .ok_or(CredentialsError::MissingField("private_key"))?;
        let client_email = key_file
            .client_email
            .ok_or(CredentialsError::MissingField("client_email"))?;

        Ok(Self {
            private_key_id,
            private_key: EncodingKey::from_rsa_pem(private_key.as_bytes())
                .map_err(CredentialsError::InvalidKey)?,
            client_email,
        })
    }

    /// Self-signed RS256 JWT accepted by Google APIs in place of an OAuth token
    pub fn sign_token(&self, audience: &str) -> Result<String, CredentialsError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.private_key_id.clone());

        let iat = Utc::now().timestamp();
        let claims = Claims {
            iss: self.client_email.clone(),
            sub: self.client_email.clone(),
            aud: audience.to_string(),
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };

        encode(&header, &claims, &self.private_key).map_err(CredentialsError::Signing)
    }
}
