use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
    pub oauth: OAuthConfig,
    pub uploads: UploadConfig,
    pub geocoding: GeocodingConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
    pub request_timeout: Duration,
    /// Base URL used when building links sent by email
    pub public_base_url: String,
    pub organization_name: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub secret_key: String,
    pub token_expiration_secs: i64,
    pub session_lifetime: Duration,
    pub session_cookie_secure: bool,
    /// Accounts registered with this email receive the Administrator role
    pub administrator_email: Option<String>,
}

// Keep the secret out of logs
impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("secret_key", &"***")
            .field("token_expiration_secs", &self.token_expiration_secs)
            .field("session_lifetime", &self.session_lifetime)
            .field("session_cookie_secure", &self.session_cookie_secure)
            .field("administrator_email", &self.administrator_email)
            .finish()
    }
}

/// Outbound mail settings. When `server` is unset, mail is only logged.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_ssl: bool,
    pub default_sender: String,
    pub subject_prefix: String,
}

#[derive(Debug, Clone)]
pub struct OAuthProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub google: Option<OAuthProviderCredentials>,
    pub github: Option<OAuthProviderCredentials>,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub user_images_path: PathBuf,
    pub handler_images_path: PathBuf,
    pub report_images_path: PathBuf,
    pub max_image_size: usize,
}

#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub country_codes: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            security: SecurityConfig::from_env()?,
            mail: MailConfig::from_env()?,
            oauth: OAuthConfig::from_env(),
            uploads: UploadConfig::from_env()?,
            geocoding: GeocodingConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();

        let organization_name =
            env::var("ORGANIZATION_NAME").unwrap_or_else(|_| "Ripoti Taka".to_string());

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
            request_timeout: Duration::from_secs(request_timeout_secs),
            public_base_url,
            organization_name,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl SecurityConfig {
    /// Signed cookies need at least 32 bytes of key material
    pub const MIN_SECRET_KEY_LEN: usize = 32;
    const DEFAULT_TOKEN_EXPIRATION_SECS: i64 = 3600;
    const DEFAULT_SESSION_LIFETIME_DAYS: u64 = 31;

    pub fn from_env() -> Result<Self, String> {
        let secret_key = env::var("SECRET_KEY")
            .map_err(|_| "SECRET_KEY environment variable is required".to_string())?;

        if secret_key.len() < Self::MIN_SECRET_KEY_LEN {
            return Err(format!(
                "SECRET_KEY must be at least {} characters",
                Self::MIN_SECRET_KEY_LEN
            ));
        }

        let token_expiration_secs = env::var("TOKEN_EXPIRATION_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TOKEN_EXPIRATION_SECS.to_string())
            .parse::<i64>()
            .map_err(|_| "TOKEN_EXPIRATION_SECS must be a valid number".to_string())?;

        let session_lifetime_days = env::var("SESSION_LIFETIME_DAYS")
            .unwrap_or_else(|_| Self::DEFAULT_SESSION_LIFETIME_DAYS.to_string())
            .parse::<u64>()
            .map_err(|_| "SESSION_LIFETIME_DAYS must be a valid number".to_string())?;

        let session_cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let administrator_email = env::var("ADMINISTRATOR_EMAIL")
            .ok()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());

        Ok(Self {
            secret_key,
            token_expiration_secs,
            session_lifetime: Duration::from_secs(session_lifetime_days * 24 * 60 * 60),
            session_cookie_secure,
            administrator_email,
        })
    }
}

impl MailConfig {
    const DEFAULT_SMTP_PORT: u16 = 587;

    pub fn from_env() -> Result<Self, String> {
        let server = env::var("MAIL_SERVER").ok().filter(|s| !s.is_empty());

        let port = env::var("MAIL_PORT")
            .unwrap_or_else(|_| Self::DEFAULT_SMTP_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| "MAIL_PORT must be a valid port number".to_string())?;

        let username = env::var("MAIL_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("MAIL_PASSWORD").ok().filter(|s| !s.is_empty());

        let use_ssl = env::var("MAIL_USE_SSL")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let default_sender = env::var("MAIL_DEFAULT_SENDER")
            .unwrap_or_else(|_| "Ripoti Taka <no-reply@ripoti-taka.local>".to_string());

        let subject_prefix =
            env::var("MAIL_SUBJECT_PREFIX").unwrap_or_else(|_| "[Ripoti Taka]".to_string());

        Ok(Self {
            server,
            port,
            username,
            password,
            use_ssl,
            default_sender,
            subject_prefix,
        })
    }
}

impl OAuthConfig {
    pub fn from_env() -> Self {
        Self {
            google: Self::provider("GOOGLE"),
            github: Self::provider("GITHUB"),
        }
    }

    /// Both `<NAME>_CLIENT_ID` and `<NAME>_CLIENT_SECRET` must be set
    fn provider(prefix: &str) -> Option<OAuthProviderCredentials> {
        let client_id = env::var(format!("{}_CLIENT_ID", prefix))
            .ok()
            .filter(|s| !s.is_empty())?;
        let client_secret = env::var(format!("{}_CLIENT_SECRET", prefix))
            .ok()
            .filter(|s| !s.is_empty())?;

        Some(OAuthProviderCredentials {
            client_id,
            client_secret,
        })
    }
}

impl UploadConfig {
    const DEFAULT_MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024; // 5MB

    pub fn from_env() -> Result<Self, String> {
        let user_images_path = env::var("USER_IMAGES_UPLOAD_PATH")
            .unwrap_or_else(|_| "uploads/users".to_string())
            .into();
        let handler_images_path = env::var("HANDLER_IMAGES_UPLOAD_PATH")
            .unwrap_or_else(|_| "uploads/handlers".to_string())
            .into();
        let report_images_path = env::var("REPORT_IMAGES_UPLOAD_PATH")
            .unwrap_or_else(|_| "uploads/reports".to_string())
            .into();

        let max_image_size = env::var("MAX_IMAGE_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_IMAGE_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_IMAGE_SIZE must be a valid number".to_string())?;

        Ok(Self {
            user_images_path,
            handler_images_path,
            report_images_path,
            max_image_size,
        })
    }
}

impl GeocodingConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 10;

    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("GEOCODING_BASE_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string())
            .trim_end_matches('/')
            .to_string();

        let country_codes = env::var("GEOCODING_COUNTRY_CODES").unwrap_or_else(|_| "ke".to_string());

        let timeout_secs = env::var("GEOCODING_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "GEOCODING_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            base_url,
            country_codes,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Ripoti Taka API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Waste incident reporting and handling API".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swagger_credentials_require_both_parts() {
        let mut config = SwaggerConfig {
            username: Some("admin".to_string()),
            password: None,
            title: "t".to_string(),
            version: "v".to_string(),
            description: "d".to_string(),
        };
        assert!(config.credentials().is_none());

        config.password = Some("secret".to_string());
        assert_eq!(config.credentials().as_deref(), Some("admin:secret"));
    }

    #[test]
    fn test_security_config_debug_hides_secret() {
        let config = SecurityConfig {
            secret_key: "a-very-long-secret-key-that-is-32-chars".to_string(),
            token_expiration_secs: 3600,
            session_lifetime: Duration::from_secs(60),
            session_cookie_secure: false,
            administrator_email: None,
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("a-very-long-secret"));
        assert!(printed.contains("***"));
    }
}
