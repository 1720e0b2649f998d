use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// S3-compatible bucket that backs every uploaded image.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Base used to build public object URLs; falls back to `endpoint/bucket`.
    pub public_base_url: Option<String>,
}

/// Chat-completion provider used by the outfit advisor.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub fallback_model: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApparelConfig {
    pub csv_path: String,
    /// 0 means no limit.
    pub row_limit: usize,
}

/// Multimodal image-generation model used for virtual try-on.
#[derive(Debug, Clone, Deserialize)]
pub struct TryOnConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Hosted garment classification model.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model_id: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub advisor: AdvisorConfig,
    pub apparel: ApparelConfig,
    pub tryon: TryOnConfig,
    pub classifier: ClassifierConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "wardrobe"),
            audience: env_or("JWT_AUDIENCE", "wardrobe-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let storage = StorageConfig {
            endpoint: env_or("S3_ENDPOINT", "http://localhost:9000"),
            bucket: env_or("S3_BUCKET", "wardrobe"),
            access_key: env_or("S3_ACCESS_KEY", "minioadmin"),
            secret_key: env_or("S3_SECRET_KEY", "minioadmin"),
            region: env_or("S3_REGION", "us-east-1"),
            public_base_url: env_opt("S3_PUBLIC_BASE_URL"),
        };
        let advisor = AdvisorConfig {
            api_key: env_opt("OPENROUTER_API_KEY"),
            base_url: env_or("OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1"),
            model: env_or("OPENROUTER_MODEL", "gpt-4o-mini"),
            fallback_model: env_opt("OPENROUTER_FALLBACK_MODEL"),
            timeout_secs: env_parse("OPENROUTER_TIMEOUT_SECS", 30),
            max_tokens: env_parse("OPENROUTER_MAX_TOKENS", 512),
            temperature: env_parse("OPENROUTER_TEMPERATURE", 0.2),
        };
        let apparel = ApparelConfig {
            csv_path: env_or("APPAREL_CSV_PATH", "data/apparel_only.csv"),
            row_limit: env_parse("APPAREL_ROW_LIMIT", 20_000),
        };
        let tryon = TryOnConfig {
            api_key: env_opt("GEMINI_API_KEY"),
            base_url: env_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            model: env_or("GEMINI_IMAGE_MODEL", "gemini-2.0-flash-exp-image-generation"),
            timeout_secs: env_parse("GEMINI_TIMEOUT_SECS", 120),
        };
        let classifier = ClassifierConfig {
            api_key: env_opt("ROBOFLOW_API_KEY"),
            api_url: env_or("ROBOFLOW_API_URL", "https://serverless.roboflow.com"),
            model_id: env_or("ROBOFLOW_MODEL_ID", "clothing-classifier-w73mm-ehldp/1"),
            timeout_secs: env_parse("ROBOFLOW_TIMEOUT_SECS", 30),
        };
        Ok(Self {
            database_url,
            jwt,
            storage,
            advisor,
            apparel,
            tryon,
            classifier,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
