use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::{search_result::TrustedDomains, table::QualityThresholds};

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub api_keys: ApiKeySettings,
    pub llm: LlmSettings,
    pub web_search: WebSearchSettings,
    pub catalog: CatalogSettings,
    pub quality: QualitySettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub frontend_origin: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApiKeySettings {
    pub tavily: String,
    pub openai: String,
}

impl ApiKeySettings {
    pub fn tavily(&self) -> Option<&str> {
        configured(&self.tavily)
    }

    pub fn openai(&self) -> Option<&str> {
        configured(&self.openai)
    }
}

// Empty keys and unexpanded "your_..._here" placeholders both mean the
// component runs in mock mode.
fn configured(key: &str) -> Option<&str> {
    let key = key.trim();
    match key.is_empty() || key.starts_with("your_") {
        true => None,
        false => Some(key),
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct LlmSettings {
    pub chat_model: String,
    pub embedding_model: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct WebSearchSettings {
    pub base_url: String,
    pub general_min_score: u8,
    pub data_min_score: u8,
    pub unclassified_score: u8,
    pub gov_domains: Vec<String>,
    pub market_report_domains: Vec<String>,
    pub news_domains: Vec<String>,
}

impl WebSearchSettings {
    pub fn trusted_domains(&self) -> TrustedDomains {
        TrustedDomains {
            gov: self.gov_domains.clone(),
            market_report: self.market_report_domains.clone(),
            news: self.news_domains.clone(),
            unclassified_score: self.unclassified_score,
        }
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct CatalogSettings {
    pub base_url: String,
    pub source_name: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_size: u32,
    pub max_candidates: usize,
    pub authority_organizations: Vec<String>,
}

#[derive(serde::Deserialize, Clone)]
pub struct QualitySettings {
    pub min_rows: usize,
    pub min_data_density: f64,
}

impl QualitySettings {
    pub fn thresholds(&self) -> QualityThresholds {
        QualityThresholds {
            min_rows: self.min_rows,
            min_data_density: self.min_data_density,
        }
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT.");
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let mut settings = settings.try_deserialize::<Settings>()?;

    // The conventional key variables win over the yaml layer.
    if let Ok(key) = std::env::var("TAVILY_API_KEY") {
        settings.api_keys.tavily = key;
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        settings.api_keys.openai = key;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::configured;

    #[test]
    fn placeholder_keys_count_as_unconfigured() {
        assert_eq!(configured(""), None);
        assert_eq!(configured("   "), None);
        assert_eq!(configured("your_tavily_api_key_here"), None);
        assert_eq!(configured("tvly-abc123"), Some("tvly-abc123"));
    }
}
