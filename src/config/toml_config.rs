use crate::domain::model::MissingNumeric;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_LISTING_URL: &str =
    "https://www.gov.br/anp/pt-br/centrais-de-conteudo/dados-abertos/producao-de-petroleo-e-gas-natural-por-poco";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub dataset: DatasetConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub listing_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub min_year: i32,
    /// Hrefs must contain one of these; empty accepts any CSV link.
    pub link_keywords: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            timeout_seconds: 60,
            user_agent: concat!("anp-etl/", env!("CARGO_PKG_VERSION")).to_string(),
            min_year: 1941,
            link_keywords: vec!["mar".to_string(), "producao_por_poco".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub delimiter: String,
    pub fallback_encoding: String,
    pub missing_numeric: MissingNumeric,
    pub derived_metrics: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            delimiter: ";".to_string(),
            fallback_encoding: "windows-1252".to_string(),
            missing_numeric: MissingNumeric::Null,
            derived_metrics: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    /// `{year}` is replaced by the year label.
    pub filename: String,
    pub sheet_name: String,
    pub column_width: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            filename: "producao_anp_{year}.xlsx".to_string(),
            sheet_name: "Sheet1".to_string(),
            column_width: 15.0,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ANP_LISTING_URL})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("source.listing_url", &self.source.listing_url)?;
        validation::validate_range("source.timeout_seconds", self.source.timeout_seconds, 1, 600)?;
        validation::validate_non_empty_string("source.user_agent", &self.source.user_agent)?;
        validation::validate_range("source.min_year", self.source.min_year, 1900, 2100)?;

        validation::validate_delimiter("dataset.delimiter", &self.dataset.delimiter)?;
        validation::validate_encoding_label(
            "dataset.fallback_encoding",
            &self.dataset.fallback_encoding,
        )?;

        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_non_empty_string("load.filename", &self.load.filename)?;
        validation::validate_file_extensions(
            "load.filename",
            std::slice::from_ref(&self.load.filename),
            &["xlsx"],
        )?;
        validation::validate_non_empty_string("load.sheet_name", &self.load.sheet_name)?;
        if !(self.load.column_width > 0.0 && self.load.column_width <= 255.0) {
            return Err(EtlError::InvalidConfigValueError {
                field: "load.column_width".to_string(),
                value: self.load.column_width.to_string(),
                reason: "Width must be greater than 0 and at most 255".to_string(),
            });
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn listing_url(&self) -> &str {
        &self.source.listing_url
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds)
    }

    fn user_agent(&self) -> &str {
        &self.source.user_agent
    }

    fn min_year(&self) -> i32 {
        self.source.min_year
    }

    fn link_keywords(&self) -> &[String] {
        &self.source.link_keywords
    }

    fn delimiter(&self) -> u8 {
        // validate_config 已檢查過
        self.dataset.delimiter.as_bytes().first().copied().unwrap_or(b';')
    }

    fn fallback_encoding(&self) -> &'static encoding_rs::Encoding {
        encoding_rs::Encoding::for_label(self.dataset.fallback_encoding.trim().as_bytes())
            .unwrap_or(encoding_rs::WINDOWS_1252)
    }

    fn missing_numeric(&self) -> MissingNumeric {
        self.dataset.missing_numeric
    }

    fn derived_metrics(&self) -> bool {
        self.dataset.derived_metrics
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_filename(&self, label: &str) -> String {
        self.load.filename.replace("{year}", label)
    }

    fn sheet_name(&self) -> &str {
        &self.load.sheet_name
    }

    fn column_width(&self) -> f64 {
        self.load.column_width
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
