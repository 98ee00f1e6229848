use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub model: ModelConfig,
    pub labels: LabelsConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

pub trait Validatable {
    fn get_path(&self) -> PathBuf;

    fn validate(&self) -> Result<(), String> {
        let path = self.get_path();
        if !path.exists() {
            return Err(format!("File not found: {:?}", path));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    pub onnx_file: String,
    pub input_width: Option<u32>,
    pub input_height: Option<u32>,
    #[serde(default = "default_image_mean")]
    pub image_mean: f32,
    #[serde(default = "default_image_std")]
    pub image_std: f32,
    #[serde(default = "default_probability_mean")]
    pub probability_mean: f32,
    #[serde(default = "default_probability_std")]
    pub probability_std: f32,
}

fn default_image_mean() -> f32 {
    0.0
}

fn default_image_std() -> f32 {
    1.0
}

fn default_probability_mean() -> f32 {
    0.0
}

fn default_probability_std() -> f32 {
    255.0
}

impl Validatable for ModelConfig {
    fn get_path(&self) -> PathBuf {
        self.model_dir.join(&self.onnx_file)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LabelsConfig {
    pub labels_dir: PathBuf,
    pub labels_file: String,
    #[serde(default = "default_plastics_file")]
    pub plastics_file: String,
    #[serde(default = "default_papers_file")]
    pub papers_file: String,
    #[serde(default = "default_metals_file")]
    pub metals_file: String,
    #[serde(default = "default_glass_file")]
    pub glass_file: String,
}

fn default_plastics_file() -> String {
    "plastics.txt".to_string()
}

fn default_papers_file() -> String {
    "papers.txt".to_string()
}

fn default_metals_file() -> String {
    "metals.txt".to_string()
}

fn default_glass_file() -> String {
    "glass.txt".to_string()
}

impl LabelsConfig {
    pub fn category_path(&self, file_name: &str) -> PathBuf {
        self.labels_dir.join(file_name)
    }
}

// Category lists are optional, only the model label list is checked.
impl Validatable for LabelsConfig {
    fn get_path(&self) -> PathBuf {
        self.labels_dir.join(&self.labels_file)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    5
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
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

#[derive(Debug, Deserialize, Clone)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(format!("{}.yaml", environment.as_str())),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings: Config = settings.try_deserialize::<Config>()?;

    for result in [settings.model.validate(), settings.labels.validate()] {
        if let Err(e) = result {
            tracing::error!("Configuration validation failed: {}", e);
            return Err(config::ConfigError::Message(e));
        }
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert!(matches!(
            Environment::try_from("Production".to_string()),
            Ok(Environment::Production)
        ));
        assert!(Environment::try_from("staging".to_string()).is_err());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::try_from("DEBUG".to_string()).unwrap().as_str(), "debug");
        assert!(LogLevel::try_from("trace".to_string()).is_err());
    }

    #[test]
    fn test_model_path_validation() {
        let model = ModelConfig {
            model_dir: PathBuf::from("./does_not_exist"),
            onnx_file: "model.onnx".to_string(),
            input_width: None,
            input_height: None,
            image_mean: default_image_mean(),
            image_std: default_image_std(),
            probability_mean: default_probability_mean(),
            probability_std: default_probability_std(),
        };

        assert_eq!(
            model.get_path(),
            PathBuf::from("./does_not_exist/model.onnx")
        );
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
log_level: debug
server:
  host: 0.0.0.0
  port: 50051
model:
  model_dir: models
  onnx_file: mobilenet_v1_1.0_224_quant.onnx
labels:
  labels_dir: assets
  labels_file: labels_mobilenet_quant_v1_224.txt
"#;
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.get_address(), "0.0.0.0:50051");
        assert_eq!(config.log_level.as_str(), "debug");
        assert_eq!(config.model.probability_std, 255.0);
        assert_eq!(config.labels.glass_file, "glass.txt");
        assert_eq!(config.service.max_results, 5);
        assert_eq!(
            config.labels.category_path(&config.labels.plastics_file),
            PathBuf::from("assets/plastics.txt")
        );
    }
}
