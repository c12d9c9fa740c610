//! Configuração do intake carregada a partir de `lumos.toml`.
//!
//! A struct [`IntakeConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `LUMOS_API_URL` tem precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::api::MIB;
use crate::error::IntakeError;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "lumos.toml";

/// Variável de ambiente que sobrescreve `api_base_url`.
pub const API_URL_ENV_VAR: &str = "LUMOS_API_URL";

/// Configuração de nível superior carregada de `lumos.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeConfig {
    /// Raiz dos serviços de perfil e upload.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout de cada requisição, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Tamanho máximo aceito para um documento.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Tamanho dos blocos enviados; define a granularidade do progresso.
    #[serde(default = "default_upload_chunk_bytes")]
    pub upload_chunk_bytes: usize,

    /// Duração da extração simulada do currículo, em milissegundos.
    #[serde(default = "default_extraction_duration_ms")]
    pub extraction_duration_ms: u64,

    /// Intervalo de consulta do progresso da extração, em milissegundos.
    #[serde(default = "default_extraction_poll_ms")]
    pub extraction_poll_ms: u64,

    /// Atraso da tela de processamento após a conclusão, em segundos.
    #[serde(default = "default_processing_delay_secs")]
    pub processing_delay_secs: u64,
}

// Valor padrão da URL base: o backend local.
fn default_api_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

// Valor padrão do timeout: 10s.
fn default_request_timeout_secs() -> u64 {
    10
}

// Valor padrão do limite de upload: 10 MiB.
fn default_max_upload_bytes() -> u64 {
    10 * MIB
}

fn default_upload_chunk_bytes() -> usize {
    64 * 1024
}

// Valor padrão da extração: 3000ms, consultada a cada 100ms.
fn default_extraction_duration_ms() -> u64 {
    3000
}

fn default_extraction_poll_ms() -> u64 {
    100
}

// Valor padrão da tela de processamento: 30s.
fn default_processing_delay_secs() -> u64 {
    30
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
            upload_chunk_bytes: default_upload_chunk_bytes(),
            extraction_duration_ms: default_extraction_duration_ms(),
            extraction_poll_ms: default_extraction_poll_ms(),
            processing_delay_secs: default_processing_delay_secs(),
        }
    }
}

impl IntakeConfig {
    /// Carrega a configuração de `lumos.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, IntakeError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito, aplicando a variável de ambiente.
    pub fn load_from(path: &Path) -> Result<Self, IntakeError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<IntakeConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo para a URL base.
        if let Ok(url) = std::env::var(API_URL_ENV_VAR)
            && !url.is_empty()
        {
            config.api_base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), IntakeError> {
        if self.extraction_poll_ms == 0 {
            return Err(IntakeError::Config(
                "extraction_poll_ms must be greater than zero".into(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(IntakeError::Config(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn extraction_duration(&self) -> Duration {
        Duration::from_millis(self.extraction_duration_ms)
    }

    pub fn extraction_poll_interval(&self) -> Duration {
        Duration::from_millis(self.extraction_poll_ms)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_secs(self.processing_delay_secs)
    }
}
