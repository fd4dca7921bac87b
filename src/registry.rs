//! Company-registry collaborator contract.
//!
//! The pipeline itself never performs I/O; callers enrich their results
//! with registry data before or after running it. The CNPJ hygiene
//! helpers below are always available; the HTTP client against BrasilAPI
//! is compiled only with the `registry` feature.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CNPJ_DIGITS: usize = 14;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid CNPJ: expected {CNPJ_DIGITS} digits, got {0}")]
    InvalidCnpj(usize),

    #[error("company {0} not found in the federal registry")]
    NotFound(String),

    #[error("registry lookup timed out")]
    Timeout,

    #[error("could not reach the company registry: {0}")]
    ConnectionFailure(String),

    #[error("registry returned an unexpected response (status {0})")]
    UpstreamError(u16),
}

/// Registry data about a company, as far as the upstream source provides
/// it. Everything beyond the name is best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub legal_name: String,
    pub cnpj: String,
    pub main_activity_code: Option<String>,
    pub main_activity: Option<String>,
    pub registration_status: Option<String>,
    pub tax_regime: Option<String>,
    pub state: Option<String>,
    pub municipality: Option<String>,
}

/// Strip formatting from a CNPJ and validate its length.
pub fn clean_cnpj(raw: &str) -> Result<String, RegistryError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != CNPJ_DIGITS {
        return Err(RegistryError::InvalidCnpj(digits.len()));
    }
    Ok(digits)
}

/// Render a clean 14-digit CNPJ as `XX.XXX.XXX/XXXX-XX`. Anything else is
/// returned unchanged.
pub fn format_cnpj(digits: &str) -> String {
    if digits.len() != CNPJ_DIGITS || !digits.chars().all(|c| c.is_ascii_digit()) {
        return digits.to_string();
    }
    format!(
        "{}.{}.{}/{}-{}",
        &digits[..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..]
    )
}

#[cfg(feature = "registry")]
pub use client::BrasilApiRegistry;

#[cfg(feature = "registry")]
mod client {
    use super::{clean_cnpj, format_cnpj, CompanyProfile, RegistryError};
    use log::{debug, info};
    use serde_json::Value;
    use std::time::Duration;

    const BRASIL_API_BASE_URL: &str = "https://brasilapi.com.br/api/cnpj/v1";
    const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

    /// Client for the public BrasilAPI company registry.
    #[derive(Clone)]
    pub struct BrasilApiRegistry {
        client: reqwest::Client,
        base_url: String,
    }

    impl BrasilApiRegistry {
        pub fn new() -> Self {
            Self::with_base_url(BRASIL_API_BASE_URL.to_string())
        }

        pub fn with_base_url(base_url: String) -> Self {
            Self {
                client: reqwest::Client::new(),
                base_url,
            }
        }

        pub async fn lookup(&self, cnpj: &str) -> Result<CompanyProfile, RegistryError> {
            let digits = clean_cnpj(cnpj)?;
            let url = format!("{}/{}", self.base_url, digits);

            let response = self
                .client
                .get(&url)
                .timeout(LOOKUP_TIMEOUT)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        RegistryError::Timeout
                    } else {
                        RegistryError::ConnectionFailure(e.to_string())
                    }
                })?;

            match response.status().as_u16() {
                200 => {}
                404 => return Err(RegistryError::NotFound(digits)),
                status => return Err(RegistryError::UpstreamError(status)),
            }

            let body: Value = response
                .json()
                .await
                .map_err(|e| RegistryError::ConnectionFailure(e.to_string()))?;

            let profile = parse_profile(&digits, &body);
            info!("registry data obtained for {}", profile.legal_name);
            debug!(
                "registry fields: activity={:?} status={:?} regime={:?}",
                profile.main_activity_code, profile.registration_status, profile.tax_regime
            );

            Ok(profile)
        }
    }

    impl Default for BrasilApiRegistry {
        fn default() -> Self {
            Self::new()
        }
    }

    // The upstream payload shape has shifted over time; each field is
    // probed through its known spellings, newest first.
    fn parse_profile(digits: &str, body: &Value) -> CompanyProfile {
        let legal_name = string_field(body, &["razao_social", "nome"])
            .unwrap_or_else(|| "N/A".to_string());

        let mut main_activity_code = match body.get("cnae_fiscal") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let mut main_activity = string_field(body, &["cnae_fiscal_descricao"]);

        if main_activity_code.is_none() {
            if let Some(activity) = body
                .get("atividade_principal")
                .and_then(|v| v.as_array())
                .and_then(|a| a.first())
            {
                main_activity_code = string_field(activity, &["code", "codigo"]);
                main_activity = string_field(activity, &["text", "descricao"]);
            }
        }

        let registration_status =
            string_field(body, &["descricao_situacao_cadastral", "situacao"]);

        let tax_regime = match body.get("regime_tributario") {
            Some(Value::Array(items)) if !items.is_empty() => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Some(Value::String(s)) => Some(s.clone()),
            _ => string_field(body, &["descricao_porte", "porte"]),
        };

        CompanyProfile {
            legal_name,
            cnpj: format_cnpj(digits),
            main_activity_code,
            main_activity,
            registration_status,
            tax_regime,
            state: string_field(body, &["uf"]),
            municipality: string_field(body, &["municipio"]),
        }
    }

    fn string_field(body: &Value, keys: &[&str]) -> Option<String> {
        keys.iter()
            .find_map(|k| body.get(k))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}
