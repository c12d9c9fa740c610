//! Tipos de erro para o cliente dos serviços de perfil e upload.
//!
//! Define [`ApiError`] com variantes para credencial rejeitada, rejeição
//! estruturada do servidor e falhas de rede. A conversão para a taxonomia
//! exibida ao usuário fica em [`IntakeError::from_api`](crate::error::IntakeError::from_api).

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com os serviços remotos.
///
/// - [`Unauthorized`](ApiError::Unauthorized): o servidor retornou HTTP 401
/// - [`Rejected`](ApiError::Rejected): qualquer outro erro HTTP ou `success: false`
/// - [`NetworkError`](ApiError::NetworkError): falha na camada de rede
/// - [`Malformed`](ApiError::Malformed): resposta de sucesso sem o corpo esperado
#[derive(Debug, Error)]
pub enum ApiError {
    /// O servidor recusou a credencial (HTTP 401).
    #[error("unauthorized (status 401)")]
    Unauthorized,

    /// Erro retornado pela API. `message` vem de `message` ou `error` no corpo
    /// JSON e fica vazio quando o servidor não envia nada utilizável.
    #[error("API error (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// A resposta chegou mas não pôde ser interpretada.
    #[error("malformed response: {0}")]
    Malformed(String),
}
