//! Tipos de dados trocados com os serviços de perfil e upload.
//!
//! Os corpos JSON usam `camelCase`, conforme esperado pelo backend
//! (`publicId`, `docType`, ...). O envelope [`ApiEnvelope`] cobre tanto
//! respostas de sucesso quanto de falha.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Um mebibyte, usado no limite de tamanho e nos rótulos de arquivo.
pub const MIB: u64 = 1024 * 1024;

/// Seção do perfil atualizada por uma etapa do assistente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSection {
    Basic,
    Academic,
    Activities,
    Background,
}

impl ProfileSection {
    /// Segmento do caminho em `PUT /users/profile/{section}`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ProfileSection::Basic => "basic",
            ProfileSection::Academic => "academic",
            ProfileSection::Activities => "activities",
            ProfileSection::Background => "background",
        }
    }
}

impl fmt::Display for ProfileSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Categoria de documento, cada uma com seu próprio endpoint de upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    Resume,
    Transcript,
    Other,
}

impl DocumentCategory {
    /// Segmento do caminho em `POST /users/upload/{segment}`.
    pub fn upload_segment(&self) -> &'static str {
        match self {
            DocumentCategory::Resume => "resume",
            DocumentCategory::Transcript => "transcript",
            DocumentCategory::Other => "document",
        }
    }

    /// Nome do campo multipart que carrega o arquivo.
    pub fn field_name(&self) -> &'static str {
        self.upload_segment()
    }

    /// Nome usado nas mensagens ao usuário.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentCategory::Resume => "resume",
            DocumentCategory::Transcript => "transcript",
            DocumentCategory::Other => "document",
        }
    }

    /// Valor de `docType`, também usado na rota de exclusão.
    pub fn doc_type(&self) -> &'static str {
        match self {
            DocumentCategory::Resume => "resume",
            DocumentCategory::Transcript => "transcript",
            DocumentCategory::Other => "other",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.doc_type())
    }
}

/// Confirmação do servidor para um upload bem-sucedido.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    /// URL pública do arquivo armazenado.
    pub url: String,
    /// Identificador remoto, usado para excluir o arquivo.
    pub public_id: String,
}

/// Envelope `{ success, message?, error?, data? }` usado pelo backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    /// Primeira mensagem não vazia entre `message` e `error`.
    pub fn failure_message(&self) -> Option<String> {
        [self.message.as_deref(), self.error.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|m| !m.is_empty())
            .map(str::to_string)
    }
}

/// Arquivo candidato a upload: nome e conteúdo em memória.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub content: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Lê um arquivo do disco; o nome exibido é o último componente do caminho.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self::new(name, content))
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Tamanho formatado como `"2.0MB"`.
    pub fn size_label(&self) -> String {
        format!("{:.1}MB", self.size() as f64 / MIB as f64)
    }

    /// Tipo MIME inferido pela extensão; `application/octet-stream` se desconhecida.
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => "application/pdf",
            "doc" => "application/msword",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        }
    }
}
