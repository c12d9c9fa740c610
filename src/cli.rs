//! Interface de linha de comando do lumos-intake baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, upload, delete)
//! e flags globais (--config, --api-url, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::api::DocumentCategory;

/// lumos-intake: wizard de cadastro de perfil e envio de documentos.
#[derive(Debug, Parser)]
#[command(name = "lumos-intake", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./lumos.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// URL base da API; tem precedência sobre o arquivo e o ambiente.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Categoria de documento aceita pela CLI, mapeada para [`DocumentCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// Currículo; dispara a extração após o envio.
    Resume,
    /// Histórico escolar.
    Transcript,
    /// Qualquer outro documento.
    Other,
}

impl From<CategoryArg> for DocumentCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Resume => DocumentCategory::Resume,
            CategoryArg::Transcript => DocumentCategory::Transcript,
            CategoryArg::Other => DocumentCategory::Other,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Percorre o wizard completo a partir de um arquivo TOML de respostas.
    Run {
        /// Arquivo TOML com as respostas de cada etapa e os documentos.
        answers: PathBuf,

        /// Encerra a tela de processamento sem aguardar o atraso.
        #[arg(long, default_value_t = false)]
        no_wait: bool,
    },

    /// Envia um único documento e acompanha o progresso.
    Upload {
        category: CategoryArg,
        path: PathBuf,
    },

    /// Remove um documento enviado anteriormente.
    Delete {
        category: CategoryArg,
        /// Identificador remoto devolvido pelo envio.
        public_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_run_subcommand() {
        let cli = Cli::parse_from(["lumos-intake", "run", "answers.toml"]);
        match cli.command {
            Command::Run { answers, no_wait } => {
                assert_eq!(answers, PathBuf::from("answers.toml"));
                assert!(!no_wait);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "lumos-intake",
            "--config",
            "custom.toml",
            "--api-url",
            "http://api.test/api",
            "--verbose",
            "run",
            "answers.toml",
            "--no-wait",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(cli.api_url.as_deref(), Some("http://api.test/api"));
        assert!(matches!(cli.command, Command::Run { no_wait: true, .. }));
    }

    #[test]
    fn cli_parses_upload_subcommand() {
        let cli = Cli::parse_from(["lumos-intake", "upload", "resume", "cv.pdf"]);
        match cli.command {
            Command::Upload { category, path } => {
                assert_eq!(DocumentCategory::from(category), DocumentCategory::Resume);
                assert_eq!(path, PathBuf::from("cv.pdf"));
            }
            _ => panic!("expected Upload command"),
        }
    }

    #[test]
    fn cli_parses_delete_subcommand() {
        let cli = Cli::parse_from(["lumos-intake", "delete", "other", "documents/abc123"]);
        match cli.command {
            Command::Delete {
                category,
                public_id,
            } => {
                assert_eq!(category, CategoryArg::Other);
                assert_eq!(public_id, "documents/abc123");
            }
            _ => panic!("expected Delete command"),
        }
    }

    #[test]
    fn cli_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["lumos-intake", "upload", "photo", "x.png"]).is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
