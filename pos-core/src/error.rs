//! # Erros de Carregamento do Modelo
//!
//! Todas as falhas possíveis acontecem **uma única vez**, na construção do [`Model`](crate::model::Model).
//! Depois de carregado, o modelo é imutável e a decodificação não tem caminho de erro:
//! toda feature ausente vale 0 e toda classe pertence ao conjunto de classes.

use std::path::PathBuf;

use thiserror::Error;

/// Qual dos três artefatos do modelo originou o erro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Tabela de pesos `{feature: {classe: peso}}`.
    Weights,
    /// Lista ordenada de classes (uma por linha).
    Classes,
    /// Dicionário de palavras não ambíguas `{palavra: classe}`.
    Dictionary,
    /// Arquivo de configuração JSON.
    Config,
}

impl Artifact {
    pub fn name(&self) -> &'static str {
        match self {
            Artifact::Weights => "weights",
            Artifact::Classes => "classes",
            Artifact::Dictionary => "dictionary",
            Artifact::Config => "config",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classificação grossa do erro, útil para quem está do outro lado de uma fronteira FFI
/// e só consegue distinguir "arquivo faltando" de "conteúdo inválido" de "artefatos inconsistentes".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    Missing,
    Io,
    Malformed,
    ReferentialMismatch,
    EmptyClassSet,
    Config,
}

impl LoadErrorKind {
    /// Código numérico estável exposto pela interface C.
    pub fn code(&self) -> i32 {
        match self {
            LoadErrorKind::Missing => 1,
            LoadErrorKind::Io => 2,
            LoadErrorKind::Malformed => 3,
            LoadErrorKind::ReferentialMismatch => 4,
            LoadErrorKind::EmptyClassSet => 5,
            LoadErrorKind::Config => 6,
        }
    }
}

/// Erro fatal de carregamento: nenhum etiquetador é produzido.
#[derive(Debug, Error)]
pub enum LoadError {
    /// O arquivo do artefato não existe.
    #[error("{artifact} artifact not found: {}", path.display())]
    Missing { artifact: Artifact, path: PathBuf },

    /// O arquivo existe mas não pôde ser lido.
    #[error("could not read {artifact} artifact {}: {source}", path.display())]
    Io {
        artifact: Artifact,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Conteúdo com esquema/tipo errado (JSON inválido, peso não numérico, chave duplicada...).
    #[error("malformed {artifact} artifact: {detail}")]
    Malformed { artifact: Artifact, detail: String },

    /// O artefato referencia uma classe ausente do conjunto de classes.
    #[error("{artifact} artifact references class '{class}' which is not declared in the class set")]
    UnknownClass { artifact: Artifact, class: String },

    /// Sem classes não há o que predizer.
    #[error("class set is empty")]
    EmptyClassSet,

    /// Configuração inválida (ex: caminho vazio).
    #[error("config error: {0}")]
    Config(String),
}

impl LoadError {
    pub(crate) fn malformed(artifact: Artifact, detail: impl Into<String>) -> Self {
        LoadError::Malformed {
            artifact,
            detail: detail.into(),
        }
    }

    /// Converte um erro de I/O, separando "arquivo inexistente" dos demais.
    pub(crate) fn from_io(artifact: Artifact, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::Missing { artifact, path }
        } else {
            LoadError::Io {
                artifact,
                path,
                source,
            }
        }
    }

    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::Missing { .. } => LoadErrorKind::Missing,
            LoadError::Io { .. } => LoadErrorKind::Io,
            LoadError::Malformed { .. } => LoadErrorKind::Malformed,
            LoadError::UnknownClass { .. } => LoadErrorKind::ReferentialMismatch,
            LoadError::EmptyClassSet => LoadErrorKind::EmptyClassSet,
            LoadError::Config(_) => LoadErrorKind::Config,
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_missing() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err = LoadError::from_io(Artifact::Weights, "weights.json", io);
        assert_eq!(err.kind(), LoadErrorKind::Missing);
        assert!(err.to_string().contains("weights.json"));
    }

    #[test]
    fn test_other_io_maps_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = LoadError::from_io(Artifact::Classes, "classes.txt", io);
        assert_eq!(err.kind(), LoadErrorKind::Io);
    }

    #[test]
    fn test_kind_codes_are_distinct() {
        let kinds = [
            LoadErrorKind::Missing,
            LoadErrorKind::Io,
            LoadErrorKind::Malformed,
            LoadErrorKind::ReferentialMismatch,
            LoadErrorKind::EmptyClassSet,
            LoadErrorKind::Config,
        ];
        let mut codes: Vec<i32> = kinds.iter().map(|k| k.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
        assert!(!codes.contains(&0));
    }
}
