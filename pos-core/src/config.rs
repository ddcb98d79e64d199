//! # Configuração dos Artefatos do Modelo
//!
//! O etiquetador precisa de três arquivos. Por padrão eles vivem juntos num diretório
//! com os nomes `weights.json`, `classes.txt` e `tags.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Artifact, LoadError, LoadResult};

pub const DEFAULT_WEIGHTS_FILE: &str = "weights.json";
pub const DEFAULT_CLASSES_FILE: &str = "classes.txt";
pub const DEFAULT_DICTIONARY_FILE: &str = "tags.json";

/// Caminhos dos três artefatos do modelo.
///
/// Pode ser construída a partir de um diretório ([`TaggerConfig::from_dir`]) ou
/// lida de um JSON:
///
/// ```json
/// { "weights_path": "m/weights.json", "classes_path": "m/classes.txt", "dictionary_path": "m/tags.json" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Tabela de pesos `{feature: {classe: peso}}`.
    pub weights_path: PathBuf,
    /// Classes, uma por linha.
    pub classes_path: PathBuf,
    /// Dicionário `{palavra: classe}`.
    pub dictionary_path: PathBuf,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self::from_dir(".")
    }
}

impl TaggerConfig {
    pub fn new(
        weights_path: impl Into<PathBuf>,
        dictionary_path: impl Into<PathBuf>,
        classes_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            weights_path: weights_path.into(),
            classes_path: classes_path.into(),
            dictionary_path: dictionary_path.into(),
        }
    }

    /// Usa os nomes de arquivo padrão dentro de `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            weights_path: dir.join(DEFAULT_WEIGHTS_FILE),
            classes_path: dir.join(DEFAULT_CLASSES_FILE),
            dictionary_path: dir.join(DEFAULT_DICTIONARY_FILE),
        }
    }

    pub fn from_json(json: &str) -> LoadResult<Self> {
        serde_json::from_str(json).map_err(|e| LoadError::malformed(Artifact::Config, e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| LoadError::from_io(Artifact::Config, path, e))?;
        Self::from_json(&json)
    }

    /// Rejeita caminhos vazios antes de tocar o sistema de arquivos.
    pub fn validate(&self) -> LoadResult<()> {
        for (name, path) in [
            ("weights_path", &self.weights_path),
            ("classes_path", &self.classes_path),
            ("dictionary_path", &self.dictionary_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(LoadError::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dir_uses_default_names() {
        let cfg = TaggerConfig::from_dir("tagger");
        assert_eq!(cfg.weights_path, PathBuf::from("tagger/weights.json"));
        assert_eq!(cfg.classes_path, PathBuf::from("tagger/classes.txt"));
        assert_eq!(cfg.dictionary_path, PathBuf::from("tagger/tags.json"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let cfg = TaggerConfig::from_json(
            r#"{"weights_path":"w.json","classes_path":"c.txt","dictionary_path":"d.json"}"#,
        )
        .unwrap();
        assert_eq!(cfg, TaggerConfig::new("w.json", "d.json", "c.txt"));
    }

    #[test]
    fn test_from_json_missing_field_is_malformed() {
        let err = TaggerConfig::from_json(r#"{"weights_path":"w.json"}"#).unwrap_err();
        assert_eq!(err.kind(), crate::error::LoadErrorKind::Malformed);
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        let cfg = TaggerConfig::new("", "d.json", "c.txt");
        assert!(matches!(cfg.validate(), Err(LoadError::Config(_))));
    }
}
