//! Model path discovery utilities
//!
//! Finds the Model2Vec model across different installation scenarios.

use crate::error::{ColbertError, Result};
use std::path::{Path, PathBuf};

const MODEL_FILE: &str = "model.safetensors";

/// Find Model2Vec model path with priority:
/// 1. COLBERT_MODELS_PATH environment variable
/// 2. Explicitly configured path
/// 3. Environment variable MODEL2VEC_PATH
/// 4. User home directory (~/.colbert/models/model2vec)
pub fn find_model2vec_path(configured: Option<&Path>) -> Result<PathBuf> {
    let candidates = [
        ("COLBERT_MODELS_PATH", env_path("COLBERT_MODELS_PATH")),
        ("configured", configured.map(Path::to_path_buf)),
        ("MODEL2VEC_PATH", env_path("MODEL2VEC_PATH")),
        ("user", home_model_path()),
    ];
    first_with_model(&candidates).ok_or_else(model_not_found)
}

/// First candidate directory holding a model file, in priority order
fn first_with_model(candidates: &[(&str, Option<PathBuf>)]) -> Option<PathBuf> {
    for (source, path) in candidates {
        if let Some(path) = path {
            if path.join(MODEL_FILE).exists() {
                log::info!("Using {} Model2Vec: {}", source, path.display());
                return Some(path.clone());
            }
            log::debug!("No model under {} path: {}", source, path.display());
        }
    }
    None
}

fn model_not_found() -> ColbertError {
    ColbertError::config(
        "Model2Vec model not found. Checked:\n\
         - COLBERT_MODELS_PATH environment variable\n\
         - configured embedding.model_path\n\
         - MODEL2VEC_PATH environment variable\n\
         - ~/.colbert/models/model2vec",
    )
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).map(PathBuf::from)
}

fn home_model_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| {
            PathBuf::from(home)
                .join(".colbert")
                .join("models")
                .join("model2vec")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MODEL_FILE), b"stub").unwrap();
        dir
    }

    #[test]
    fn test_first_candidate_with_model_wins() {
        let empty = tempfile::tempdir().unwrap();
        let first = model_dir();
        let second = model_dir();

        let found = first_with_model(&[
            ("COLBERT_MODELS_PATH", None),
            ("configured", Some(empty.path().to_path_buf())),
            ("MODEL2VEC_PATH", Some(first.path().to_path_buf())),
            ("user", Some(second.path().to_path_buf())),
        ]);
        assert_eq!(found.as_deref(), Some(first.path()));
    }

    #[test]
    fn test_missing_model_reports_locations() {
        let empty = tempfile::tempdir().unwrap();
        let found = first_with_model(&[
            ("configured", Some(empty.path().to_path_buf())),
            ("user", None),
        ]);
        assert!(found.is_none());

        let err = model_not_found();
        assert!(matches!(err, ColbertError::Config(_)));
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("MODEL2VEC_PATH"));
    }
}
