use crate::error::{AppError, ConfigError, FileError};
use crate::models::template::TemplateLayout;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载答题卡模板
pub async fn load_template(toml_file_path: &Path) -> Result<TemplateLayout> {
    if !toml_file_path.exists() {
        return Err(AppError::File(FileError::NotFound {
            path: toml_file_path.display().to_string(),
        })
        .into());
    }

    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取模板文件: {}", toml_file_path.display()))?;

    let layout = TemplateLayout::from_toml_str(&content).map_err(|e| match e {
        AppError::Config(ConfigError::TomlParseFailed { source, .. }) => {
            AppError::Config(ConfigError::TomlParseFailed {
                path: toml_file_path.display().to_string(),
                source,
            })
        }
        other => other,
    })?;

    tracing::info!(
        "✓ 已加载模板: {} ({} 题, {} 列)",
        toml_file_path.display(),
        layout.answers.num_questions,
        layout.answers.column_starts_x.len()
    );

    Ok(layout)
}

/// 未指定模板文件时使用内置默认模板
pub async fn load_template_or_default(toml_file_path: Option<&str>) -> Result<TemplateLayout> {
    match toml_file_path {
        Some(path) => load_template(Path::new(path)).await,
        None => {
            tracing::info!("未指定模板文件，使用内置默认模板");
            let layout = TemplateLayout::default();
            layout.validate()?;
            Ok(layout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_template_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sheet_width = 800\n[answers]\nnum_questions = 30").unwrap();

        let layout = load_template(file.path()).await.unwrap();
        assert_eq!(layout.sheet_width, 800);
        assert_eq!(layout.answers.num_questions, 30);
    }

    #[tokio::test]
    async fn test_missing_template_file() {
        let result = load_template(Path::new("/definitely/not/here/template.toml")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_toml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sheet_width = \"wide\"").unwrap();

        let err = load_template(file.path()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&file.path().display().to_string()));
    }

    #[tokio::test]
    async fn test_default_template() {
        let layout = load_template_or_default(None).await.unwrap();
        assert_eq!(layout, TemplateLayout::default());
    }
}
