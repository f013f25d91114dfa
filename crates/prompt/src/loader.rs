//! Prompt loader for built-in and workspace YAML prompt definitions.

use crate::types::{PromptDefinition, ResponseMode};
use docchat_core::{AppError, AppResult};
use std::path::Path;

const STRICT_PROMPT: &str = include_str!("../prompts/strict.yml");
const HYBRID_PROMPT: &str = include_str!("../prompts/hybrid.yml");

/// Parse the prompt definition compiled into the binary for a mode.
pub fn builtin_prompt(mode: ResponseMode) -> AppResult<PromptDefinition> {
    let source = match mode {
        ResponseMode::Strict => STRICT_PROMPT,
        ResponseMode::Hybrid => HYBRID_PROMPT,
    };

    let definition: PromptDefinition = serde_yaml::from_str(source).map_err(|e| {
        AppError::Prompt(format!("Failed to parse built-in {} prompt: {}", mode, e))
    })?;

    validate_prompt(&definition, mode)?;
    Ok(definition)
}

/// Load the prompt for a mode, preferring `<prompts_dir>/<mode>.yml`.
///
/// Falls back to the built-in definition when no directory is given or the
/// override file does not exist. An override that exists but fails to parse
/// or validate is an error rather than a silent fallback.
pub fn load_prompt(prompts_dir: Option<&Path>, mode: ResponseMode) -> AppResult<PromptDefinition> {
    let Some(dir) = prompts_dir else {
        return builtin_prompt(mode);
    };

    let prompt_file = dir.join(format!("{}.yml", mode));
    if !prompt_file.exists() {
        tracing::debug!("No prompt override at {:?}, using built-in", prompt_file);
        return builtin_prompt(mode);
    }

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition, mode)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List prompt override files (by stem) in a directory.
pub fn list_prompts(prompts_dir: &Path) -> AppResult<Vec<String>> {
    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(prompts_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

fn validate_prompt(def: &PromptDefinition, expected_mode: ResponseMode) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: '{}'. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if def.system.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt system message cannot be empty".to_string(),
        ));
    }

    if !def.template.contains("{{question}}") {
        return Err(AppError::Prompt(format!(
            "Prompt template for '{}' must reference {{{{question}}}}",
            def.id
        )));
    }

    if def.mode != expected_mode {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' declares mode '{}' but was loaded for '{}'",
            def.id, def.mode, expected_mode
        )));
    }

    if def.generation.max_tokens == 0 {
        return Err(AppError::Prompt(
            "Prompt generation.maxTokens must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// One prompt definition per response mode.
#[derive(Debug, Clone)]
pub struct PromptSet {
    strict: PromptDefinition,
    hybrid: PromptDefinition,
}

impl PromptSet {
    /// Load both modes, honouring overrides in `prompts_dir`.
    pub fn load(prompts_dir: Option<&Path>) -> AppResult<Self> {
        Ok(Self {
            strict: load_prompt(prompts_dir, ResponseMode::Strict)?,
            hybrid: load_prompt(prompts_dir, ResponseMode::Hybrid)?,
        })
    }

    /// Built-in prompts only.
    pub fn builtin() -> AppResult<Self> {
        Self::load(None)
    }

    pub fn get(&self, mode: ResponseMode) -> &PromptDefinition {
        match mode {
            ResponseMode::Strict => &self.strict,
            ResponseMode::Hybrid => &self.hybrid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, mode: &str, system: &str) {
        let content = format!(
            r#"
id: custom.{mode}
title: "Custom {mode}"
apiVersion: "1.0"
createdBy: test
mode: {mode}
system: "{system}"
template: "Context: {{{{context}}}} Q: {{{{question}}}}"
generation:
  temperature: 0.1
  maxTokens: 64
"#
        );
        fs::write(dir.join(format!("{}.yml", mode)), content).unwrap();
    }

    #[test]
    fn test_builtin_prompts_parse() {
        let strict = builtin_prompt(ResponseMode::Strict).unwrap();
        assert_eq!(strict.id, "rag.answer.strict");
        assert!(strict.system.contains("ONLY"));

        let hybrid = builtin_prompt(ResponseMode::Hybrid).unwrap();
        assert_eq!(hybrid.id, "rag.answer.hybrid");
        assert!(hybrid.system.contains("general knowledge"));
        assert!(hybrid.generation.temperature > strict.generation.temperature);
    }

    #[test]
    fn test_load_without_dir_uses_builtin() {
        let prompt = load_prompt(None, ResponseMode::Strict).unwrap();
        assert_eq!(prompt.id, "rag.answer.strict");
    }

    #[test]
    fn test_missing_override_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(Some(temp_dir.path()), ResponseMode::Hybrid).unwrap();
        assert_eq!(prompt.id, "rag.answer.hybrid");
    }

    #[test]
    fn test_override_is_used() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "strict", "Only quote the files.");

        let set = PromptSet::load(Some(temp_dir.path())).unwrap();
        assert_eq!(set.get(ResponseMode::Strict).id, "custom.strict");
        assert_eq!(set.get(ResponseMode::Hybrid).id, "rag.answer.hybrid");
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("strict.yml"), "invalid: yaml: content:").unwrap();

        assert!(load_prompt(Some(temp_dir.path()), ResponseMode::Strict).is_err());
    }

    #[test]
    fn test_mode_mismatch_is_error() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "hybrid", "Anything goes.");
        fs::rename(
            temp_dir.path().join("hybrid.yml"),
            temp_dir.path().join("strict.yml"),
        )
        .unwrap();

        let err = load_prompt(Some(temp_dir.path()), ResponseMode::Strict).unwrap_err();
        assert!(err.to_string().contains("declares mode 'hybrid'"));
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "strict", "a");
        write_override(temp_dir.path(), "hybrid", "b");
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts, vec!["hybrid".to_string(), "strict".to_string()]);
        assert!(list_prompts(&temp_dir.path().join("missing")).unwrap().is_empty());
    }
}
