/*!
 * Tests for application configuration
 */

use anyhow::Result;
use textpipe::app_config::{Config, LogLevel, OperationConfig};
use textpipe::pipeline::{ChunkingPolicy, StageKind, TaskDefinition};

use crate::common;

fn rewrite_operation(id: &str, order: u32, enabled_tasks: &[&str]) -> OperationConfig {
    OperationConfig {
        id: id.to_string(),
        name: String::new(),
        order,
        enabled: true,
        model: None,
        temperature: None,
        translation: None,
        tasks: vec![
            TaskDefinition::new("improve_flow", "Improve the flow.", "flow"),
            TaskDefinition::new("remove_idioms", "Remove idioms.", "literal"),
        ],
        enabled_tasks: enabled_tasks.iter().map(|s| s.to_string()).collect(),
        tone: None,
    }
}

/// Missing config files are created with defaults
#[test]
fn test_loadOrCreate_missingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("textpipe.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.default_model, "mistral:latest");
    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.operations, config.operations);
    Ok(())
}

/// Invalid JSON is reported instead of silently replaced
#[test]
fn test_loadOrCreate_invalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "textpipe.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

/// A hand-written config with a translation operation builds the expected stage
#[test]
fn test_buildPipeline_fromJson_shouldResolveLanguagesAndChunking() -> Result<()> {
    let json = r#"{
        "default_model": "llama3.2:latest",
        "log_level": "debug",
        "operations": [
            {
                "id": "translate_de",
                "name": "German translation",
                "order": 1,
                "translation": { "source_language": "en", "target_language": "de", "chunk_size": 1200, "overlap": 50 }
            }
        ]
    }"#;
    let config: Config = serde_json::from_str(json)?;
    config.validate()?;

    let pipeline = config.build_pipeline();

    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(pipeline.len(), 1);
    let stage = &pipeline.stages()[0];
    assert_eq!(stage.name, "German translation");
    assert_eq!(stage.model, "llama3.2:latest");
    assert_eq!(stage.chunking, ChunkingPolicy::new(1200, 50));
    let StageKind::Translation(settings) = &stage.kind else {
        panic!("expected translation stage");
    };
    assert_eq!(settings.source_language, "English");
    assert_eq!(settings.target_language, "German");
    assert_eq!(settings.step_name, "translated");
    Ok(())
}

/// Operations without enabled tasks are left out, disabled ones too
#[test]
fn test_buildPipeline_shouldSkipEmptyAndDisabledOperations() {
    let mut disabled = rewrite_operation("disabled", 1, &["improve_flow"]);
    disabled.enabled = false;
    let config = Config {
        operations: vec![
            disabled,
            rewrite_operation("empty", 2, &[]),
            rewrite_operation("active", 3, &["remove_idioms"]),
        ],
        ..Config::default()
    };

    let pipeline = config.build_pipeline();

    assert_eq!(pipeline.len(), 1);
    assert_eq!(pipeline.stages()[0].id, "active");
    assert_eq!(pipeline.stages()[0].name, "active");
}

/// An operation without a model uses the first operation's model
#[test]
fn test_buildPipeline_modelFallback_shouldUseFirstOperation() {
    let mut first = rewrite_operation("first", 1, &["improve_flow"]);
    first.model = Some("qwen2.5:7b".to_string());
    let config = Config {
        operations: vec![rewrite_operation("second", 2, &["improve_flow"]), first],
        ..Config::default()
    };

    let pipeline = config.build_pipeline();

    assert_eq!(pipeline.stages()[0].model, "qwen2.5:7b");
    assert_eq!(pipeline.stages()[1].model, "qwen2.5:7b");
}

/// Whole-file chunking applies to every stage
#[test]
fn test_buildPipeline_sentinelChunkSize_shouldProduceWholeFile() {
    let mut config = Config::default();
    config.chunking.chunk_size = -1;

    let pipeline = config.build_pipeline();
    let rewrite = pipeline.stages().iter().find(|s| s.id == "rewrite").unwrap();

    assert_eq!(rewrite.chunking, ChunkingPolicy::whole_file());
}

/// Duplicate operation ids are rejected
#[test]
fn test_validate_duplicateOperationIds_shouldFail() {
    let config = Config {
        operations: vec![
            rewrite_operation("same", 1, &["improve_flow"]),
            rewrite_operation("same", 2, &["improve_flow"]),
        ],
        ..Config::default()
    };

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Duplicate operation id"));
}

/// Translation prompts must have somewhere to put the chunk
#[test]
fn test_validate_promptWithoutChunk_shouldFail() {
    let mut config = Config::default();
    if let Some(translation) = config.operations[0].translation.as_mut() {
        translation.prompts.user_first = "Translate please".to_string();
    }

    assert!(config.validate().is_err());
}

/// Endpoints without a scheme are accepted, garbage is not
#[test]
fn test_validate_endpoint_shouldBeChecked() {
    let mut config = Config::default();
    config.ollama.endpoint = "localhost:11434".to_string();
    assert!(config.validate().is_ok());

    config.ollama.endpoint = "   ".to_string();
    assert!(config.validate().is_err());
}

/// Temperatures outside the supported range are rejected
#[test]
fn test_validate_temperatureOutOfRange_shouldFail() {
    let mut config = Config::default();
    config.operations[1].temperature = Some(3.5);

    assert!(config.validate().is_err());
}
