/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;
use textpipe::file_utils::FileManager;

use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "doc.txt", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));
    Ok(())
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("deeper").join("out.txt");

    FileManager::write_to_file(&path, "Ahoj světe")?;

    assert_eq!(FileManager::read_to_string(&path)?, "Ahoj světe");
    Ok(())
}

/// Test that read_to_string reports the path of a missing file
#[test]
fn test_read_to_string_withMissingFile_shouldMentionPath() {
    let err = FileManager::read_to_string("missing_input_12345.txt").unwrap_err();

    assert!(format!("{:#}", err).contains("missing_input_12345.txt"));
}

/// Test that find_input_files walks directories and skips our own outputs
#[test]
fn test_find_input_files_shouldReturnSortedTextFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    std::fs::create_dir_all(root.join("chapter"))?;
    common::create_test_file(root, "b.txt", "b")?;
    common::create_test_file(root, "a.md", "a")?;
    common::create_test_file(root, "image.png", "x")?;
    common::create_test_file(root, "b_processed.txt", "done")?;
    common::create_test_file(root, "b_processed_step_01_translated.txt", "step")?;
    common::create_test_file(&root.join("chapter"), "c.txt", "c")?;

    let files = FileManager::find_input_files(root)?;

    let names: Vec<String> = files
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["a.md", "b.txt", "chapter/c.txt"]);
    Ok(())
}

/// Inputs that only resemble generated names are still picked up
#[test]
fn test_find_input_files_lookalikeNames_shouldBeKept() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "first_step_guide.txt", "guide")?;
    common::create_test_file(root, "processed_notes.md", "notes")?;
    common::create_test_file(root, "first_step_guide_processed.txt", "done")?;
    common::create_test_file(root, "first_step_guide_processed_step_translation_progress.txt", "step")?;

    let files = FileManager::find_input_files(root)?;

    assert_eq!(files, vec![root.join("first_step_guide.txt"), root.join("processed_notes.md")]);
    Ok(())
}

/// Test that generated outputs and step artifacts are recognized by name
#[test]
fn test_is_generated_file_shouldMatchOutputAndStepNames() {
    assert!(FileManager::is_generated_file("story_processed.txt"));
    assert!(FileManager::is_generated_file("story_processed_step_01_translated.txt"));
    assert!(!FileManager::is_generated_file("first_step_guide.txt"));
    assert!(!FileManager::is_generated_file("processed_notes.md"));
}

/// Test that step files live next to the output they belong to
#[test]
fn test_step_file_path_withOutputDir_shouldStayInSameDir() {
    let output = FileManager::generate_output_path("/in/story.txt", Some(Path::new("/out")));
    let step = FileManager::step_file_path(&output, "02_flow_simplified");

    assert_eq!(step, Path::new("/out/story_processed_step_02_flow_simplified.txt"));
}
