use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Extensions picked up when a directory is given as input
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Suffix appended to the input stem for the final output
pub const OUTPUT_SUFFIX: &str = "_processed";

/// Separates the output stem from the step name in artifact file names
pub const STEP_INFIX: &str = "_step_";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path `<stem>_processed<.ext>` next to the input or in output_dir
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, output_dir: Option<&Path>) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();

        let mut file_name = format!("{}{}", stem, OUTPUT_SUFFIX);
        if let Some(ext) = input_file.extension() {
            file_name.push('.');
            file_name.push_str(&ext.to_string_lossy());
        }

        match output_dir {
            Some(dir) => dir.join(file_name),
            None => input_file.with_file_name(file_name),
        }
    }

    // @generates: Step artifact path `<base>_step_<name><.ext>` next to the output
    pub fn step_file_path<P: AsRef<Path>>(output_base: P, step_name: &str) -> PathBuf {
        let output_base = output_base.as_ref();
        let stem = output_base.file_stem().unwrap_or_default().to_string_lossy();

        let mut file_name = format!("{}{}{}", stem, STEP_INFIX, step_name);
        if let Some(ext) = output_base.extension() {
            file_name.push('.');
            file_name.push_str(&ext.to_string_lossy());
        }

        output_base.with_file_name(file_name)
    }

    // @checks: Input has a supported text extension
    pub fn is_supported_input<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                SUPPORTED_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s))
            })
            .unwrap_or(false)
    }

    // @checks: Path looks like a final output or a step artifact we wrote
    pub fn is_generated_file<P: AsRef<Path>>(path: P) -> bool {
        let stem = path.as_ref().file_stem().unwrap_or_default().to_string_lossy();
        let step_marker = format!("{}{}", OUTPUT_SUFFIX, STEP_INFIX);
        stem.ends_with(OUTPUT_SUFFIX) || stem.contains(&step_marker)
    }

    /// Find supported text files in a directory, recursively and sorted
    pub fn find_input_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() || !Self::is_supported_input(path) {
                continue;
            }
            if Self::is_generated_file(path) {
                debug!("Skipping generated file {}", path.display());
                continue;
            }
            result.push(path.to_path_buf());
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
