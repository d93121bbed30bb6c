// Local checks run before a file is sent, and the batch report.

use serde::Serialize;

use crate::config::UploadConfig;
use crate::gateway::UploadFile;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Extension and size limits, mirroring what the server enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_extensions: Vec<String>,
    max_file_size_mb: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

impl UploadPolicy {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_file_size_mb: config.max_file_size_mb,
        }
    }

    /// `Err` carries the message shown for the rejected file.
    pub fn check(&self, file: &UploadFile) -> Result<(), String> {
        let extension = extension_of(&file.filename);
        if !self.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            return Err(format!(
                "File type .{extension} not allowed. Allowed: {}",
                self.allowed_extensions.join(", ")
            ));
        }
        if file.size() > self.max_file_size_mb.saturating_mul(BYTES_PER_MB) {
            return Err(format!("File too large. Max {}MB", self.max_file_size_mb));
        }
        if file.bytes.is_empty() {
            return Err("File is empty".to_string());
        }
        Ok(())
    }
}

/// Lowercased text after the last dot, or empty when there is none.
fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFailure {
    pub filename: String,
    pub reason: String,
}

/// Outcome of one batch, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<UploadFailure>,
}

impl UploadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }
}
