//! Turns a generate-response result into a markdown transcript on disk.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::api::{ApiClient, GenerateOutcome};
use crate::error::{Error, Result};

/// Extension of transcript files.
pub const TRANSCRIPT_EXTENSION: &str = "md";

/// Where the prompt text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// Words typed on the command line.
    Inline(String),
    /// An existing markdown file, typically an earlier transcript.
    File { path: PathBuf, content: String },
}

impl PromptSource {
    /// Text sent to the service as the prompt.
    pub fn text(&self) -> &str {
        match self {
            PromptSource::Inline(prompt) => prompt,
            PromptSource::File { content, .. } => content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptSection {
    /// Freshly composed block holding the user's request.
    User(String),
    /// Verbatim content of the source file.
    Prior(String),
    Assistant(String),
    RetrievedPaths(Vec<String>),
}

impl TranscriptSection {
    fn render(&self) -> String {
        match self {
            TranscriptSection::User(prompt) => format!("# User\n\n{}", prompt),
            TranscriptSection::Prior(content) => content.clone(),
            TranscriptSection::Assistant(answer) => format!("# Assistant\n\n{}", answer),
            TranscriptSection::RetrievedPaths(paths) => {
                let mut block = String::from("# Retrieved File Paths\n\n");
                for path in paths {
                    block.push_str(&format!("- {}\n", path));
                }
                block
            }
        }
    }
}

/// Ordered record of one prompt/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    sections: Vec<TranscriptSection>,
}

impl Transcript {
    pub fn compose(source: &PromptSource, answer: &str, retrieved_file_paths: &[String]) -> Self {
        let mut sections = vec![
            match source {
                PromptSource::Inline(prompt) => TranscriptSection::User(prompt.clone()),
                PromptSource::File { content, .. } => TranscriptSection::Prior(content.clone()),
            },
            TranscriptSection::Assistant(answer.to_string()),
        ];

        if !retrieved_file_paths.is_empty() {
            sections.push(TranscriptSection::RetrievedPaths(
                retrieved_file_paths.to_vec(),
            ));
        }

        Self { sections }
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(TranscriptSection::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Base name of `path` with every extension stripped (`notes.tar.md` -> `notes`).
///
/// Returns `None` when nothing is left, as for `.md` or `.hidden.md`.
pub fn base_name_without_extensions(path: &Path) -> Option<String> {
    let mut name = path.file_name()?.to_string_lossy().into_owned();
    while let Some(dot) = name.rfind('.') {
        name.truncate(dot);
    }
    (!name.is_empty()).then_some(name)
}

/// Replace characters that are unsafe in a file name with `_`.
pub fn sanitize_filename(name: &str) -> Option<String> {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars =
        UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid filename regex"));

    let cleaned = unsafe_chars.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches('.');
    (!cleaned.is_empty() && cleaned != "_").then(|| cleaned.to_string())
}

/// Write `content` to `<dir>/<filename>.md`, creating `dir` if needed.
///
/// An existing transcript with the same name is overwritten.
pub fn write_transcript(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::filesystem(format!("failed to create {}", dir.display()), e))?;

    let path = dir.join(format!("{}.{}", filename, TRANSCRIPT_EXTENSION));
    std::fs::write(&path, content)
        .map_err(|e| Error::filesystem(format!("failed to write {}", path.display()), e))?;

    debug!("Transcript written to {}", path.display());
    Ok(path)
}

/// What became of a generate-response result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// The service short-circuited with a message; nothing was written.
    Informational(String),
    Saved { path: PathBuf, content: String },
}

pub struct Materializer<'a> {
    client: &'a ApiClient,
    chat_dir: PathBuf,
    model_api_key: String,
}

impl<'a> Materializer<'a> {
    pub fn new(client: &'a ApiClient, chat_dir: PathBuf, model_api_key: Option<&str>) -> Self {
        Self {
            client,
            chat_dir,
            model_api_key: model_api_key.unwrap_or_default().to_string(),
        }
    }

    pub async fn materialize(
        &self,
        source: &PromptSource,
        outcome: GenerateOutcome,
    ) -> Result<Materialized> {
        let (answer, retrieved_file_paths) = match outcome {
            GenerateOutcome::Informational(message) => {
                info!("Service returned a message instead of an answer");
                return Ok(Materialized::Informational(message));
            }
            GenerateOutcome::Answer {
                answer,
                retrieved_file_paths,
            } => (answer, retrieved_file_paths),
        };

        let content = Transcript::compose(source, &answer, &retrieved_file_paths).render();
        let filename = self.resolve_filename(source).await?;
        let path = write_transcript(&self.chat_dir, &filename, &content)?;

        Ok(Materialized::Saved { path, content })
    }

    /// Source file base name, or a name suggested by the service.
    async fn resolve_filename(&self, source: &PromptSource) -> Result<String> {
        let local = match source {
            PromptSource::File { path, .. } => {
                base_name_without_extensions(path).and_then(|name| sanitize_filename(&name))
            }
            PromptSource::Inline(_) => None,
        };
        if let Some(name) = local {
            return Ok(name);
        }

        let suggested = self
            .client
            .generate_filename(source.text(), &self.model_api_key)
            .await?;
        sanitize_filename(&suggested).ok_or_else(|| Error::Decode {
            endpoint: "generate-filename".to_string(),
            reason: format!("unusable filename {:?}", suggested),
        })
    }
}
