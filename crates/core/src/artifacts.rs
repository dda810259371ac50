use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::crm::CrmPayload;
use crate::domain::lead::LeadFields;
use crate::domain::score::Scores;
use crate::errors::LeadflowError;

pub const FIELDS_FILE: &str = "fields.json";
pub const SCORES_FILE: &str = "scores.json";
pub const NEXT_ACTIONS_FILE: &str = "next_actions.txt";
pub const FOLLOW_UP_EMAIL_FILE: &str = "follow_up_email.txt";
pub const REPORT_FILE: &str = "report.md";
pub const CRM_PAYLOAD_FILE: &str = "crm_payload.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Stdin => "stdin".to_string(),
        }
    }

    /// Reads the whole input and trims surrounding whitespace.
    pub fn read(&self) -> Result<String, LeadflowError> {
        let raw = match self {
            Self::File(path) => fs::read_to_string(path),
            Self::Stdin => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer).map(|_| buffer)
            }
        }
        .map_err(|source| LeadflowError::InputUnreadable { source_label: self.label(), source })?;

        Ok(raw.trim().to_string())
    }
}

/// Everything one `run` writes to its output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunArtifacts {
    pub fields: LeadFields,
    pub scores: Scores,
    pub actions: Vec<String>,
    pub email: String,
    pub report: String,
}

impl RunArtifacts {
    /// Writes every document into a staging directory inside `dir`, then renames each into
    /// place. On failure the staged and already-renamed files are removed, so a failed write
    /// never leaves a partial set behind. Returns the paths written, in write order.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, LeadflowError> {
        let documents = [
            (FIELDS_FILE, to_pretty_json(FIELDS_FILE, &self.fields)?),
            (SCORES_FILE, to_pretty_json(SCORES_FILE, &self.scores)?),
            (NEXT_ACTIONS_FILE, self.actions.join("\n")),
            (FOLLOW_UP_EMAIL_FILE, self.email.clone()),
            (REPORT_FILE, self.report.clone()),
        ];

        let created_dir = !dir.exists();
        fs::create_dir_all(dir)
            .map_err(|source| LeadflowError::WriteArtifact { path: dir.to_path_buf(), source })?;

        let staging = dir.join(format!(".leadflow-staging-{}", Uuid::new_v4().simple()));
        let result = stage_and_commit(dir, &staging, &documents);
        let _ = fs::remove_dir_all(&staging);
        if result.is_err() && created_dir {
            let _ = fs::remove_dir(dir);
        }
        result
    }
}

fn stage_and_commit(
    dir: &Path,
    staging: &Path,
    documents: &[(&str, String)],
) -> Result<Vec<PathBuf>, LeadflowError> {
    fs::create_dir(staging)
        .map_err(|source| LeadflowError::WriteArtifact { path: staging.to_path_buf(), source })?;
    for (name, contents) in documents {
        write_text(&staging.join(name), contents)?;
    }

    let mut written = Vec::with_capacity(documents.len());
    for (name, _) in documents {
        let target = dir.join(name);
        if let Err(source) = fs::rename(staging.join(name), &target) {
            for path in &written {
                let _ = fs::remove_file(path);
            }
            return Err(LeadflowError::WriteArtifact { path: target, source });
        }
        written.push(target);
    }
    Ok(written)
}

/// `fields.json` and `scores.json` from a previous run.
pub fn load_prior_run(dir: &Path) -> Result<(LeadFields, Scores), LeadflowError> {
    let fields = read_json(&dir.join(FIELDS_FILE))?;
    let scores = read_json(&dir.join(SCORES_FILE))?;
    Ok((fields, scores))
}

/// Writes `crm_payload.json` (or an operator-chosen path), creating parent directories.
pub fn write_crm_payload(path: &Path, payload: &CrmPayload) -> Result<(), LeadflowError> {
    let contents = to_pretty_json(CRM_PAYLOAD_FILE, payload)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|source| LeadflowError::WriteArtifact { path: parent.to_path_buf(), source })?;
    }
    write_text(path, &contents)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LeadflowError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(LeadflowError::MissingArtifact { path: path.to_path_buf() });
        }
        Err(source) => {
            return Err(LeadflowError::InputUnreadable {
                source_label: path.display().to_string(),
                source,
            });
        }
    };
    serde_json::from_str(&raw)
        .map_err(|source| LeadflowError::InvalidArtifact { path: path.to_path_buf(), source })
}

fn to_pretty_json<T: Serialize>(artifact: &'static str, value: &T) -> Result<String, LeadflowError> {
    serde_json::to_string_pretty(value)
        .map_err(|source| LeadflowError::Serialization { artifact, source })
}

fn write_text(path: &Path, contents: &str) -> Result<(), LeadflowError> {
    fs::write(path, contents)
        .map_err(|source| LeadflowError::WriteArtifact { path: path.to_path_buf(), source })
}
