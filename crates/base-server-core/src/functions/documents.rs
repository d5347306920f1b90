//! Documentation browsing handlers.
//!
//! The documentation root holds one subdirectory per folder. A folder holds
//! documents, each available in up to four formats distinguished by file
//! name:
//!
//! | Format             | File                  |
//! |--------------------|-----------------------|
//! | `full_markdown`    | `{doc}.md`            |
//! | `summary_markdown` | `{doc}_summary.md`    |
//! | `full_json`        | `{doc}_full.json`     |
//! | `summary_json`     | `{doc}_summary.json`  |

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};

use super::{
    FunctionError, FunctionRequest, FunctionResponse, checked_segment, display_name, file_name_of,
    file_size, sorted_subdirs,
};

const DEFAULT_FOLDER: &str = "base_server_keypoint";
const DEFAULT_DOCUMENT: &str = "base_server_keypoints";
const DEFAULT_FORMAT: &str = "summary_markdown";

/// One of the four document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    /// `{doc}.md`
    FullMarkdown,
    /// `{doc}_summary.md`
    SummaryMarkdown,
    /// `{doc}_full.json`
    FullJson,
    /// `{doc}_summary.json`
    SummaryJson,
}

impl DocFormat {
    /// Every format, in listing order.
    pub const ALL: [Self; 4] = [
        Self::FullMarkdown,
        Self::SummaryMarkdown,
        Self::FullJson,
        Self::SummaryJson,
    ];

    /// The format's query-parameter name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FullMarkdown => "full_markdown",
            Self::SummaryMarkdown => "summary_markdown",
            Self::FullJson => "full_json",
            Self::SummaryJson => "summary_json",
        }
    }

    /// Parse a query-parameter name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.name() == name)
    }

    /// `"markdown"` or `"json"`.
    pub const fn file_type(self) -> &'static str {
        match self {
            Self::FullMarkdown | Self::SummaryMarkdown => "markdown",
            Self::FullJson | Self::SummaryJson => "json",
        }
    }

    /// File name of `document` in this format.
    pub fn file_name(self, document: &str) -> String {
        match self {
            Self::FullMarkdown => format!("{document}.md"),
            Self::SummaryMarkdown => format!("{document}_summary.md"),
            Self::FullJson => format!("{document}_full.json"),
            Self::SummaryJson => format!("{document}_summary.json"),
        }
    }
}

/// List every documentation folder with file counts.
///
/// # Errors
///
/// Returns [`FunctionError::Io`] if the documentation root exists but
/// cannot be scanned.
pub fn get_documentation_folders(
    request: &FunctionRequest,
) -> Result<FunctionResponse, FunctionError> {
    let root = &request.docs_root;
    if !root.is_dir() {
        return Ok(FunctionResponse::error(404, "Documentation directory not found"));
    }

    let mut folders = Vec::new();
    for dir in sorted_subdirs(root)? {
        let name = file_name_of(&dir);
        let (markdown, json) = count_document_files(&dir)?;
        let mut folder = Map::new();
        folder.insert("display_name".to_owned(), Value::from(display_name(&name)));
        folder.insert("name".to_owned(), Value::from(name));
        folder.insert("file_count".to_owned(), Value::from(markdown.saturating_add(json)));
        folder.insert("has_markdown".to_owned(), Value::Bool(markdown > 0));
        folder.insert("has_json".to_owned(), Value::Bool(json > 0));
        folders.push(Value::Object(folder));
    }

    let mut fields = Map::new();
    fields.insert("total".to_owned(), Value::from(folders.len()));
    fields.insert("folders".to_owned(), Value::Array(folders));
    Ok(FunctionResponse::ok(fields))
}

/// List every document in every folder with its available formats.
///
/// Folders without any document files are omitted.
///
/// # Errors
///
/// Returns [`FunctionError::Io`] if a folder cannot be scanned.
pub fn get_documents(request: &FunctionRequest) -> Result<FunctionResponse, FunctionError> {
    let root = &request.docs_root;
    if !root.is_dir() {
        return Ok(FunctionResponse::error(404, "Documentation directory not found"));
    }

    let mut documents = Vec::new();
    for dir in sorted_subdirs(root)? {
        let folder = file_name_of(&dir);
        for stem in document_stems(&dir)? {
            documents.push(Value::Object(document_entry(root, &folder, &stem)?));
        }
    }

    let mut fields = Map::new();
    fields.insert("total".to_owned(), Value::from(documents.len()));
    fields.insert("documents".to_owned(), Value::Array(documents));
    Ok(FunctionResponse::ok(fields))
}

/// Return one document in one format.
///
/// Query parameters: `folder`, `document`, `format`, each with a default.
/// JSON formats are returned parsed.
///
/// # Errors
///
/// Returns [`FunctionError::Io`] if the file exists but cannot be read.
pub fn get_document_content(request: &FunctionRequest) -> Result<FunctionResponse, FunctionError> {
    let folder = request.param("folder").unwrap_or(DEFAULT_FOLDER);
    let document = request.param("document").unwrap_or(DEFAULT_DOCUMENT);
    let format_name = request.param("format").unwrap_or(DEFAULT_FORMAT);

    if folder.is_empty() || document.is_empty() {
        return Ok(FunctionResponse::error(
            400,
            "Missing required parameters: folder, document",
        ));
    }
    let Some(format) = DocFormat::from_name(format_name) else {
        let choices: Vec<String> = DocFormat::ALL
            .iter()
            .map(|f| format!("'{}'", f.name()))
            .collect();
        return Ok(FunctionResponse::error(
            400,
            format!("Invalid format. Choose from: [{}]", choices.join(", ")),
        ));
    };
    let folder = match checked_segment("folder", folder) {
        Ok(folder) => folder,
        Err(response) => return Ok(response),
    };
    let document = match checked_segment("document", document) {
        Ok(document) => document,
        Err(response) => return Ok(response),
    };

    let filename = format.file_name(document);
    let path = request.docs_root.join(folder).join(&filename);
    if !path.is_file() {
        return Ok(FunctionResponse::error(
            404,
            format!("Document not found: {filename} in {folder}"),
        ));
    }

    let text = std::fs::read_to_string(&path).map_err(|e| FunctionError::io(&path, e))?;
    let content = if format.file_type() == "json" {
        match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Ok(FunctionResponse::error(500, format!("Invalid JSON in file: {e}")));
            }
        }
    } else {
        Value::String(text)
    };

    let mut fields = Map::new();
    fields.insert("folder".to_owned(), Value::from(folder));
    fields.insert("document".to_owned(), Value::from(document));
    fields.insert("format".to_owned(), Value::from(format.name()));
    fields.insert("file_type".to_owned(), Value::from(format.file_type()));
    fields.insert("size".to_owned(), Value::from(file_size(&path)?));
    fields.insert("filename".to_owned(), Value::from(filename));
    fields.insert("content".to_owned(), content);
    Ok(FunctionResponse::ok(fields))
}

// ---------------------------------------------------------------------------
// Folder scanning
// ---------------------------------------------------------------------------

fn count_document_files(dir: &Path) -> Result<(usize, usize), FunctionError> {
    let mut markdown = 0_usize;
    let mut json = 0_usize;
    for path in files_in(dir)? {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("md") => markdown = markdown.saturating_add(1),
            Some("json") => json = json.saturating_add(1),
            _ => {}
        }
    }
    Ok((markdown, json))
}

/// Distinct document names in a folder, format suffixes stripped.
fn document_stems(dir: &Path) -> Result<BTreeSet<String>, FunctionError> {
    let mut stems = BTreeSet::new();
    for path in files_in(dir)? {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let document = match ext {
            "md" => stem.strip_suffix("_summary").unwrap_or(stem),
            "json" => stem
                .strip_suffix("_summary")
                .or_else(|| stem.strip_suffix("_full"))
                .unwrap_or(stem),
            _ => continue,
        };
        if !document.is_empty() {
            stems.insert(document.to_owned());
        }
    }
    Ok(stems)
}

fn document_entry(root: &Path, folder: &str, document: &str) -> Result<Map<String, Value>, FunctionError> {
    let mut formats = Map::new();
    for format in DocFormat::ALL {
        let filename = format.file_name(document);
        let path = root.join(folder).join(&filename);
        let value = if path.is_file() {
            let mut meta = Map::new();
            meta.insert("file".to_owned(), Value::from(filename));
            meta.insert("path".to_owned(), Value::from(path.display().to_string()));
            meta.insert("size".to_owned(), Value::from(file_size(&path)?));
            meta.insert("type".to_owned(), Value::from(format.file_type()));
            Value::Object(meta)
        } else {
            Value::Null
        };
        formats.insert(format.name().to_owned(), value);
    }

    let mut entry = Map::new();
    entry.insert("name".to_owned(), Value::from(display_name(document)));
    entry.insert("document".to_owned(), Value::from(document));
    entry.insert("folder".to_owned(), Value::from(folder));
    entry.insert(
        "description".to_owned(),
        Value::from(format!("{} documentation", display_name(folder))),
    );
    entry.insert("formats".to_owned(), Value::Object(formats));
    Ok(entry)
}

fn files_in(dir: &Path) -> Result<Vec<std::path::PathBuf>, FunctionError> {
    let entries = std::fs::read_dir(dir).map_err(|e| FunctionError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| FunctionError::io(dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
