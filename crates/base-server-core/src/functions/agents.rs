//! Agent and skills file handlers.
//!
//! Agents live under `<docs_root>/agents/<agent>/`, each with an optional
//! `agent.md` and an optional `skills.md`. Folders holding neither are
//! ignored.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::{
    FunctionError, FunctionRequest, FunctionResponse, checked_segment, display_name, file_name_of,
    file_size, sorted_subdirs,
};

const AGENTS_DIR: &str = "agents";
const AGENT_FILE: &str = "agent.md";
const SKILLS_FILE: &str = "skills.md";

/// List every agent with metadata for its files.
///
/// # Errors
///
/// Returns [`FunctionError::Io`] if the agents directory cannot be scanned.
pub fn get_agents_file_names(request: &FunctionRequest) -> Result<FunctionResponse, FunctionError> {
    let Some(agent_dirs) = agent_dirs(&request.docs_root)? else {
        return Ok(FunctionResponse::error(404, "Agents directory not found"));
    };

    let mut agents = Vec::new();
    for dir in agent_dirs {
        let id = file_name_of(&dir);
        let agent_md = file_meta(&dir.join(AGENT_FILE), AGENT_FILE)?;
        let skills_md = file_meta(&dir.join(SKILLS_FILE), SKILLS_FILE)?;
        if agent_md.is_null() && skills_md.is_null() {
            continue;
        }

        let mut files = Map::new();
        files.insert("agent_md".to_owned(), agent_md);
        files.insert("skills_md".to_owned(), skills_md);
        files.insert("folder".to_owned(), Value::from(id.as_str()));
        agents.push(agent_entry(&id, files));
    }

    let mut fields = Map::new();
    fields.insert("total".to_owned(), Value::from(agents.len()));
    fields.insert("agents".to_owned(), Value::Array(agents));
    Ok(FunctionResponse::ok(fields))
}

/// Return the content of one agent's `agent.md` or `skills.md`.
///
/// Query parameters: `agent` (required) and `file_type` (`agent` or
/// `skills`, default `agent`).
///
/// # Errors
///
/// Returns [`FunctionError::Io`] if the file exists but cannot be read.
pub fn get_agent_file(request: &FunctionRequest) -> Result<FunctionResponse, FunctionError> {
    let agent = request.param("agent").unwrap_or_default();
    let file_type = request.param("file_type").unwrap_or("agent");

    if agent.is_empty() {
        return Ok(FunctionResponse::error(400, "Missing required parameter: agent"));
    }
    let filename = match file_type {
        "agent" => AGENT_FILE,
        "skills" => SKILLS_FILE,
        _ => {
            return Ok(FunctionResponse::error(
                400,
                "Invalid file_type. Must be 'agent' or 'skills'",
            ));
        }
    };
    let agent = match checked_segment("agent", agent) {
        Ok(agent) => agent,
        Err(response) => return Ok(response),
    };

    let path = request.docs_root.join(AGENTS_DIR).join(agent).join(filename);
    if !path.is_file() {
        return Ok(FunctionResponse::error(
            404,
            format!("File not found: {filename} in {agent}"),
        ));
    }
    let content = std::fs::read_to_string(&path).map_err(|e| FunctionError::io(&path, e))?;

    let mut fields = Map::new();
    fields.insert("agent".to_owned(), Value::from(agent));
    fields.insert("file_type".to_owned(), Value::from(file_type));
    fields.insert("filename".to_owned(), Value::from(filename));
    fields.insert("size".to_owned(), Value::from(file_size(&path)?));
    fields.insert("content".to_owned(), Value::String(content));
    Ok(FunctionResponse::ok(fields))
}

/// Return every agent with the content of both of its files.
///
/// # Errors
///
/// Returns [`FunctionError::Io`] if a directory or file cannot be read.
pub fn get_all_agents_and_skills(
    request: &FunctionRequest,
) -> Result<FunctionResponse, FunctionError> {
    let Some(agent_dirs) = agent_dirs(&request.docs_root)? else {
        return Ok(FunctionResponse::error(404, "Agents directory not found"));
    };

    let mut agents = Vec::new();
    for dir in agent_dirs {
        let id = file_name_of(&dir);
        let mut files = Map::new();
        for (key, filename) in [("agent", AGENT_FILE), ("skills", SKILLS_FILE)] {
            let path = dir.join(filename);
            if !path.is_file() {
                continue;
            }
            let content =
                std::fs::read_to_string(&path).map_err(|e| FunctionError::io(&path, e))?;
            let mut file = Map::new();
            file.insert("name".to_owned(), Value::from(filename));
            file.insert("content".to_owned(), Value::String(content));
            file.insert("size".to_owned(), Value::from(file_size(&path)?));
            files.insert(key.to_owned(), Value::Object(file));
        }
        if !files.is_empty() {
            agents.push(agent_entry(&id, files));
        }
    }

    let mut fields = Map::new();
    fields.insert("total".to_owned(), Value::from(agents.len()));
    fields.insert("agents".to_owned(), Value::Array(agents));
    Ok(FunctionResponse::ok(fields))
}

/// Human name for an agent folder: `code_quality_agent` → `Code Quality`.
pub fn agent_display_name(folder: &str) -> String {
    display_name(&folder.replace("_agent", ""))
}

/// `None` when the agents directory does not exist.
fn agent_dirs(docs_root: &Path) -> Result<Option<Vec<PathBuf>>, FunctionError> {
    let dir = docs_root.join(AGENTS_DIR);
    if !dir.is_dir() {
        return Ok(None);
    }
    sorted_subdirs(&dir).map(Some)
}

fn file_meta(path: &Path, name: &str) -> Result<Value, FunctionError> {
    if !path.is_file() {
        return Ok(Value::Null);
    }
    let mut meta = Map::new();
    meta.insert("name".to_owned(), Value::from(name));
    meta.insert("path".to_owned(), Value::from(path.display().to_string()));
    meta.insert("size".to_owned(), Value::from(file_size(path)?));
    Ok(Value::Object(meta))
}

fn agent_entry(id: &str, files: Map<String, Value>) -> Value {
    let mut entry = Map::new();
    entry.insert("id".to_owned(), Value::from(id));
    entry.insert("name".to_owned(), Value::from(agent_display_name(id)));
    entry.insert("folder".to_owned(), Value::from(id));
    entry.insert("files".to_owned(), Value::Object(files));
    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(result: Result<FunctionResponse, FunctionError>) -> Option<u16> {
        result.ok().map(|r| r.status)
    }

    #[test]
    fn display_name_strips_agent_suffix() {
        assert_eq!(agent_display_name("code_quality_agent"), "Code Quality");
        assert_eq!(agent_display_name("planner"), "Planner");
    }

    #[test]
    fn agent_parameter_is_required() {
        let request = FunctionRequest::new("docs");
        assert_eq!(status_of(get_agent_file(&request)), Some(400));
    }

    #[test]
    fn file_type_must_be_known() {
        let request = FunctionRequest::new("docs")
            .with_query("agent", "code_quality_agent")
            .with_query("file_type", "secrets");
        let response = get_agent_file(&request).ok();
        assert_eq!(response.as_ref().map(|r| r.status), Some(400));
        assert_eq!(
            response.and_then(|r| r.body.get("error").cloned()),
            Some(Value::from("Invalid file_type. Must be 'agent' or 'skills'"))
        );
    }

    #[test]
    fn traversal_in_agent_is_rejected() {
        let request = FunctionRequest::new("docs").with_query("agent", "../../etc");
        assert_eq!(status_of(get_agent_file(&request)), Some(400));
    }

    #[test]
    fn missing_agents_dir_is_not_found() {
        let request = FunctionRequest::new("/no/such/docs/root");
        assert_eq!(status_of(get_agents_file_names(&request)), Some(404));
        assert_eq!(status_of(get_all_agents_and_skills(&request)), Some(404));
    }
}
