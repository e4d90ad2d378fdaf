//! Directory listings for directories without an `index.html`.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

/// Resolve a request path under `base`, refusing anything that climbs out.
pub fn resolve(base: &Path, request_path: &str) -> Option<PathBuf> {
    let mut resolved = base.to_path_buf();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

/// Fallback for the static file service: list the directory or 404.
pub async fn directory_listing(State(base): State<Arc<PathBuf>>, uri: Uri) -> Response {
    let Some(dir) = resolve(&base, uri.path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        // metadata() follows symlinks, so the alias lists as a directory
        if tokio::fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir()) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();

    Html(render(uri.path(), &names)).into_response()
}

fn render(path: &str, names: &[String]) -> String {
    let title = format!("Directory listing for {}", escape(path));
    let items: String = names
        .iter()
        .map(|name| format!("<li><a href=\"{0}\">{0}</a></li>\n", escape(name)))
        .collect();
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n{items}</ul>\n<hr>\n</body>\n</html>\n"
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
