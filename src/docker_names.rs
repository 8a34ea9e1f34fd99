// Container id -> name lookup via the local Docker daemon (bollard)

use std::collections::HashMap;

use bollard::Docker;
use bollard::query_parameters::ListContainersOptions;

/// Names of every container the daemon knows, running or not, keyed by full id.
pub async fn resolve_names() -> anyhow::Result<HashMap<String, String>> {
    let docker = Docker::connect_with_unix_defaults()?;
    let options = ListContainersOptions {
        all: true,
        ..Default::default()
    };
    let containers = docker.list_containers(Some(options)).await?;

    let mut names = HashMap::with_capacity(containers.len());
    for c in &containers {
        let Some(id) = c.id.as_ref() else {
            continue;
        };
        let name = c
            .names
            .as_ref()
            .and_then(|n| n.first())
            .map(|n| n.trim_start_matches('/').to_string());
        if let Some(name) = name {
            names.insert(id.clone(), name);
        }
    }
    tracing::debug!(containers = names.len(), "resolved container names");
    Ok(names)
}

/// Daemon names with file-provided names taking precedence. A daemon that
/// cannot be reached leaves only the file names.
pub async fn merged_names(from_file: HashMap<String, String>) -> HashMap<String, String> {
    let mut names = match resolve_names().await {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(error = %e, operation = "resolve_names", "Docker lookup failed, using short ids");
            HashMap::new()
        }
    };
    names.extend(from_file);
    names
}
