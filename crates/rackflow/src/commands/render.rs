use crate::backend::Backend;
use anyhow::Context;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Template data from a file or stdin (`-`); the rack name is filled in
/// when the data does not set one
pub fn load_data(backend: &Backend, path: Option<&Path>) -> anyhow::Result<Value> {
    let mut data = match path {
        None => Value::Object(Map::new()),
        Some(path) => {
            let content = if path == Path::new("-") {
                let mut content = String::new();
                std::io::stdin()
                    .read_to_string(&mut content)
                    .context("Failed to read template data from stdin")?;
                content
            } else {
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?
            };
            serde_json::from_str(&content).context("Template data is not valid JSON")?
        }
    };

    if let Value::Object(map) = &mut data {
        map.entry("rack")
            .or_insert_with(|| Value::String(backend.provider.config().rack.clone()));
    }
    Ok(data)
}

pub async fn handle(backend: &Backend, name: &str, data: Option<PathBuf>) -> anyhow::Result<()> {
    let data = load_data(backend, data.as_deref())?;
    let document = backend.provider.render(name, &data)?;
    println!("{document}");
    Ok(())
}
