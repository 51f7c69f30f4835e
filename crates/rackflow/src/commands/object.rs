use crate::backend::Backend;
use colored::Colorize;
use rackflow_cloud::{ObjectBody, ObjectStoreOptions};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

pub async fn get(
    backend: &Backend,
    app: &str,
    key: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut body = backend.provider.fetch(app, key).await?;

    match output {
        Some(path) => {
            let mut file = tokio::fs::File::create(&path).await?;
            let written = tokio::io::copy(&mut body, &mut file).await?;
            file.flush().await?;
            eprintln!(
                "{} {} ({} bytes) -> {}",
                "Fetched".green(),
                key.cyan(),
                written,
                path.display()
            );
        }
        None => {
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut body, &mut stdout).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

pub async fn put(
    backend: &Backend,
    app: &str,
    key: &str,
    file: Option<PathBuf>,
    content_type: Option<String>,
) -> anyhow::Result<()> {
    let body: ObjectBody = match &file {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };

    let mut options = ObjectStoreOptions::default();
    if let Some(content_type) = content_type {
        options = options.with_content_type(content_type);
    }

    let object = backend.provider.store(app, key, body, options).await?;
    println!(
        "{} {} ({} bytes)",
        "Stored".green(),
        object.key.cyan(),
        object.size
    );
    Ok(())
}
