use crate::backend::Backend;
use colored::Colorize;

pub async fn create(backend: &Backend, app: &str) -> anyhow::Result<()> {
    let record = backend.local("app create")?.apps().create_app(app).await?;
    println!("{} {}", "Created app".green(), record.name.cyan());
    Ok(())
}

pub async fn list(backend: &Backend) -> anyhow::Result<()> {
    let apps = backend.local("app list")?.apps().list_apps().await?;
    if apps.is_empty() {
        println!("{}", "No apps".dimmed());
    }
    for app in apps {
        println!("{}\t{}", app.name, app.created_at.to_rfc3339());
    }
    Ok(())
}
