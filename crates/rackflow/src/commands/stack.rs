use crate::backend::Backend;
use crate::commands::render::load_data;
use colored::Colorize;
use std::path::PathBuf;

pub async fn create(
    backend: &Backend,
    stack: &str,
    template: &str,
    data: Option<PathBuf>,
) -> anyhow::Result<()> {
    let local = backend.local("stack create")?;
    let data = load_data(backend, data.as_deref())?;
    let document = backend.provider.render(template, &data)?;

    let record = local.stacks().create_stack(stack, &document).await?;
    println!("{} {}", "Created stack".green(), record.name.cyan());
    for (logical, physical) in &record.resources {
        println!("  {logical}\t{physical}");
    }
    Ok(())
}
