use crate::backend::Backend;

pub async fn handle(
    backend: &Backend,
    logical_id: &str,
    app: Option<String>,
    stack: Option<String>,
) -> anyhow::Result<()> {
    let provider = &backend.provider;
    let physical_id = match (app, stack) {
        (Some(app), _) => provider.resolve_app_resource(&app, logical_id).await?,
        (None, Some(stack)) => provider.resolve_stack_resource(&stack, logical_id).await?,
        (None, None) => provider.resolve_rack_resource(logical_id).await?,
    };
    println!("{physical_id}");
    Ok(())
}

pub async fn repository(backend: &Backend, app: &str) -> anyhow::Result<()> {
    let address = backend.provider.app_repository_address(app).await?;
    println!("{address}");
    Ok(())
}
