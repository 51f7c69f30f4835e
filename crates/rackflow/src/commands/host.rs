use crate::backend::Backend;

pub async fn handle(backend: &Backend, iface: &str, subnet: &str, host: &str) -> anyhow::Result<()> {
    let address = backend.provider.create_host(iface, subnet, host).await?;
    println!("{address}");
    Ok(())
}
