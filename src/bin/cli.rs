use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    frappe_customs::cli::run().await?;
    Ok(())
}
