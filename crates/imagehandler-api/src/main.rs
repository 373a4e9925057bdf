use imagehandler_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (cache, transforms, routes)
    let (_state, router) = imagehandler_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    imagehandler_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
