use tomstudy_server::{start_server, ServerConfig};

pub async fn run(
    host: String,
    port: u16,
    db_path: String,
    design_path: String,
    jwt_secret: String,
) -> Result<(), String> {
    let config = ServerConfig {
        host,
        port,
        db_path,
        design_path,
        jwt_secret,
        ..ServerConfig::default()
    };

    let addr = start_server(config).await?;
    println!("tomstudy server listening on http://{}", addr);

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {}", e))?;
    println!("shutting down");
    Ok(())
}
