use std::fmt::Write as _;

use anyhow::Context;
use weblet::config::Config;
use weblet::server::WebServer;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let server = WebServer::new(&cfg);
    server.on_request(|request, response| {
        let mut body = format!(
            "{} {} HTTP/{}\n",
            request.method(),
            request.url(),
            request.http_version()
        );
        if !request.query_string().is_empty() {
            writeln!(body, "query: {}", request.query_string())?;
        }
        writeln!(body, "from: {}:{}", request.remote_ip(), request.remote_port())?;
        for i in 0..request.headers() {
            writeln!(body, "{}: {}", request.header_name(i), request.header_value(i))?;
        }

        response.set_header("Content-Type", "text/plain; charset=utf-8");
        response.set_header("Content-Length", body.len().to_string());
        response.write_body(body)?;
        Ok(())
    });

    if !server.listen_on_port(&cfg.server.port) {
        anyhow::bail!("could not listen on port {}", cfg.server.port);
    }

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(tokio::signal::ctrl_c())
        .context("waiting for shutdown signal")?;

    tracing::info!("Shutdown signal received");
    server.close();

    Ok(())
}
