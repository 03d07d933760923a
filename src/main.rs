use anyhow::Context;
use tracing::{error, info};

use sentiment_worker::{app::ComponentRegistry, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(|s| s.as_str())
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                thread = thread_name,
                file = location.file(),
                line = location.line(),
                column = location.column(),
                message,
                "panic occurred"
            );
        } else {
            error!(
                thread = thread_name,
                message, "panic occurred without location information"
            );
        }
    }));

    // Tracing initialization is handled by Telemetry::new()
    let config = Config::from_env().context("failed to load configuration")?;
    let registry = ComponentRegistry::build(config).context("failed to build component registry")?;

    let result = registry.pipeline().run().await;
    let output = match result {
        Ok(output) => output,
        Err(error) => {
            registry.telemetry().metrics().runs_failed.inc();
            return Err(error.context("pipeline run failed"));
        }
    };

    registry
        .exporter()
        .export(&output)
        .await
        .context("failed to export report")?;

    info!(
        posts = output.summary.total_posts_analyzed,
        groups = output.summary.groups_analyzed.len(),
        "run finished"
    );
    info!(
        metrics = %registry.telemetry().render_prometheus(),
        "final metrics"
    );

    Ok(())
}
