// SPDX-License-Identifier: GPL-3.0-only

use hotplug_config::config::Config;
use hotplug_config::{HotplugConfig, HotplugSession, QueuedInput, backend};

#[macro_use]
extern crate tracing;

fn setup_logs() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(format!(
        "warn,{}=info",
        env!("CARGO_CRATE_NAME")
    )));

    if let Ok(journal_layer) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .with(journal_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    setup_logs();

    let config = Config::load();
    info!("Using {:?} hotplug backend", config.backend);

    let mut hotplug = HotplugConfig::new(backend::from_kind(config.backend, &config));
    hotplug.pre_init();
    hotplug.init();

    let mut session = HotplugSession::new(hotplug.backend_name(), QueuedInput::new());

    if config.probe_on_start {
        hotplug.odev_probe(|description| {
            session.add_output_device(description);
        });
    }

    let (tx, rx) = tokio::sync::mpsc::channel(100);
    hotplug.listen(tx);

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };
    session.run(rx, shutdown).await;

    hotplug.fini();
    session.close();
    Ok(())
}
