use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{AdminApiClient, AdminApiConfig, Localization, ResourceEvent};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use admin_console::{
    config,
    controller::{
        admin_settings::{AdminResources, AdminSettingsController},
        events::{classify_connection_failure, UiError, UiErrorContext, UiEvent},
    },
};

#[derive(Parser, Debug)]
#[command(name = "admin-console", about = "Inspect and save node admin settings")]
struct Cli {
    /// Config file; defaults to ./admin.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    session: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load node settings, contexts and receivers and print them as JSON.
    Show {
        #[arg(long, default_value = "/admin/content")]
        path: String,
    },
    /// Load everything, optionally rename the node, then save node and contexts.
    Save {
        #[arg(long, default_value = "/admin/content")]
        path: String,
        #[arg(long)]
        set_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(session) = cli.session {
        settings.session = Some(session);
    }
    if let Some(language) = cli.language {
        settings.language = language;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = AdminApiClient::new(AdminApiConfig {
        base_url: settings.server_url.clone(),
        session: settings.session.clone(),
        language: Some(settings.language.clone()),
        timeout: settings.request_timeout(),
    })
    .map_err(|err| {
        let ui_error = UiError::from_message(
            UiErrorContext::Startup,
            classify_connection_failure(&err.to_string()),
        );
        anyhow!("{}", UiEvent::Error(ui_error).render())
    })?;
    let client = Arc::new(client);
    let mut notifications = client.subscribe_events();

    let localization = Localization::new(settings.language.clone(), settings.node_info.clone())
        .with_strings(settings.strings.clone());

    let path = match &cli.command {
        Command::Show { path } | Command::Save { path, .. } => path.clone(),
    };
    let mut controller = AdminSettingsController::activate(
        &path,
        &localization,
        AdminResources::from_client(client.clone()),
    );
    controller.settled().await;
    drain_notifications(&mut notifications);

    match cli.command {
        Command::Show { .. } => {
            let snapshot = controller.snapshot().await;
            println!(
                "{}",
                serde_json::to_string_pretty(&snapshot).context("failed to encode settings")?
            );
        }
        Command::Save { set_name, .. } => {
            if let Some(name) = set_name {
                controller
                    .edit(|view| {
                        if let Some(node) = view.node.as_mut() {
                            node.name = name;
                        }
                    })
                    .await;
            }

            let result = controller.save_all().await;
            drain_notifications(&mut notifications);
            match result {
                Ok(summary) => println!("{}", UiEvent::Saved(summary).render()),
                Err(err) => {
                    let ui_error = UiError::from(&err);
                    return Err(anyhow!(UiEvent::Error(ui_error).render()));
                }
            }
        }
    }

    Ok(())
}

fn drain_notifications(notifications: &mut broadcast::Receiver<ResourceEvent>) {
    loop {
        match notifications.try_recv() {
            Ok(event) => eprintln!("{}", UiEvent::from_resource_event(&event).render()),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "dropped admin notifications");
            }
            Err(_) => break,
        }
    }
}
