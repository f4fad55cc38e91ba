//! rabbitmq-zabbix - RabbitMQ monitoring for Zabbix
//!
//! This binary runs one check against the RabbitMQ management API and prints
//! its result on stdout for the Zabbix agent.

use anyhow::Result;
use clap::Parser;

use rabbitmq_zabbix::{
    api::ManagementClient, cli::Cli, dispatcher::Dispatcher, sender::Sender,
    transformer::FilterSet,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = cli.resolve_config()?;

    // Initialize logging
    let level = config.logging.tracing_level().unwrap_or(tracing::Level::INFO);
    let log = rabbitmq_zabbix::init_logging(&config.logging.file, level);

    let filters = FilterSet::parse_optional(cli.filters.as_deref())?;
    let client = ManagementClient::from_config(&config.broker)?;
    let sender = Sender::from_config(&config.sender);

    let dispatcher = Dispatcher::new(client, sender)
        .with_filters(filters)
        .with_aliveness_vhost(cli.vhost.clone())
        .with_default_node(config.broker.host.clone())
        .with_log(log);

    let output = dispatcher.run(&cli.request()).await?;
    println!("{}", output.render()?);

    Ok(())
}
