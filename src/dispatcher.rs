//! Check dispatcher
//!
//! Maps a `--check` selector to one fetch → filter → format → emit pass.
//! Every check runs with the dispatcher's own log handle as the scoped
//! default subscriber.

use std::fmt;

use clap::ValueEnum;
use serde_json::Value;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, Dispatch};

use crate::api::{ApiResult, ManagementClient, MetricValue, Overview, Record, Shovel};
use crate::error::{AppError, AppResult};
use crate::sender::Sender;
use crate::transformer::{
    exchange_lines, queue_lines, shovel_lines, DiscoveryElement, DiscoveryList, FilterSet,
    MetricLine,
};

/// Check selector
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Check {
    /// Queue discovery
    #[value(name = "list_queues")]
    ListQueues,
    /// Exchange discovery
    #[value(name = "list_exchanges")]
    ListExchanges,
    /// Node discovery
    #[value(name = "list_nodes")]
    ListNodes,
    /// Shovel discovery
    #[value(name = "list_shovels")]
    ListShovels,
    /// Send queue metrics
    #[value(name = "queues")]
    Queues,
    /// Send exchange metrics
    #[value(name = "exchanges")]
    Exchanges,
    /// Send shovel state
    #[value(name = "shovels")]
    Shovels,
    /// Vhost aliveness test (prints 1 or 0)
    #[value(name = "check_aliveness")]
    CheckAliveness,
    /// Single overview or node value (requires --metric)
    #[value(name = "server")]
    Server,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

/// One requested check
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub check: Check,
    /// Metric name for `server`
    pub metric: Option<String>,
    /// Node host name for `server`; defaults to the broker host
    pub node: Option<String>,
}

impl CheckRequest {
    /// Request without metric or node
    pub fn new(check: Check) -> Self {
        Self {
            check,
            metric: None,
            node: None,
        }
    }

    /// Set the `server` metric name
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    /// Set the `server` node name
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }
}

/// Aliveness test outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aliveness {
    /// Status was "ok"
    Alive,
    /// Endpoint answered with another status
    NotAlive,
    /// The endpoint could not be queried at all
    Unreachable,
}

impl Aliveness {
    /// Zabbix item value: 1 when alive, 0 otherwise
    pub fn as_item_value(&self) -> u8 {
        match self {
            Aliveness::Alive => 1,
            Aliveness::NotAlive | Aliveness::Unreachable => 0,
        }
    }
}

/// `server` check result
#[derive(Debug, Clone, PartialEq)]
pub enum ServerValue {
    /// Overview statistic or missing node field (0)
    Metric(MetricValue),
    /// Raw node field
    Field(Value),
    /// No node matched the requested host name
    NotFound,
}

impl fmt::Display for ServerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerValue::Metric(value) => write!(f, "{}", value),
            ServerValue::Field(Value::String(s)) => f.write_str(s),
            // Zabbix templates compare against `True` / `False`
            ServerValue::Field(Value::Bool(true)) => f.write_str("True"),
            ServerValue::Field(Value::Bool(false)) => f.write_str("False"),
            ServerValue::Field(value) => write!(f, "{}", value),
            ServerValue::NotFound => f.write_str("Not Found"),
        }
    }
}

/// Cluster-wide statistics served from `/api/overview`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewMetric {
    DeliverGetRate,
    PublishRate,
    AckRate,
    MessagesTotal,
    MessagesReady,
    MessagesUnacknowledged,
    Version,
}

impl OverviewMetric {
    /// Recognize a `--metric` name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "message_stats_deliver_get" => Some(Self::DeliverGetRate),
            "message_stats_publish" => Some(Self::PublishRate),
            "message_stats_ack" => Some(Self::AckRate),
            "message_count_total" => Some(Self::MessagesTotal),
            "message_count_ready" => Some(Self::MessagesReady),
            "message_count_unacknowledged" => Some(Self::MessagesUnacknowledged),
            "rabbitmq_version" => Some(Self::Version),
            _ => None,
        }
    }

    /// Pick the statistic out of an overview; missing numbers are 0 and a
    /// missing version is `None`
    pub fn extract(&self, overview: &Overview) -> MetricValue {
        let stats = overview.message_stats.as_ref();
        let totals = overview.queue_totals.as_ref();

        let value = match self {
            Self::DeliverGetRate => stats
                .and_then(|s| s.deliver_get_details.as_ref())
                .and_then(|d| d.rate.clone()),
            Self::PublishRate => stats
                .and_then(|s| s.publish_details.as_ref())
                .and_then(|d| d.rate.clone()),
            Self::AckRate => stats
                .and_then(|s| s.ack_details.as_ref())
                .and_then(|d| d.rate.clone()),
            Self::MessagesTotal => totals.and_then(|t| t.messages.clone()),
            Self::MessagesReady => totals.and_then(|t| t.messages_ready.clone()),
            Self::MessagesUnacknowledged => totals.and_then(|t| t.messages_unacknowledged.clone()),
            Self::Version => {
                return MetricValue::Text(
                    overview
                        .rabbitmq_version
                        .clone()
                        .unwrap_or_else(|| "None".to_string()),
                )
            }
        };

        value.unwrap_or_else(MetricValue::zero)
    }
}

/// Terminal outcome of a check, printed on stdout
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutput {
    /// Discovery document
    Discovery(DiscoveryList),
    /// zabbix_sender exit code
    SenderExit(i32),
    /// Aliveness result
    Aliveness(Aliveness),
    /// `server` value
    Server(ServerValue),
}

impl CheckOutput {
    /// Text printed on stdout
    pub fn render(&self) -> Result<String, serde_json::Error> {
        Ok(match self {
            CheckOutput::Discovery(list) => list.to_json()?,
            CheckOutput::SenderExit(code) => code.to_string(),
            CheckOutput::Aliveness(aliveness) => aliveness.as_item_value().to_string(),
            CheckOutput::Server(value) => value.to_string(),
        })
    }
}

/// Runs checks against one broker
pub struct Dispatcher {
    client: ManagementClient,
    sender: Sender,
    filters: FilterSet,
    aliveness_vhost: String,
    default_node: String,
    log: Dispatch,
}

impl Dispatcher {
    /// Create a dispatcher with match-all filters and the `/` aliveness vhost
    pub fn new(client: ManagementClient, sender: Sender) -> Self {
        Self {
            client,
            sender,
            filters: FilterSet::default(),
            aliveness_vhost: "/".to_string(),
            default_node: "localhost".to_string(),
            log: Dispatch::none(),
        }
    }

    /// Set the record filters
    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Set the vhost tested by `check_aliveness`
    pub fn with_aliveness_vhost(mut self, vhost: impl Into<String>) -> Self {
        self.aliveness_vhost = vhost.into();
        self
    }

    /// Set the node host name used by `server` when none is requested
    pub fn with_default_node(mut self, node: impl Into<String>) -> Self {
        self.default_node = node.into();
        self
    }

    /// Set the log handle checks run under
    pub fn with_log(mut self, log: Dispatch) -> Self {
        self.log = log;
        self
    }

    /// Run one check under the dispatcher's log handle
    pub async fn run(&self, request: &CheckRequest) -> AppResult<CheckOutput> {
        async {
            debug!(check = %request.check, "Started trying to process data");
            let result = self.dispatch(request).await;
            if let Err(e) = &result {
                error!(check = %request.check, error = %e, "Check failed");
            }
            result
        }
        .with_subscriber(self.log.clone())
        .await
    }

    async fn dispatch(&self, request: &CheckRequest) -> AppResult<CheckOutput> {
        let output = match request.check {
            Check::ListQueues => CheckOutput::Discovery(self.list_queues().await?),
            Check::ListExchanges => CheckOutput::Discovery(self.list_exchanges().await?),
            Check::ListNodes => CheckOutput::Discovery(self.list_nodes().await?),
            Check::ListShovels => CheckOutput::Discovery(self.list_shovels().await?),
            Check::Queues => CheckOutput::SenderExit(self.check_queues().await?),
            Check::Exchanges => CheckOutput::SenderExit(self.check_exchanges().await?),
            Check::Shovels => CheckOutput::SenderExit(self.check_shovels().await?),
            Check::CheckAliveness => CheckOutput::Aliveness(self.check_aliveness().await),
            Check::Server => {
                let metric = request
                    .metric
                    .as_deref()
                    .filter(|m| !m.is_empty())
                    .ok_or_else(|| AppError::Usage("Missing required parameter: \"metric\"".into()))?;
                let node = request.node.as_deref().unwrap_or(&self.default_node);
                CheckOutput::Server(self.check_server(metric, node).await?)
            }
        };

        Ok(output)
    }

    /// Discover queues matching the filters
    pub async fn list_queues(&self) -> ApiResult<DiscoveryList> {
        let queues = self.client.queues().await?;

        Ok(self
            .filters
            .select(&queues)
            .into_iter()
            .inspect(|q| debug!(vhost = %q.vhost, queue = %q.name, "Discovered queue"))
            .map(|q| DiscoveryElement::queue(q))
            .collect())
    }

    /// Discover exchanges that have carried messages and match the filters
    ///
    /// Each exchange is reported once, tagged with the first cluster node.
    /// An empty cluster yields an empty list.
    pub async fn list_exchanges(&self) -> ApiResult<DiscoveryList> {
        let nodes = self.client.nodes().await?;
        let Some(node) = nodes.first() else {
            info!("No cluster nodes reported, no exchanges to discover");
            return Ok(DiscoveryList::default());
        };

        let exchanges = self.client.exchanges().await?;
        let active: Vec<_> = exchanges
            .into_iter()
            .filter(|e| e.message_stats.is_some())
            .collect();

        Ok(self
            .filters
            .select(&active)
            .into_iter()
            .inspect(|e| debug!(vhost = %e.vhost, exchange = %e.name, "Discovered exchange"))
            .map(|e| DiscoveryElement::exchange(e, node.short_name()))
            .collect())
    }

    /// Discover cluster nodes
    pub async fn list_nodes(&self) -> ApiResult<DiscoveryList> {
        let nodes = self.client.nodes().await?;

        Ok(nodes
            .iter()
            .inspect(|n| debug!(node = %n.short_name(), node_type = %n.node_type, "Discovered node"))
            .map(|n| DiscoveryElement::node(n))
            .collect())
    }

    /// Discover shovels matching the filters; no shovel plugin means none
    pub async fn list_shovels(&self) -> ApiResult<DiscoveryList> {
        let Some(shovels) = self.shovels_or_none().await? else {
            return Ok(DiscoveryList::default());
        };

        Ok(self
            .filters
            .select(&shovels)
            .into_iter()
            .inspect(|s| debug!(vhost = %s.vhost, shovel = %s.name, "Discovered shovel"))
            .map(|s| DiscoveryElement::shovel(s))
            .collect())
    }

    /// Send metrics for queues matching the filters
    pub async fn check_queues(&self) -> AppResult<i32> {
        let queues = self.client.queues().await?;
        let lines: Vec<MetricLine> = self
            .filters
            .select(&queues)
            .into_iter()
            .flat_map(|q| queue_lines(q))
            .collect();

        self.deliver(&lines).await
    }

    /// Send metrics for active exchanges matching the filters
    pub async fn check_exchanges(&self) -> AppResult<i32> {
        let exchanges = self.client.exchanges().await?;
        let lines: Vec<MetricLine> = self
            .filters
            .select(&exchanges)
            .into_iter()
            .flat_map(|e| exchange_lines(e))
            .collect();

        self.deliver(&lines).await
    }

    /// Send state for shovels matching the filters
    pub async fn check_shovels(&self) -> AppResult<i32> {
        let shovels = self.shovels_or_none().await?.unwrap_or_default();
        let lines: Vec<MetricLine> = self
            .filters
            .select(&shovels)
            .into_iter()
            .flat_map(|s| shovel_lines(s))
            .collect();

        self.deliver(&lines).await
    }

    /// Query the aliveness endpoint; any failure counts as not alive
    pub async fn check_aliveness(&self) -> Aliveness {
        match self.client.aliveness(&self.aliveness_vhost).await {
            Ok(status) if status.is_ok() => Aliveness::Alive,
            Ok(status) => {
                info!(vhost = %self.aliveness_vhost, status = %status.status, "Vhost is not alive");
                Aliveness::NotAlive
            }
            Err(e) => {
                info!(vhost = %self.aliveness_vhost, error = %e, "Aliveness endpoint unreachable");
                Aliveness::Unreachable
            }
        }
    }

    /// Look up an overview statistic or a node field
    ///
    /// `node_name` is reduced to its short host name (up to the first `.`)
    /// and matched as a substring of each node's host part. A single-node
    /// cluster always matches.
    pub async fn check_server(&self, metric: &str, node_name: &str) -> ApiResult<ServerValue> {
        if let Some(overview_metric) = OverviewMetric::from_name(metric) {
            let overview = self.client.overview().await?;
            return Ok(ServerValue::Metric(overview_metric.extract(&overview)));
        }

        let short = node_name.split('.').next().unwrap_or(node_name);
        let nodes = self.client.nodes().await?;
        let count = nodes.len();

        for node in &nodes {
            debug!(
                node_name = short,
                candidate = %node.name,
                metric,
                count,
                "Checking node name"
            );
            if count == 1 || node.short_name().contains(short) {
                let value = match node.field(metric) {
                    None | Some(Value::Null) => ServerValue::Metric(MetricValue::zero()),
                    Some(value) => ServerValue::Field(value.clone()),
                };
                debug!(node = %node.name, value = %value, "Got data from node");
                return Ok(value);
            }
        }

        Ok(ServerValue::NotFound)
    }

    async fn shovels_or_none(&self) -> ApiResult<Option<Vec<Record<Shovel>>>> {
        match self.client.shovels().await {
            Ok(shovels) => Ok(Some(shovels)),
            Err(e) if e.is_not_found() => {
                info!("Shovels endpoint not found, shovel plugin is not enabled");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Hand lines to the sender; an empty batch is still sent
    async fn deliver(&self, lines: &[MetricLine]) -> AppResult<i32> {
        if lines.is_empty() {
            info!("No matching records, sending an empty batch");
        }

        Ok(self.sender.send(lines).await?)
    }
}
