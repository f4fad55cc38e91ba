//! Zabbix low-level discovery output
//!
//! Discovery checks print `{"data": [...]}` where each element maps LLD
//! macros such as `{#QUEUENAME}` to strings.

use serde::Serialize;

use crate::api::{Exchange, Node, Queue, Shovel};

/// One discovered resource
///
/// Only the macros relevant to the resource kind are serialized, in the
/// order declared here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveryElement {
    #[serde(rename = "{#NODENAME}", skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(rename = "{#NODETYPE}", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(rename = "{#VHOSTNAME}", skip_serializing_if = "Option::is_none")]
    pub vhost_name: Option<String>,
    #[serde(rename = "{#QUEUENAME}", skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,
    #[serde(rename = "{#EXCHANGENAME}", skip_serializing_if = "Option::is_none")]
    pub exchange_name: Option<String>,
    #[serde(rename = "{#SHOVELNAME}", skip_serializing_if = "Option::is_none")]
    pub shovel_name: Option<String>,
}

impl DiscoveryElement {
    /// `{#NODENAME}`, `{#VHOSTNAME}`, `{#QUEUENAME}`
    pub fn queue(queue: &Queue) -> Self {
        Self {
            node_name: Some(queue.node.clone().unwrap_or_default()),
            vhost_name: Some(queue.vhost.clone()),
            queue_name: Some(queue.name.clone()),
            ..Self::default()
        }
    }

    /// `{#NODENAME}`, `{#VHOSTNAME}`, `{#EXCHANGENAME}`
    ///
    /// Exchanges are cluster-wide, so the node macro carries the short name
    /// of the node reporting them.
    pub fn exchange(exchange: &Exchange, node_short_name: &str) -> Self {
        Self {
            node_name: Some(node_short_name.to_string()),
            vhost_name: Some(exchange.vhost.clone()),
            exchange_name: Some(exchange.name.clone()),
            ..Self::default()
        }
    }

    /// `{#NODENAME}` (host part after `@`), `{#NODETYPE}`
    pub fn node(node: &Node) -> Self {
        Self {
            node_name: Some(node.short_name().to_string()),
            node_type: Some(node.node_type.clone()),
            ..Self::default()
        }
    }

    /// `{#VHOSTNAME}`, `{#SHOVELNAME}`
    pub fn shovel(shovel: &Shovel) -> Self {
        Self {
            vhost_name: Some(shovel.vhost.clone()),
            shovel_name: Some(shovel.name.clone()),
            ..Self::default()
        }
    }
}

/// Top-level discovery document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveryList {
    pub data: Vec<DiscoveryElement>,
}

impl DiscoveryList {
    /// Wrap discovered elements
    pub fn new(data: Vec<DiscoveryElement>) -> Self {
        Self { data }
    }

    /// Single-line JSON document
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl FromIterator<DiscoveryElement> for DiscoveryList {
    fn from_iter<I: IntoIterator<Item = DiscoveryElement>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
