//! zabbix_sender input format
//!
//! This module projects queue, exchange and shovel records into metric
//! lines and renders them in the `zabbix_sender -i` batch format.
//!
//! # Format Specification
//!
//! ```text
//! - "<key>" <value>
//! ```
//!
//! The leading `-` tells the sender to use the host name from the agent
//! configuration (or `-s`). Keys are emitted verbatim: vhost and resource
//! names are not escaped.

use std::fmt;

use tracing::debug;

use crate::api::{Exchange, MetricValue, Queue, Shovel};

/// Direct queue fields, in output order
pub const QUEUE_FIELDS: [&str; 4] = ["memory", "messages", "messages_unacknowledged", "consumers"];

/// Queue fields nested under `message_stats`, in output order
pub const QUEUE_MESSAGE_STATS_FIELDS: [&str; 3] = ["deliver_get", "publish", "ack"];

/// Exchange fields nested under `message_stats`, in output order
pub const EXCHANGE_MESSAGE_STATS_FIELDS: [&str; 3] = ["confirm", "publish_in", "publish_out"];

/// A single item value for zabbix_sender
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine {
    /// Item key, e.g. `rabbitmq.queues[/,queue_messages,orders]`
    pub key: String,
    /// Item value
    pub value: MetricValue,
}

impl MetricLine {
    /// Create a new metric line
    pub fn new(key: impl Into<String>, value: MetricValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- \"{}\" {}", self.key, self.value)
    }
}

fn value_or_zero(value: Option<&MetricValue>) -> MetricValue {
    value.cloned().unwrap_or_else(MetricValue::zero)
}

/// Metric lines for one queue
///
/// Always yields seven lines: the four direct fields followed by the three
/// `message_stats` fields. Missing fields are reported as `0`.
pub fn queue_lines(queue: &Queue) -> Vec<MetricLine> {
    let direct = [
        &queue.memory,
        &queue.messages,
        &queue.messages_unacknowledged,
        &queue.consumers,
    ];

    let stats = queue.message_stats.as_ref();
    let nested = [
        stats.and_then(|s| s.deliver_get.as_ref()),
        stats.and_then(|s| s.publish.as_ref()),
        stats.and_then(|s| s.ack.as_ref()),
    ];

    let mut lines = Vec::with_capacity(QUEUE_FIELDS.len() + QUEUE_MESSAGE_STATS_FIELDS.len());

    for (field, value) in QUEUE_FIELDS.iter().zip(direct) {
        lines.push(MetricLine::new(
            format!("rabbitmq.queues[{},queue_{},{}]", queue.vhost, field, queue.name),
            value_or_zero(value.as_ref()),
        ));
    }

    for (field, value) in QUEUE_MESSAGE_STATS_FIELDS.iter().zip(nested) {
        lines.push(MetricLine::new(
            format!(
                "rabbitmq.queues[{},queue_message_stats_{},{}]",
                queue.vhost, field, queue.name
            ),
            value_or_zero(value),
        ));
    }

    log_lines(&lines);
    lines
}

/// Metric lines for one exchange
///
/// Exchanges without `message_stats` have never routed a message and yield
/// no lines at all.
pub fn exchange_lines(exchange: &Exchange) -> Vec<MetricLine> {
    let Some(stats) = exchange.message_stats.as_ref() else {
        debug!(exchange = %exchange.name, "Exchange has no message_stats, skipping");
        return Vec::new();
    };

    let values = [&stats.confirm, &stats.publish_in, &stats.publish_out];

    let lines: Vec<MetricLine> = EXCHANGE_MESSAGE_STATS_FIELDS
        .iter()
        .zip(values)
        .map(|(field, value)| {
            MetricLine::new(
                format!(
                    "rabbitmq.exchanges[{},{},{}]",
                    exchange.vhost, field, exchange.name
                ),
                value_or_zero(value.as_ref()),
            )
        })
        .collect();

    log_lines(&lines);
    lines
}

/// Metric line for one shovel's `state`
pub fn shovel_lines(shovel: &Shovel) -> Vec<MetricLine> {
    let lines = vec![MetricLine::new(
        format!("rabbitmq.shovels[{},shovel_state,{}]", shovel.vhost, shovel.name),
        value_or_zero(shovel.state.as_ref()),
    )];

    log_lines(&lines);
    lines
}

/// Render lines as the sender's input file body (one line each, trailing newline)
pub fn render(lines: &[MetricLine]) -> String {
    let mut output = String::with_capacity(lines.len() * 64);
    for line in lines {
        output.push_str(&line.to_string());
        output.push('\n');
    }
    output
}

fn log_lines(lines: &[MetricLine]) {
    for line in lines {
        debug!("SENDER_DATA: {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn queue(value: serde_json::Value) -> Queue {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_queue_lines_order_and_keys() {
        let lines = queue_lines(&queue(json!({
            "name": "orders",
            "vhost": "/",
            "memory": 2048,
            "messages": 5,
            "messages_unacknowledged": 1,
            "consumers": 2,
            "message_stats": {"deliver_get": 10, "publish": 12, "ack": 9}
        })));

        let keys: Vec<_> = lines.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "rabbitmq.queues[/,queue_memory,orders]",
                "rabbitmq.queues[/,queue_messages,orders]",
                "rabbitmq.queues[/,queue_messages_unacknowledged,orders]",
                "rabbitmq.queues[/,queue_consumers,orders]",
                "rabbitmq.queues[/,queue_message_stats_deliver_get,orders]",
                "rabbitmq.queues[/,queue_message_stats_publish,orders]",
                "rabbitmq.queues[/,queue_message_stats_ack,orders]",
            ]
        );
        assert_eq!(lines[0].value, MetricValue::Unsigned(2048));
        assert_eq!(lines[6].value, MetricValue::Unsigned(9));
    }

    #[test]
    fn test_queue_missing_fields_default_to_zero() {
        let lines = queue_lines(&queue(json!({"name": "idle", "vhost": "app"})));
        assert_eq!(lines.len(), 7);
        assert!(lines.iter().all(|l| l.value == MetricValue::zero()));
        assert_eq!(
            lines[3].to_string(),
            "- \"rabbitmq.queues[app,queue_consumers,idle]\" 0"
        );
    }

    #[test]
    fn test_queue_partial_message_stats() {
        let lines = queue_lines(&queue(json!({
            "name": "b", "vhost": "/", "messages": 0, "message_stats": {"ack": 3}
        })));
        assert_eq!(lines[4].value, MetricValue::zero());
        assert_eq!(lines[5].value, MetricValue::zero());
        assert_eq!(lines[6].value, MetricValue::Unsigned(3));
    }

    #[test]
    fn test_exchange_lines() {
        let exchange: Exchange = serde_json::from_value(json!({
            "name": "events",
            "vhost": "/",
            "message_stats": {"publish_in": 40, "publish_out": 38}
        }))
        .unwrap();

        let rendered: Vec<_> = exchange_lines(&exchange)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            rendered,
            vec![
                "- \"rabbitmq.exchanges[/,confirm,events]\" 0",
                "- \"rabbitmq.exchanges[/,publish_in,events]\" 40",
                "- \"rabbitmq.exchanges[/,publish_out,events]\" 38",
            ]
        );
    }

    #[test]
    fn test_exchange_without_stats_is_skipped() {
        let exchange: Exchange =
            serde_json::from_value(json!({"name": "amq.direct", "vhost": "/"})).unwrap();
        assert!(exchange_lines(&exchange).is_empty());
    }

    #[test]
    fn test_shovel_lines() {
        let shovel: Shovel = serde_json::from_value(json!({
            "name": "move-orders", "vhost": "/", "state": "running"
        }))
        .unwrap();
        assert_eq!(
            shovel_lines(&shovel)[0].to_string(),
            "- \"rabbitmq.shovels[/,shovel_state,move-orders]\" running"
        );

        let shovel: Shovel =
            serde_json::from_value(json!({"name": "s", "vhost": "/"})).unwrap();
        assert_eq!(shovel_lines(&shovel)[0].value, MetricValue::zero());
    }

    #[test]
    fn test_render_trailing_newline() {
        let lines = vec![
            MetricLine::new("a", MetricValue::from(1u64)),
            MetricLine::new("b", MetricValue::from("x")),
        ];
        assert_eq!(render(&lines), "- \"a\" 1\n- \"b\" x\n");
        assert_eq!(render(&[]), "");
    }
}
