//! RabbitMQ Management API 수집 모듈
//!
//! 브로커의 HTTP Management API에서 큐, exchange, 노드, shovel, overview,
//! aliveness 정보를 조회합니다.
//!
//! # Example
//!
//! ```ignore
//! use rabbitmq_zabbix::api::ManagementClient;
//!
//! let client = ManagementClient::new("http://localhost:15672/api")?.with_auth("guest", "guest");
//! let queues = client.queues().await?;
//! ```

mod client;
mod records;

pub use client::{ApiResult, ManagementClient};
pub use records::{
    AlivenessStatus, Exchange, ExchangeMessageStats, MetricValue, Node, Overview,
    OverviewMessageStats, Queue, QueueMessageStats, QueueTotals, RateDetails, Record, Shovel,
};
