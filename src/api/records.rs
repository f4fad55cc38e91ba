//! Management API 응답 레코드
//!
//! 브로커 API가 반환하는 JSON 객체를 타입이 있는 뷰로 디코딩합니다.
//! 필터 매칭은 임의의 필드를 대상으로 하므로 원본 필드 맵도 함께 보관합니다.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;

/// 스칼라 메트릭 값
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// 부호 없는 정수 (카운터, 바이트 수)
    Unsigned(u64),
    /// 음수 정수
    Signed(i64),
    /// 실수 (rate)
    Float(f64),
    /// 문자열 (shovel state, 버전)
    Text(String),
}

impl MetricValue {
    /// 필드가 없을 때 사용하는 기본값
    pub fn zero() -> Self {
        MetricValue::Unsigned(0)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Unsigned(n) => write!(f, "{}", n),
            MetricValue::Signed(n) => write!(f, "{}", n),
            MetricValue::Float(n) => write!(f, "{}", n),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for MetricValue {
    fn from(n: u64) -> Self {
        MetricValue::Unsigned(n)
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::Text(s.to_string())
    }
}

/// 원본 필드 맵과 타입 뷰를 함께 가진 API 레코드
#[derive(Debug, Clone)]
pub struct Record<T> {
    fields: Map<String, Value>,
    view: T,
}

impl<T> Record<T> {
    /// 원본 필드 맵
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// 이름으로 원본 필드 조회
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl<T: DeserializeOwned> Record<T> {
    /// JSON 값에서 레코드 생성
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.view
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Record<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let view = T::deserialize(&value).map_err(de::Error::custom)?;

        match value {
            Value::Object(fields) => Ok(Record { fields, view }),
            _ => Err(de::Error::custom("expected a JSON object record")),
        }
    }
}

/// `GET /api/queues` 항목
#[derive(Debug, Clone, Deserialize)]
pub struct Queue {
    pub name: String,
    pub vhost: String,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub memory: Option<MetricValue>,
    #[serde(default)]
    pub messages: Option<MetricValue>,
    #[serde(default)]
    pub messages_unacknowledged: Option<MetricValue>,
    #[serde(default)]
    pub consumers: Option<MetricValue>,
    #[serde(default)]
    pub message_stats: Option<QueueMessageStats>,
}

/// 큐의 `message_stats` 하위 맵
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueMessageStats {
    #[serde(default)]
    pub deliver_get: Option<MetricValue>,
    #[serde(default)]
    pub publish: Option<MetricValue>,
    #[serde(default)]
    pub ack: Option<MetricValue>,
}

/// `GET /api/exchanges` 항목
#[derive(Debug, Clone, Deserialize)]
pub struct Exchange {
    pub name: String,
    pub vhost: String,
    /// 메시지를 한 번도 받지 않은 exchange에는 없음
    #[serde(default)]
    pub message_stats: Option<ExchangeMessageStats>,
}

/// exchange의 `message_stats` 하위 맵
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangeMessageStats {
    #[serde(default)]
    pub confirm: Option<MetricValue>,
    #[serde(default)]
    pub publish_in: Option<MetricValue>,
    #[serde(default)]
    pub publish_out: Option<MetricValue>,
}

/// `GET /api/nodes` 항목
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    /// `rabbit@host` 형식의 Erlang 노드 이름
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
}

impl Node {
    /// `@` 뒤의 호스트 부분 (`@`가 없으면 전체 이름)
    pub fn short_name(&self) -> &str {
        self.name
            .split_once('@')
            .map(|(_, host)| host)
            .unwrap_or(&self.name)
    }
}

/// `GET /api/shovels` 항목
#[derive(Debug, Clone, Deserialize)]
pub struct Shovel {
    pub name: String,
    #[serde(default)]
    pub vhost: String,
    #[serde(default)]
    pub state: Option<MetricValue>,
}

/// `GET /api/overview` 응답
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Overview {
    #[serde(default)]
    pub rabbitmq_version: Option<String>,
    #[serde(default)]
    pub message_stats: Option<OverviewMessageStats>,
    #[serde(default)]
    pub queue_totals: Option<QueueTotals>,
}

/// overview의 `message_stats`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverviewMessageStats {
    #[serde(default)]
    pub deliver_get_details: Option<RateDetails>,
    #[serde(default)]
    pub publish_details: Option<RateDetails>,
    #[serde(default)]
    pub ack_details: Option<RateDetails>,
}

/// `*_details` 하위 맵
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateDetails {
    #[serde(default)]
    pub rate: Option<MetricValue>,
}

/// overview의 `queue_totals`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueTotals {
    #[serde(default)]
    pub messages: Option<MetricValue>,
    #[serde(default)]
    pub messages_ready: Option<MetricValue>,
    #[serde(default)]
    pub messages_unacknowledged: Option<MetricValue>,
}

/// `GET /api/aliveness-test/<vhost>` 응답
#[derive(Debug, Clone, Deserialize)]
pub struct AlivenessStatus {
    pub status: String,
}

impl AlivenessStatus {
    /// status가 대소문자 구분 없이 "ok"인지 확인
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
