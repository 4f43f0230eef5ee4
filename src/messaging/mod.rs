//! Messaging client settings shared by producers and consumers.
//!
//! The module only carries broker identity and topic routing; payload
//! formats belong to the services publishing on these topics.

use std::fmt;

use crate::config::{MessagingConfig, TopicConfig};

/// The fixed set of topics used by the order workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    PaymentRequest,
    PaymentResponse,
    RestaurantApprovalRequest,
    RestaurantApprovalResponse,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::PaymentRequest,
        Topic::PaymentResponse,
        Topic::RestaurantApprovalRequest,
        Topic::RestaurantApprovalResponse,
    ];
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topic::PaymentRequest => "payment-request",
            Topic::PaymentResponse => "payment-response",
            Topic::RestaurantApprovalRequest => "restaurant-approval-request",
            Topic::RestaurantApprovalResponse => "restaurant-approval-response",
        };
        f.write_str(name)
    }
}

/// Broker connection identity and topic names.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagingModule {
    brokers: Vec<String>,
    client_id: String,
    group_id: String,
    topics: TopicConfig,
}

impl MessagingModule {
    pub fn new(config: &MessagingConfig) -> Self {
        let brokers = config
            .bootstrap_servers
            .split(',')
            .map(str::trim)
            .filter(|broker| !broker.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            brokers,
            client_id: config.client_id.clone(),
            group_id: config.group_id.clone(),
            topics: config.topics.clone(),
        }
    }

    pub fn brokers(&self) -> &[String] {
        &self.brokers
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Configured name of `topic`.
    pub fn topic(&self, topic: Topic) -> &str {
        match topic {
            Topic::PaymentRequest => &self.topics.payment_request,
            Topic::PaymentResponse => &self.topics.payment_response,
            Topic::RestaurantApprovalRequest => &self.topics.restaurant_approval_request,
            Topic::RestaurantApprovalResponse => &self.topics.restaurant_approval_response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_brokers_and_resolves_topics() {
        let mut config = MessagingConfig::default();
        config.bootstrap_servers = "kafka-1:9092, kafka-2:9092,".to_string();
        config.topics.payment_request = "payments-in".to_string();

        let module = MessagingModule::new(&config);
        assert_eq!(module.brokers(), ["kafka-1:9092", "kafka-2:9092"]);
        assert_eq!(module.topic(Topic::PaymentRequest), "payments-in");
        assert_eq!(
            module.topic(Topic::RestaurantApprovalResponse),
            "restaurant-approval-response"
        );
    }

    #[test]
    fn default_topic_names_match_display() {
        let module = MessagingModule::new(&MessagingConfig::default());
        for topic in Topic::ALL {
            assert_eq!(module.topic(topic), topic.to_string());
        }
    }
}
