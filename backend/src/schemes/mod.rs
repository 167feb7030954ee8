//! Collaborator schemes and consumer groups
//!
//! Every agent belongs to a consumer group. The group names the default
//! decision process of its members and owns the schemes that drive them:
//! what they say (communication) and when their needs surface (need
//! development).

pub mod communication;
pub mod needs;

pub use communication::{CommunicationScheme, SilentScheme, WordOfMouthScheme};
pub use needs::{ActiveNeedsScheme, DormantNeedsScheme, NeedDevelopmentScheme, NeedRequest, NeedTrigger};

use crate::decision::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Communication scheme selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommunicationConfig {
    WordOfMouth { contact_probability: f64 },
    Silent,
}

impl CommunicationConfig {
    pub fn build(&self) -> Box<dyn CommunicationScheme> {
        match self {
            CommunicationConfig::WordOfMouth {
                contact_probability,
            } => Box::new(WordOfMouthScheme::new(*contact_probability)),
            CommunicationConfig::Silent => Box::new(SilentScheme),
        }
    }
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        CommunicationConfig::Silent
    }
}

/// Need-development scheme selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NeedDevelopmentConfig {
    Active {
        #[serde(default)]
        retry_delay: Option<f64>,
    },
    Dormant,
}

impl NeedDevelopmentConfig {
    pub fn build(&self) -> Box<dyn NeedDevelopmentScheme> {
        match self {
            NeedDevelopmentConfig::Active { retry_delay } => Box::new(ActiveNeedsScheme::new(*retry_delay)),
            NeedDevelopmentConfig::Dormant => Box::new(DormantNeedsScheme),
        }
    }
}

impl Default for NeedDevelopmentConfig {
    fn default() -> Self {
        NeedDevelopmentConfig::Active { retry_delay: None }
    }
}

/// A consumer group with its constructed schemes
#[derive(Debug)]
pub struct ConsumerGroup {
    pub name: String,
    pub decision_process: String,
    pub communication: Box<dyn CommunicationScheme>,
    pub needs: Box<dyn NeedDevelopmentScheme>,
}

impl ConsumerGroup {
    pub fn new(
        name: impl Into<String>,
        decision_process: impl Into<String>,
        communication: Box<dyn CommunicationScheme>,
        needs: Box<dyn NeedDevelopmentScheme>,
    ) -> Self {
        Self {
            name: name.into(),
            decision_process: decision_process.into(),
            communication,
            needs,
        }
    }
}

/// Consumer groups of one run, by name
#[derive(Debug, Default)]
pub struct ConsumerGroups {
    groups: BTreeMap<String, ConsumerGroup>,
}

impl ConsumerGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: ConsumerGroup) {
        self.groups.insert(group.name.clone(), group);
    }

    pub fn get(&self, name: &str) -> Option<&ConsumerGroup> {
        self.groups.get(name)
    }

    /// Look up a group that configuration promised exists
    pub fn require(&self, name: &str, referenced_by: &str) -> Result<&ConsumerGroup, ConfigError> {
        self.groups.get(name).ok_or_else(|| ConfigError::UnknownConsumerGroup {
            name: name.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConsumerGroup> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
