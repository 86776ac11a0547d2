//! Fleet API collaborator
//!
//! The capture orchestrator never talks to a live cluster directly. It is
//! handed an implementation of [`FleetApi`], which lists the items of one
//! resource [`Category`] and resolves single referenced objects.
//!
//! # Category set
//!
//! The categories captured on every run form a fixed, versioned list
//! ([`CAPTURE_CATEGORIES`], version [`CATEGORY_SET_VERSION`]). Adding or
//! reordering categories changes what a capture contains and must bump the
//! version, which is recorded in every capture manifest.

pub mod http_client;

pub use http_client::HttpFleetClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::FleetApiError;

/// Version of [`CAPTURE_CATEGORIES`]
pub const CATEGORY_SET_VERSION: u32 = 1;

/// Categories enumerated by every capture, in capture order
pub const CAPTURE_CATEGORIES: [Category; 6] = [
    Category::Clusters,
    Category::Workloads,
    Category::ClusterSets,
    Category::AccessGrants,
    Category::EventSources,
    Category::EventAddons,
];

/// One class of fleet resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Fleet membership records
    Clusters,
    /// Workload configuration records
    Workloads,
    /// Classification records
    ClusterSets,
    /// Access-grant records
    AccessGrants,
    /// Event sources
    EventSources,
    /// Event-triggered addons
    EventAddons,
}

impl Category {
    /// Directory name inside a capture, also the Fleet API path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Clusters => "clusters",
            Category::Workloads => "workloads",
            Category::ClusterSets => "clustersets",
            Category::AccessGrants => "accessgrants",
            Category::EventSources => "eventsources",
            Category::EventAddons => "eventaddons",
        }
    }

    /// Whether items of this category point at config/secret objects that
    /// are captured alongside them
    pub fn follows_references(&self) -> bool {
        matches!(self, Category::Workloads | Category::AccessGrants)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a single object. `namespace` is `None` for cluster-scoped objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectRef {
    pub fn new(kind: &str, namespace: Option<&str>, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}/{}", self.kind, namespace, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

/// One object returned by the Fleet API.
///
/// `payload` is opaque to the scheduler. `references` lists the config/secret
/// objects the item points at; it is only followed for categories where
/// [`Category::follows_references`] holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetItem {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ObjectRef>,
    pub payload: serde_json::Value,
}

impl FleetItem {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            kind: self.kind.clone(),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }
}

/// Read-only access to fleet state
#[async_trait]
pub trait FleetApi: Send + Sync {
    /// List every item of one category
    async fn list_category(&self, category: Category) -> Result<Vec<FleetItem>, FleetApiError>;

    /// Resolve one referenced config/secret-like object
    async fn get_referenced(&self, reference: &ObjectRef) -> Result<FleetItem, FleetApiError>;
}
