//! Scriptable in-memory Fleet API
//!
//! Items, missing categories and failures are set per category; referenced
//! objects are resolved from a lookup table. Every call is recorded so tests
//! can assert which categories a capture actually enumerated.
//!
//! An obstruction puts a directory where a capture is about to write an
//! object file, so that write fails mid-capture.

use async_trait::async_trait;
use fleet_snapshot::{Category, FleetApi, FleetApiError, FleetItem, ObjectRef};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeFleet {
    items: Mutex<HashMap<Category, Vec<FleetItem>>>,
    failing: Mutex<HashMap<Category, String>>,
    missing: Mutex<HashSet<Category>>,
    referenced: Mutex<HashMap<ObjectRef, FleetItem>>,
    listed: Mutex<Vec<Category>>,
    obstructions: Mutex<HashMap<Category, PathBuf>>,
}

impl FakeFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(self, category: Category, items: Vec<FleetItem>) -> Self {
        self.set_items(category, items);
        self
    }

    pub fn with_referenced(self, item: FleetItem) -> Self {
        self.referenced.lock().unwrap().insert(item.object_ref(), item);
        self
    }

    pub fn failing(self, category: Category, reason: &str) -> Self {
        self.fail(category, reason);
        self
    }

    pub fn missing(self, category: Category) -> Self {
        self.missing.lock().unwrap().insert(category);
        self
    }

    /// Create a non-empty directory at `path` when `category` is listed
    pub fn obstructing(self, category: Category, path: PathBuf) -> Self {
        self.obstructions.lock().unwrap().insert(category, path);
        self
    }

    pub fn set_items(&self, category: Category, items: Vec<FleetItem>) {
        self.items.lock().unwrap().insert(category, items);
    }

    pub fn fail(&self, category: Category, reason: &str) {
        self.failing.lock().unwrap().insert(category, reason.to_string());
    }

    pub fn heal(&self, category: Category) {
        self.failing.lock().unwrap().remove(&category);
    }

    /// Categories listed so far, in call order
    pub fn listed(&self) -> Vec<Category> {
        self.listed.lock().unwrap().clone()
    }
}

#[async_trait]
impl FleetApi for FakeFleet {
    async fn list_category(&self, category: Category) -> Result<Vec<FleetItem>, FleetApiError> {
        self.listed.lock().unwrap().push(category);

        if let Some(path) = self.obstructions.lock().unwrap().get(&category) {
            std::fs::create_dir_all(path.join("occupied")).unwrap();
        }

        if let Some(reason) = self.failing.lock().unwrap().get(&category) {
            return Err(FleetApiError::Request {
                resource: category.to_string(),
                reason: reason.clone(),
            });
        }
        if self.missing.lock().unwrap().contains(&category) {
            return Err(FleetApiError::NotFound {
                resource: category.to_string(),
            });
        }

        Ok(self
            .items
            .lock()
            .unwrap()
            .get(&category)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_referenced(&self, reference: &ObjectRef) -> Result<FleetItem, FleetApiError> {
        self.referenced
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| FleetApiError::NotFound {
                resource: reference.to_string(),
            })
    }
}
