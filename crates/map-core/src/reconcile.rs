//! Dataset-to-engine reconciliation.
//!
//! Each category owns one GeoJSON source and one fill layer. The pair is
//! created the first time a dataset is forwarded and only updated in place
//! afterwards. Nothing is touched until every category has a dataset.

use std::collections::HashMap;
use std::sync::Arc;

use advisory_common::{Category, FeatureCollection};
use tracing::{debug, info, warn};

use crate::engine::{FillLayer, MapEngine};
use crate::error::MapResult;
use crate::handle::{LoadedSignal, MapHandle};

/// Latest dataset per category, as held by the host.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    inner: HashMap<Category, Arc<FeatureCollection>>,
}

impl Datasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category, data: Arc<FeatureCollection>) -> Self {
        self.set(category, data);
        self
    }

    pub fn set(&mut self, category: Category, data: Arc<FeatureCollection>) {
        self.inner.insert(category, data);
    }

    pub fn clear(&mut self, category: Category) {
        self.inner.remove(&category);
    }

    pub fn get(&self, category: Category) -> Option<&Arc<FeatureCollection>> {
        self.inner.get(&category)
    }

    /// Categories that have no dataset yet.
    pub fn missing(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| !self.inner.contains_key(c))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

impl FromIterator<(Category, Arc<FeatureCollection>)> for Datasets {
    fn from_iter<I: IntoIterator<Item = (Category, Arc<FeatureCollection>)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// What happened to one category's source and layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerAction {
    /// Source and layer were added.
    Created,
    /// Source data was replaced in place.
    Updated,
    /// Same dataset as last time; no engine calls.
    Unchanged,
}

/// Outcome of a reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// Map not loaded or no longer live.
    NotReady,
    /// Waiting for the listed categories' datasets.
    Deferred { missing: Vec<Category> },
    Applied(Vec<(Category, LayerAction)>),
}

/// Forwards datasets to the engine for one handle lifetime.
#[derive(Debug, Default)]
pub struct LayerReconciler {
    applied: HashMap<Category, Arc<FeatureCollection>>,
}

impl LayerReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the engine's sources and layers in line with `datasets`.
    pub fn reconcile<E: MapEngine>(
        &mut self,
        handle: &MapHandle<E>,
        loaded: &LoadedSignal,
        datasets: &Datasets,
    ) -> MapResult<Reconciled> {
        if !loaded.is_loaded() {
            return Ok(Reconciled::NotReady);
        }

        let missing = datasets.missing();
        if !missing.is_empty() {
            debug!(?missing, "Deferring layer reconciliation until all datasets are present");
            return Ok(Reconciled::Deferred { missing });
        }

        let outcome = handle.with(|engine| -> MapResult<Vec<(Category, LayerAction)>> {
            let mut actions = Vec::with_capacity(Category::ALL.len());
            for category in Category::ALL {
                let Some(data) = datasets.get(category) else {
                    continue;
                };
                let action = self.reconcile_category(engine, category, data)?;
                actions.push((category, action));
            }
            Ok(actions)
        });

        match outcome {
            Some(actions) => Ok(Reconciled::Applied(actions?)),
            None => Ok(Reconciled::NotReady),
        }
    }

    fn reconcile_category<E: MapEngine>(
        &mut self,
        engine: &mut E,
        category: Category,
        data: &Arc<FeatureCollection>,
    ) -> MapResult<LayerAction> {
        let spec = category.spec();

        if !engine.has_source(spec.source_id) {
            engine.add_source(spec.source_id, Arc::clone(data))?;
            let layer = FillLayer::new(spec.layer_id, spec.source_id, spec.paint());
            if let Err(e) = engine.add_layer(layer) {
                // Leave no orphaned source behind
                if let Err(rollback) = engine.remove_source(spec.source_id) {
                    warn!(
                        category = %category,
                        error = %rollback,
                        "Failed to remove source after layer creation failed"
                    );
                }
                return Err(e);
            }
            self.applied.insert(category, Arc::clone(data));
            info!(
                category = %category,
                features = data.len(),
                "Created advisory source and layer"
            );
            return Ok(LayerAction::Created);
        }

        if self
            .applied
            .get(&category)
            .is_some_and(|last| Arc::ptr_eq(last, data))
        {
            return Ok(LayerAction::Unchanged);
        }

        engine.set_source_data(spec.source_id, Arc::clone(data))?;
        self.applied.insert(category, Arc::clone(data));
        debug!(category = %category, features = data.len(), "Updated advisory source data");
        Ok(LayerAction::Updated)
    }

    /// Forget what was applied; used when the handle is torn down.
    pub fn reset(&mut self) {
        self.applied.clear();
    }
}
