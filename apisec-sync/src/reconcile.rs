//! Three-way diff between the protected inventory and the desired set, and
//! the driver that applies it one item at a time.

use std::fmt;

use serde::{Deserialize, Serialize};

use apisec_core::{ApiIdentity, ApiSpec, DesiredSet, ExistingInventory, ManagementService, RemoteId, ServiceError};

/// Report bucket an action is recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Added,
    Updated,
    Deleted,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Added => "added",
            Category::Updated => "updated",
            Category::Deleted => "deleted",
        })
    }
}

/// One remote operation, borrowing from the inventory and desired set.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction<'a> {
    Create {
        identity: &'a ApiIdentity,
        spec: &'a ApiSpec,
    },
    Update {
        identity: &'a ApiIdentity,
        spec: &'a ApiSpec,
        remote_id: &'a RemoteId,
    },
    Delete {
        identity: &'a ApiIdentity,
        remote_id: &'a RemoteId,
    },
}

impl<'a> PlannedAction<'a> {
    pub fn identity(&self) -> &'a ApiIdentity {
        match self {
            PlannedAction::Create { identity, .. }
            | PlannedAction::Update { identity, .. }
            | PlannedAction::Delete { identity, .. } => identity,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            PlannedAction::Create { .. } => Category::Added,
            PlannedAction::Update { .. } => Category::Updated,
            PlannedAction::Delete { .. } => Category::Deleted,
        }
    }

    pub fn remote_id(&self) -> Option<&'a RemoteId> {
        match self {
            PlannedAction::Create { .. } => None,
            PlannedAction::Update { remote_id, .. } | PlannedAction::Delete { remote_id, .. } => Some(remote_id),
        }
    }
}

/// Every action needed to converge the inventory on the desired set.
///
/// Each identity of `existing ∪ desired` appears in exactly one action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan<'a> {
    pub actions: Vec<PlannedAction<'a>>,
}

impl<'a> Plan<'a> {
    pub fn count(&self, category: Category) -> usize {
        self.actions.iter().filter(|a| a.category() == category).count()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Compute the plan. Pure.
///
/// Creates and updates come first in identity order, then deletes.
pub fn plan<'a>(existing: &'a ExistingInventory, desired: &'a DesiredSet) -> Plan<'a> {
    let mut actions: Vec<PlannedAction<'a>> = desired
        .iter()
        .map(|(identity, spec)| match existing.get(identity) {
            Some(remote_id) => PlannedAction::Update {
                identity,
                spec,
                remote_id,
            },
            None => PlannedAction::Create { identity, spec },
        })
        .collect();

    actions.extend(
        existing
            .iter()
            .filter(|(identity, _)| !desired.contains_key(*identity))
            .map(|(identity, remote_id)| PlannedAction::Delete { identity, remote_id }),
    );

    Plan { actions }
}

/// Result of one applied action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub category: Category,
    pub identity: ApiIdentity,
    pub error: Option<ServiceError>,
}

/// Results of applying a whole plan, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub items: Vec<ItemOutcome>,
}

impl SyncOutcome {
    pub fn failures(&self) -> usize {
        self.items.iter().filter(|i| i.error.is_some()).count()
    }
}

/// Apply every action of `plan` through `service`.
///
/// Each call is independent: a failure is recorded against its identity and
/// the next action still runs. Nothing is retried.
pub fn apply(plan: &Plan<'_>, service: &dyn ManagementService) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();

    for action in &plan.actions {
        let identity = action.identity();
        let result = match action {
            PlannedAction::Create { spec, .. } => service.create(spec),
            PlannedAction::Update { spec, remote_id, .. } => service.update(remote_id, spec),
            PlannedAction::Delete { remote_id, .. } => service.delete(remote_id),
        };

        match &result {
            Ok(()) => tracing::info!(
                identity = %identity,
                action = %action.category(),
                "synchronized API"
            ),
            Err(err) => tracing::error!(
                identity = %identity,
                action = %action.category(),
                remote_id = ?action.remote_id().map(|id| id.0.as_str()),
                error = %err,
                "failed to synchronize API"
            ),
        }

        outcome.items.push(ItemOutcome {
            category: action.category(),
            identity: identity.clone(),
            error: result.err(),
        });
    }

    outcome
}

/// [`plan`] followed by [`apply`].
pub fn reconcile(existing: &ExistingInventory, desired: &DesiredSet, service: &dyn ManagementService) -> SyncOutcome {
    let plan = plan(existing, desired);
    tracing::info!(
        create = plan.count(Category::Added),
        update = plan.count(Category::Updated),
        delete = plan.count(Category::Deleted),
        "reconciling"
    );
    apply(&plan, service)
}
