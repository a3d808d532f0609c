use serde::{Deserialize, Serialize};

use crate::reconcile::Keyed;

/// One service unit as reported by the service manager. The unit name is the
/// stable identity the reconciler keys on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceView {
    pub name: String,
    pub pid: Option<i32>,
    pub description: String,
    pub active_state: String,
}

impl Keyed for ServiceView {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}
