use serde::{Deserialize, Serialize};

use crate::reconcile::Keyed;

/// One display-server client, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationView {
    pub name: String,
    pub status: String,
}

impl Keyed for ApplicationView {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}
