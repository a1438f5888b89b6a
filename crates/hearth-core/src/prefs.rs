use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::store::kv::{KvStore, keys, read_json, write_json};

/// Per-device preferences. Stored fields are merged over the defaults, so
/// older documents missing a field still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub current_user_id: Option<String>,
    #[serde(default = "default_route")]
    pub route: String,
    #[serde(default)]
    pub express_enabled: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            current_user_id: None,
            route: default_route(),
            express_enabled: false,
            extra: BTreeMap::new(),
        }
    }
}

impl Preferences {
    pub fn load(kv: &dyn KvStore) -> Result<Self> {
        Ok(read_json(kv, keys::PREFS)?.unwrap_or_default())
    }

    pub fn save(&self, kv: &dyn KvStore) -> Result<()> {
        write_json(kv, keys::PREFS, self)
    }

    /// Selected user, ignoring blank ids.
    #[must_use]
    pub fn current_user(&self) -> Option<&str> {
        self.current_user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

fn default_route() -> String {
    "today".to_string()
}
