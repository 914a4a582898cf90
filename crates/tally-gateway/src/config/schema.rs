use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;
use tally_core::counter::{is_valid_name, CounterKey};
use tally_core::error::{Result, TallyError};

/// Paths owned by the operational endpoints.
pub const RESERVED_PATHS: [&str; 3] = ["/healthz", "/readyz", "/metrics"];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub counters: Vec<CounterConfig>,
}

impl TallyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TallyError::UnsupportedVersion);
        }
        if self.counters.is_empty() {
            return Err(TallyError::BadRequest("counters must not be empty".into()));
        }

        self.server.validate()?;
        self.store.validate()?;

        let mut seen = HashSet::new();
        for c in &self.counters {
            c.validate()?;
            if !seen.insert(c.path.as_str()) {
                return Err(TallyError::BadRequest(format!(
                    "duplicate counter path: {}",
                    c.path
                )));
            }
        }

        Ok(())
    }

    /// Resolve the store address of a configured counter.
    pub fn counter_key(&self, counter: &CounterConfig) -> CounterKey {
        let table = counter.table.as_deref().unwrap_or(&self.store.table);
        CounterKey::new(table, &counter.key_id, &counter.attribute)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            TallyError::BadRequest(format!(
                "server.listen must be a valid socket address ({}): {e}",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub kind: StoreKind,

    /// Database file, required for `sqlite`.
    #[serde(default)]
    pub path: Option<String>,

    /// Logical table used by counters that do not name their own.
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: None,
            table: default_table(),
        }
    }
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if !is_valid_name(&self.table) {
            return Err(TallyError::BadRequest(format!(
                "store.table must be non-empty [A-Za-z0-9_-]: {:?}",
                self.table
            )));
        }
        if self.kind == StoreKind::Sqlite && self.path.as_deref().map_or(true, str::is_empty) {
            return Err(TallyError::BadRequest(
                "store.path is required when store.kind is sqlite".into(),
            ));
        }
        Ok(())
    }
}

fn default_table() -> String {
    "visitor-count".into()
}

/// What an endpoint does when the store rejects the increment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Answer 500 with a JSON string describing the error.
    #[default]
    Respond,
    /// Leave the error to the host's generic failure response.
    Propagate,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterConfig {
    pub path: String,
    pub key_id: String,
    pub response_field_name: String,

    #[serde(default)]
    pub on_store_error: ErrorPolicy,

    #[serde(default)]
    pub table: Option<String>,

    #[serde(default = "default_attribute")]
    pub attribute: String,
}

impl CounterConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.path.starts_with('/') {
            return Err(TallyError::BadRequest(format!(
                "counter path must start with '/': {}",
                self.path
            )));
        }
        // captures and wildcards would make the route match more than one path
        if self.path.contains(&[':', '*', '{', '}'][..]) {
            return Err(TallyError::BadRequest(format!(
                "counter path must be a literal path: {}",
                self.path
            )));
        }
        if RESERVED_PATHS.contains(&self.path.as_str()) {
            return Err(TallyError::BadRequest(format!(
                "counter path is reserved: {}",
                self.path
            )));
        }
        if self.key_id.is_empty() {
            return Err(TallyError::BadRequest(format!(
                "counter {}: key_id must not be empty",
                self.path
            )));
        }
        if self.response_field_name.is_empty() {
            return Err(TallyError::BadRequest(format!(
                "counter {}: response_field_name must not be empty",
                self.path
            )));
        }
        if !is_valid_name(&self.attribute) {
            return Err(TallyError::BadRequest(format!(
                "counter {}: attribute must be non-empty [A-Za-z0-9_-]",
                self.path
            )));
        }
        if let Some(t) = &self.table {
            if !is_valid_name(t) {
                return Err(TallyError::BadRequest(format!(
                    "counter {}: table must be non-empty [A-Za-z0-9_-]",
                    self.path
                )));
            }
        }
        Ok(())
    }
}

fn default_attribute() -> String {
    "visitor_count".into()
}
