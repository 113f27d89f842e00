use std::collections::BTreeMap;
use std::path::Path;

use crate::Result;

/// Key lookup over a parsed dotenv file, falling back to the process environment.
#[derive(Clone, Default)]
pub struct Env {
    pub dotenv: BTreeMap<String, String>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.dotenv.keys().map(|key| key.as_str()).collect();
        f.debug_struct("Env").field("dotenv_keys", &keys).finish()
    }
}

impl Env {}

/// Parses dotenv contents into a key map, dropping blank values.
///
/// Lines `dotenvy` cannot parse are skipped; one bad line does not hide the rest
/// of the file.
pub fn parse_dotenv(contents: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for entry in dotenvy::from_read_iter(contents.as_bytes()) {
        match entry {
            Ok((key, value)) if !value.trim().is_empty() => {
                out.insert(key, value);
            }
            Ok(_) => {}
            Err(err) => tracing::debug!(error = %err, "skipping unparsable dotenv line"),
        }
    }
    out
}
