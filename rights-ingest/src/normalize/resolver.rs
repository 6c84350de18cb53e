//! Field resolver capability
//!
//! Consulted in best-effort fill mode before a placeholder is synthesized
//! for a required field the alias table could not find. How a resolver
//! decides (lookup service, model, operator prompt) is its own business.

use serde_json::Value;

/// Supplies a value for a canonical field path, or declines
pub trait FieldResolver: Send + Sync {
    /// `path` uses validator notation (`release.tracks[0].isrc`); `raw` is the
    /// submission as received.
    fn resolve(&self, path: &str, raw: &Value) -> Option<String>;
}

/// Resolver that never resolves anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl FieldResolver for NoopResolver {
    fn resolve(&self, _path: &str, _raw: &Value) -> Option<String> {
        None
    }
}

impl<F> FieldResolver for F
where
    F: Fn(&str, &Value) -> Option<String> + Send + Sync,
{
    fn resolve(&self, path: &str, raw: &Value) -> Option<String> {
        self(path, raw)
    }
}
