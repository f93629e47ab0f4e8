use crate::error::{Error, ResolutionError, ResolutionFailure};
use crate::loader;
use crate::types::pointer::JsonPointer;
use crate::{FRAGMENT_PREFIX, REF_FIELD};
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

/// Upper bound on concurrent external document fetches in one resolution
/// pass. Fetch completion order never affects the result; entries are
/// indexed by location, not by arrival.
const MAX_FETCH_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Report circular references as resolution failures instead of
    /// preserving them as bounded `$ref` nodes.
    pub fail_on_circular: bool,
}

/// Resolution metadata for one `$ref` occurrence in the input document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReferenceEntry {
    /// The reference string as written in the document.
    #[serde(rename = "$ref")]
    pub ref_string: String,

    pub resolved: bool,

    /// True when expanding this reference runs into a cycle; the cycle is
    /// kept as a bounded `$ref` node in the output.
    pub circular: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A fully dereferenced document plus per-occurrence metadata.
///
/// The metadata map holds exactly one entry per `$ref` occurrence in the
/// input document, keyed by the occurrence's fragment pointer.
#[derive(Debug)]
pub struct ResolvedDocument {
    pub document: Value,
    pub references: BTreeMap<String, ReferenceEntry>,
}

/// Walks a document, substituting every `$ref` with its target value.
///
/// External documents are prefetched with bounded concurrency and cached by
/// canonical location, so a location referenced many times is fetched once.
/// A resolver holds no per-call state; one instance may serve concurrent
/// `resolve` calls.
pub struct Resolver {
    options: ResolveOptions,
    documents: DashMap<String, Arc<Value>>,
    failed_documents: DashMap<String, String>,
}

impl Resolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self {
            options,
            documents: DashMap::new(),
            failed_documents: DashMap::new(),
        }
    }

    /// Resolves every `$ref` in `document`, relative references interpreted
    /// against `base`.
    ///
    /// Fails with [`Error::Resolution`] carrying the complete set of
    /// unresolved references; a document that resolves partially never
    /// escapes.
    pub async fn resolve(
        &self,
        document: &Value,
        base: Option<&str>,
    ) -> Result<ResolvedDocument, Error> {
        self.prefetch(document, base).await;

        let mut expansion = Expansion {
            options: self.options,
            documents: &self.documents,
            failed_documents: &self.failed_documents,
            references: BTreeMap::new(),
            failures: Vec::new(),
            cycles_hit: 0,
        };
        let resolved = expansion.expand(document, base, document, &JsonPointer::new(), true, &mut Vec::new());

        if !expansion.failures.is_empty() {
            return Err(ResolutionError {
                failures: expansion.failures,
            }
            .into());
        }
        log::debug!(
            "resolved {} reference(s), {} external document(s)",
            expansion.references.len(),
            self.documents.len()
        );
        Ok(ResolvedDocument {
            document: resolved,
            references: expansion.references,
        })
    }

    /// Fetches every external document reachable from `document` to closure.
    /// Failures are remembered per location and reported during expansion.
    async fn prefetch(&self, document: &Value, base: Option<&str>) {
        let mut pending = BTreeSet::new();
        collect_external_locations(document, base, &mut pending);

        while !pending.is_empty() {
            let batch: Vec<String> = pending
                .iter()
                .filter(|location| {
                    !self.documents.contains_key(*location)
                        && !self.failed_documents.contains_key(*location)
                })
                .cloned()
                .collect();
            pending.clear();
            if batch.is_empty() {
                break;
            }

            let fetched: Vec<(String, Result<Value, crate::error::LoadError>)> =
                stream::iter(batch.into_iter().map(|location| async move {
                    let loaded = loader::load_location(&location).await;
                    (location, loaded)
                }))
                .buffer_unordered(MAX_FETCH_CONCURRENCY)
                .collect()
                .await;

            for (location, loaded) in fetched {
                match loaded {
                    Ok(value) => {
                        collect_external_locations(&value, Some(&location), &mut pending);
                        self.documents.insert(location, Arc::new(value));
                    }
                    Err(load_error) => {
                        log::debug!("failed to fetch {}: {}", location, load_error);
                        self.failed_documents
                            .insert(location, load_error.to_string());
                    }
                }
            }
        }
    }
}

/// Mutable state of one expansion pass.
struct Expansion<'r> {
    options: ResolveOptions,
    documents: &'r DashMap<String, Arc<Value>>,
    failed_documents: &'r DashMap<String, String>,
    references: BTreeMap<String, ReferenceEntry>,
    failures: Vec<ResolutionFailure>,
    cycles_hit: usize,
}

impl Expansion<'_> {
    /// Structurally walks `node`, replacing `$ref` objects with their
    /// expanded targets. `in_root` is true only while walking the input
    /// document at its original positions; metadata is recorded there and
    /// nowhere else, so each occurrence gets exactly one entry.
    fn expand(
        &mut self,
        node: &Value,
        base: Option<&str>,
        root: &Value,
        at: &JsonPointer,
        in_root: bool,
        stack: &mut Vec<String>,
    ) -> Value {
        match node {
            Value::Object(map) => {
                if let Some(ref_string) = map.get(REF_FIELD).and_then(Value::as_str) {
                    return self.expand_ref(node, ref_string, base, root, at, in_root, stack);
                }
                let mut expanded = Map::with_capacity(map.len());
                for (key, value) in map {
                    expanded.insert(
                        key.clone(),
                        self.expand(value, base, root, &at.child(key), in_root, stack),
                    );
                }
                Value::Object(expanded)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.expand(item, base, root, &at.child(index.to_string()), in_root, stack)
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_ref(
        &mut self,
        node: &Value,
        ref_string: &str,
        base: Option<&str>,
        root: &Value,
        at: &JsonPointer,
        in_root: bool,
        stack: &mut Vec<String>,
    ) -> Value {
        let occurrence = at.fragment();
        let (location, fragment) = split_ref(ref_string);

        let joined = match location {
            None => None,
            Some(location) => match join_location(base, location) {
                Ok(joined) => Some(joined),
                Err(reason) => {
                    self.record_failure(
                        in_root,
                        &occurrence,
                        ref_string,
                        format!("invalid location: {reason}"),
                    );
                    return node.clone();
                }
            },
        };

        let segments = match JsonPointer::parse_fragment(fragment) {
            Ok(segments) => segments,
            Err(reason) => {
                self.record_failure(in_root, &occurrence, ref_string, reason);
                return node.clone();
            }
        };

        let target_id = format!(
            "{}{}",
            joined.as_deref().or(base).unwrap_or_default(),
            fragment
        );
        if stack.contains(&target_id) {
            self.cycles_hit += 1;
            if self.options.fail_on_circular {
                self.record_failure(
                    in_root,
                    &occurrence,
                    ref_string,
                    "circular reference".to_string(),
                );
            } else {
                log::trace!("preserving circular reference {}", ref_string);
                self.record_circular(in_root, &occurrence, ref_string);
            }
            return node.clone();
        }

        // Pick the document the fragment resolves against: an external one
        // for a located ref, the current document otherwise.
        let external: Option<Arc<Value>> = match &joined {
            None => None,
            Some(location) => {
                let fetch_failure = self
                    .failed_documents
                    .get(location)
                    .map(|entry| entry.value().clone());
                if let Some(reason) = fetch_failure {
                    self.record_failure(in_root, &occurrence, ref_string, reason);
                    return node.clone();
                }
                let cached = self.documents.get(location).map(|entry| entry.value().clone());
                match cached {
                    Some(document) => Some(document),
                    None => {
                        self.record_failure(
                            in_root,
                            &occurrence,
                            ref_string,
                            format!("external document '{location}' was not loaded"),
                        );
                        return node.clone();
                    }
                }
            }
        };
        let (target_root, target_base): (&Value, Option<&str>) = match &external {
            Some(document) => (document.as_ref(), joined.as_deref()),
            None => (root, base),
        };

        let Some(target) = JsonPointer::lookup(target_root, &segments) else {
            self.record_failure(
                in_root,
                &occurrence,
                ref_string,
                format!("pointer '{fragment}' does not exist"),
            );
            return node.clone();
        };

        let cycles_before = self.cycles_hit;
        stack.push(target_id);
        // Positions inside the target are tracked relative to its own
        // document, so a failure deep in an inlined subtree is reported at
        // the pointer that actually defines it.
        let target_at = JsonPointer(segments);
        let expanded = self.expand(target, target_base, target_root, &target_at, false, stack);
        stack.pop();

        if in_root {
            self.references.insert(
                occurrence,
                ReferenceEntry {
                    ref_string: ref_string.to_string(),
                    resolved: true,
                    circular: self.cycles_hit > cycles_before,
                    error: None,
                },
            );
        }
        expanded
    }

    fn record_failure(
        &mut self,
        in_root: bool,
        occurrence: &str,
        ref_string: &str,
        reason: String,
    ) {
        if in_root {
            self.references.insert(
                occurrence.to_string(),
                ReferenceEntry {
                    ref_string: ref_string.to_string(),
                    resolved: false,
                    circular: false,
                    error: Some(reason.clone()),
                },
            );
        }
        let failure = ResolutionFailure {
            ptr: occurrence.to_string(),
            ref_string: ref_string.to_string(),
            reason,
        };
        // A definition referenced from several places is expanded several
        // times; its broken refs are reported once.
        if !self.failures.contains(&failure) {
            self.failures.push(failure);
        }
    }

    fn record_circular(&mut self, in_root: bool, occurrence: &str, ref_string: &str) {
        if in_root {
            self.references.insert(
                occurrence.to_string(),
                ReferenceEntry {
                    ref_string: ref_string.to_string(),
                    resolved: false,
                    circular: true,
                    error: None,
                },
            );
        }
    }
}

/// Splits a reference string into its location and fragment parts.
/// `other.yaml#/definitions/Pet` -> (`other.yaml`, `#/definitions/Pet`);
/// a bare location addresses the whole external document.
fn split_ref(ref_string: &str) -> (Option<&str>, &str) {
    match ref_string.find(FRAGMENT_PREFIX) {
        Some(0) => (None, ref_string),
        Some(index) => (Some(&ref_string[..index]), &ref_string[index..]),
        None if ref_string.is_empty() => (None, FRAGMENT_PREFIX),
        None => (Some(ref_string), FRAGMENT_PREFIX),
    }
}

/// Canonicalizes an external location against the base location of the
/// document that mentions it.
fn join_location(base: Option<&str>, location: &str) -> Result<String, String> {
    if loader::is_url(location) {
        return Ok(location.to_string());
    }
    match base {
        Some(base) if loader::is_url(base) => url::Url::parse(base)
            .and_then(|url| url.join(location))
            .map(String::from)
            .map_err(|url_error| url_error.to_string()),
        Some(base) => {
            let parent = Path::new(base).parent().unwrap_or_else(|| Path::new(""));
            Ok(parent.join(location).to_string_lossy().into_owned())
        }
        None => Ok(location.to_string()),
    }
}

/// Collects the canonical locations of every externally-located `$ref`
/// reachable in `value`.
fn collect_external_locations(value: &Value, base: Option<&str>, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(ref_string) = map.get(REF_FIELD).and_then(Value::as_str) {
                let (location, _) = split_ref(ref_string);
                if let Some(location) = location {
                    if let Ok(joined) = join_location(base, location) {
                        out.insert(joined);
                    }
                }
            }
            for nested in map.values() {
                collect_external_locations(nested, base, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_external_locations(item, base, out);
            }
        }
        _ => {}
    }
}
