//! Decoder registry.
//!
//! A registry is an immutable, priority-ordered list of decoders. Decoding a
//! section for a type tries every decoder that accepts the type, highest
//! priority first, until one produces a value or one aborts.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use markflow_pipeline::BoxError;
use serde::de::DeserializeOwned;

use crate::decode::{DecodeFailure, DecodeOutcome, DecodeRequest, FrontMatterError};
use crate::parser::{ConfigSection, FormatHint};

type DecodeFn =
    Arc<dyn Fn(&ConfigSection, &DecodeRequest) -> Result<DecodeOutcome, BoxError> + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&FrontMatterError) + Send + Sync>;

pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Type(TypeId),
    Any,
}

#[derive(Clone)]
struct DecoderEntry {
    id: String,
    priority: i32,
    target: Target,
    decode: DecodeFn,
}

impl DecoderEntry {
    fn accepts(&self, request: &DecodeRequest) -> bool {
        match self.target {
            Target::Type(type_id) => type_id == request.type_id,
            Target::Any => true,
        }
    }
}

impl fmt::Debug for DecoderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderEntry")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Value (if any) and errors of one decode run.
#[derive(Clone, Debug, Default)]
pub(crate) struct ErasedDecode {
    pub(crate) value: Option<ErasedValue>,
    pub(crate) errors: Vec<FrontMatterError>,
}

/// Immutable set of front matter decoders.
pub struct DecoderRegistry {
    id: u64,
    entries: Vec<DecoderEntry>,
    on_error: ErrorCallback,
}

impl DecoderRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> DecoderRegistryBuilder {
        DecoderRegistryBuilder::default()
    }

    /// Registry without decoders.
    #[must_use]
    pub fn empty() -> Arc<Self> {
        Self::builder().build()
    }

    /// Process-unique identity, used as the decode cache key.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Decoder ids in attempt order.
    #[must_use]
    pub fn decoder_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    /// Decode `section` as `T` without caching or error reporting.
    #[must_use]
    pub fn decode<T: Send + Sync + 'static>(
        &self,
        section: &ConfigSection,
    ) -> (Option<Arc<T>>, Vec<FrontMatterError>) {
        let outcome = self.decode_erased(section, &DecodeRequest::of::<T>());
        let value = outcome.value.and_then(|value| value.downcast::<T>().ok());
        (value, outcome.errors)
    }

    pub(crate) fn decode_erased(
        &self,
        section: &ConfigSection,
        request: &DecodeRequest,
    ) -> ErasedDecode {
        let mut errors = Vec::new();

        for entry in self.entries.iter().filter(|entry| entry.accepts(request)) {
            let outcome = match (entry.decode)(section, request) {
                Ok(outcome) => outcome,
                Err(err) => {
                    let mut failure = DecodeFailure::new(err.to_string()).aborting();
                    failure.cause = Some(Arc::from(err));
                    DecodeOutcome::Failure(failure)
                }
            };

            match outcome {
                DecodeOutcome::Success(value) => {
                    if (*value).type_id() == request.type_id {
                        tracing::trace!(
                            decoder = %entry.id,
                            ty = request.type_name,
                            "Decoded front matter"
                        );
                        return ErasedDecode {
                            value: Some(Arc::from(value)),
                            errors,
                        };
                    }
                    errors.push(FrontMatterError::from_failure(
                        &entry.id,
                        DecodeFailure::new(format!(
                            "decoder produced a value that is not a {}",
                            request.type_name
                        )),
                    ));
                }
                DecodeOutcome::Failure(failure) => {
                    let abort = failure.abort;
                    errors.push(FrontMatterError::from_failure(&entry.id, failure));
                    if abort {
                        tracing::debug!(
                            decoder = %entry.id,
                            ty = request.type_name,
                            "Front matter decode aborted"
                        );
                        return ErasedDecode { value: None, errors };
                    }
                }
                DecodeOutcome::Skip => {}
            }
        }

        ErasedDecode { value: None, errors }
    }

    pub(crate) fn report(&self, error: &FrontMatterError) {
        (self.on_error)(error);
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("id", &self.id)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

/// Builder for [`DecoderRegistry`].
#[derive(Default)]
pub struct DecoderRegistryBuilder {
    entries: Vec<DecoderEntry>,
    on_error: Option<ErrorCallback>,
}

impl DecoderRegistryBuilder {
    /// Add a decoder producing `T`.
    #[must_use]
    pub fn decoder<T, F>(mut self, id: impl Into<String>, priority: i32, decode: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ConfigSection) -> Result<DecodeOutcome, BoxError> + Send + Sync + 'static,
    {
        self.entries.push(DecoderEntry {
            id: id.into(),
            priority,
            target: Target::Type(TypeId::of::<T>()),
            decode: Arc::new(move |section: &ConfigSection, _: &DecodeRequest| decode(section)),
        });
        self
    }

    /// Add a decoder consulted for every requested type.
    #[must_use]
    pub fn universal<F>(mut self, id: impl Into<String>, priority: i32, decode: F) -> Self
    where
        F: Fn(&ConfigSection, &DecodeRequest) -> Result<DecodeOutcome, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.entries.push(DecoderEntry {
            id: id.into(),
            priority,
            target: Target::Any,
            decode: Arc::new(decode),
        });
        self
    }

    /// Add serde decoders for `T`: JSON and TOML for sections with the matching
    /// hint, YAML for sections without a hint.
    #[must_use]
    pub fn serde<T>(self, priority: i32) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.decoder::<T, _>("serde-json", priority, |section| {
            Ok(decode_json::<T>(section))
        })
        .decoder::<T, _>("serde-toml", priority, |section| {
            Ok(decode_toml::<T>(section))
        })
        .decoder::<T, _>("serde-yaml", priority, |section| {
            Ok(decode_yaml::<T>(section))
        })
    }

    /// Replace the error callback. The default logs a warning.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FrontMatterError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Sort decoders (priority descending, then id) and freeze the registry.
    #[must_use]
    pub fn build(mut self) -> Arc<DecoderRegistry> {
        self.entries
            .sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

        Arc::new(DecoderRegistry {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            entries: self.entries,
            on_error: self.on_error.unwrap_or_else(|| Arc::new(log_error)),
        })
    }
}

fn log_error(error: &FrontMatterError) {
    tracing::warn!(
        decoder = %error.decoder_id,
        line = ?error.line,
        column = ?error.column,
        "Front matter decode failed: {}",
        error.message
    );
}

fn decode_json<T>(section: &ConfigSection) -> DecodeOutcome
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    if section.format_hint != Some(FormatHint::Json) {
        return DecodeOutcome::Skip;
    }
    match serde_json::from_str::<T>(&section.raw_text) {
        Ok(value) => DecodeOutcome::success(value),
        Err(err) => {
            let line = section.document_line(err.line());
            DecodeFailure::new(format!("Invalid JSON: {err}"))
                .at(line, err.column())
                .caused_by(err)
                .into()
        }
    }
}

fn decode_toml<T>(section: &ConfigSection) -> DecodeOutcome
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    if section.format_hint != Some(FormatHint::Toml) {
        return DecodeOutcome::Skip;
    }
    match toml::from_str::<T>(&section.raw_text) {
        Ok(value) => DecodeOutcome::success(value),
        Err(err) => {
            let mut failure = DecodeFailure::new(format!("Invalid TOML: {}", err.message()));
            if let Some(span) = err.span() {
                let (line, column) = section.position_of(span.start);
                failure = failure.at(line, column);
            }
            failure.caused_by(err).into()
        }
    }
}

fn decode_yaml<T>(section: &ConfigSection) -> DecodeOutcome
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    if section.format_hint.is_some() {
        return DecodeOutcome::Skip;
    }
    match serde_yaml::from_str::<T>(&section.raw_text) {
        Ok(value) => DecodeOutcome::success(value),
        Err(err) => {
            let mut failure = DecodeFailure::new(format!("Invalid YAML: {err}"));
            if let Some(location) = err.location() {
                failure = failure.at(section.document_line(location.line()), location.column());
            }
            failure.caused_by(err).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Page {
        title: String,
        #[serde(default)]
        count: u32,
    }

    fn toml_section() -> ConfigSection {
        ConfigSection::new("title = \"Hello\"\ncount = 3\n", 2)
    }

    #[test]
    fn test_build_sorts_by_priority_then_id() {
        let registry = DecoderRegistry::builder()
            .decoder::<u8, _>("b", 0, |_| Ok(DecodeOutcome::Skip))
            .decoder::<u8, _>("a", 0, |_| Ok(DecodeOutcome::Skip))
            .decoder::<u8, _>("z", 10, |_| Ok(DecodeOutcome::Skip))
            .build();
        assert_eq!(registry.decoder_ids(), vec!["z", "a", "b"]);
    }

    #[test]
    fn test_registries_have_distinct_ids() {
        let a = DecoderRegistry::empty();
        let b = DecoderRegistry::empty();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_serde_toml_decoder() {
        let registry = DecoderRegistry::builder().serde::<Page>(0).build();
        let (value, errors) = registry.decode::<Page>(&toml_section());

        assert_eq!(
            value.as_deref(),
            Some(&Page {
                title: "Hello".to_owned(),
                count: 3
            })
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_serde_yaml_and_json_decoders() {
        let registry = DecoderRegistry::builder().serde::<Page>(0).build();

        let (yaml, _) = registry.decode::<Page>(&ConfigSection::new("title: Yaml\n", 2));
        assert_eq!(yaml.unwrap().title, "Yaml");

        let (json, _) = registry.decode::<Page>(&ConfigSection::new("{\"title\": \"Json\"}\n", 2));
        assert_eq!(json.unwrap().title, "Json");
    }

    #[test]
    fn test_serde_error_has_document_position() {
        let registry = DecoderRegistry::builder().serde::<Page>(0).build();
        let (value, errors) = registry.decode::<Page>(&ConfigSection::new("title = \"a\"\ncount = x\n", 2));

        assert!(value.is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].decoder_id, "serde-toml");
        assert_eq!(errors[0].line, Some(3));
    }

    #[test]
    fn test_fallback_to_next_decoder() {
        let registry = DecoderRegistry::builder()
            .decoder::<Page, _>("strict", 10, |_| Ok(DecodeFailure::new("unsupported").into()))
            .serde::<Page>(0)
            .build();
        let (value, errors) = registry.decode::<Page>(&toml_section());

        assert_eq!(value.unwrap().title, "Hello");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].decoder_id, "strict");
    }

    #[test]
    fn test_abort_stops_decoding() {
        let later = Arc::new(AtomicUsize::new(0));
        let calls = Arc::clone(&later);
        let registry = DecoderRegistry::builder()
            .decoder::<Page, _>("fatal", 10, |_| {
                Ok(DecodeFailure::new("broken").aborting().into())
            })
            .decoder::<Page, _>("later", 0, move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(DecodeOutcome::success(Page {
                    title: String::new(),
                    count: 0,
                }))
            })
            .build();
        let (value, errors) = registry.decode::<Page>(&toml_section());

        assert!(value.is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_raised_error_becomes_aborting_failure() {
        let registry = DecoderRegistry::builder()
            .decoder::<Page, _>("raises", 10, |_| Err("exploded".into()))
            .serde::<Page>(0)
            .build();
        let (value, errors) = registry.decode::<Page>(&toml_section());

        assert!(value.is_none());
        assert_eq!(errors[0].to_string(), "raises: exploded");
        assert!(errors[0].cause.is_some());
    }

    #[test]
    fn test_wrong_type_is_recorded_and_skipped() {
        let registry = DecoderRegistry::builder()
            .universal("liar", 10, |_, _| Ok(DecodeOutcome::success(42_u32)))
            .serde::<Page>(0)
            .build();
        let (value, errors) = registry.decode::<Page>(&toml_section());

        assert_eq!(value.unwrap().title, "Hello");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].decoder_id, "liar");
    }

    #[test]
    fn test_universal_decoder_sees_request() {
        let registry = DecoderRegistry::builder()
            .universal("raw", 0, |section, request| {
                if request.is::<String>() {
                    Ok(DecodeOutcome::success(section.raw_text.clone()))
                } else {
                    Ok(DecodeOutcome::Skip)
                }
            })
            .build();

        let (raw, _) = registry.decode::<String>(&toml_section());
        assert_eq!(raw.as_deref().map(String::as_str), Some("title = \"Hello\"\ncount = 3\n"));

        let (number, errors) = registry.decode::<u32>(&toml_section());
        assert!(number.is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_skip_records_nothing() {
        let registry = DecoderRegistry::builder().serde::<Page>(0).build();
        let (value, errors) = registry.decode::<u64>(&toml_section());
        assert!(value.is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_custom_error_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let registry = DecoderRegistry::builder()
            .on_error(move |error| sink.lock().unwrap().push(error.decoder_id.clone()))
            .build();

        registry.report(&FrontMatterError::from_failure("x", DecodeFailure::new("m")));
        assert_eq!(*seen.lock().unwrap(), vec!["x".to_owned()]);
    }
}
