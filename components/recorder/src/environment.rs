//! The recording environment: state shared by all sessions of one build.

use crate::config::RecorderConfig;
use crate::error::RecordingResult;
use crate::metadata::MetadataLiteralProvider;
use crate::proxy::{KeyGenerator, ProxyTypeCache};
use crate::session::RecordingSession;
use core_types::{ClassRegistry, MetadataContract, MetadataInstance, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Owns the caches shared between sessions and opens new sessions.
///
/// Sessions of one environment may record in parallel. They share the
/// class registry, the proxy-plan cache, the literal-type cache and the
/// placeholder key sequence, since all their programs publish into the
/// same startup context.
///
/// # Examples
///
/// ```
/// use core_types::{ClassRegistry, TypeRef, Value};
/// use recorder::{RecorderConfig, RecorderContract, RecordingEnvironment};
///
/// let env = RecordingEnvironment::new(ClassRegistry::with_builtins(), RecorderConfig::default())?;
/// let contract = RecorderContract::new("GreetingRecorder")
///     .method("greet", [TypeRef::named("String")])
///     .build();
///
/// let mut session = env.session(false, "GreetingProcessor", "greet");
/// session.recording_proxy(&contract).call("greet", vec![Value::from("hello")])?;
/// let program = session.finish()?;
/// assert_eq!(program.invocation_count(), 1);
/// # Ok::<(), recorder::RecordingError>(())
/// ```
#[derive(Debug)]
pub struct RecordingEnvironment {
    config: RecorderConfig,
    classes: Arc<ClassRegistry>,
    literals: MetadataLiteralProvider,
    proxy_types: Arc<ProxyTypeCache>,
    keys: Arc<KeyGenerator>,
    outputs: AtomicUsize,
}

impl RecordingEnvironment {
    /// Create an environment over `classes`
    pub fn new(classes: ClassRegistry, config: RecorderConfig) -> RecordingResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classes: Arc::new(classes),
            literals: MetadataLiteralProvider::new(),
            proxy_types: Arc::new(ProxyTypeCache::new()),
            keys: Arc::new(KeyGenerator::default()),
            outputs: AtomicUsize::new(0),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Class registry shared by all sessions
    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    /// Literal-type provider
    pub fn literal_provider(&self) -> &MetadataLiteralProvider {
        &self.literals
    }

    /// Proxy-plan cache
    pub fn proxy_cache(&self) -> &ProxyTypeCache {
        &self.proxy_types
    }

    /// Open a session recording the program of one build step.
    ///
    /// The program is named `<prefix><build step>$<method><n>`, `n` being
    /// unique within this environment.
    pub fn session(&self, static_init: bool, build_step: &str, method: &str) -> RecordingSession {
        let count = self.outputs.fetch_add(1, Ordering::Relaxed) + 1;
        let name = format!(
            "{}{}${}{}",
            self.config.program_prefix, build_step, method, count
        );
        RecordingSession::new(
            name,
            static_init,
            self.config.clone(),
            self.classes.clone(),
            self.proxy_types.clone(),
            self.keys.clone(),
        )
    }

    /// Wrap a metadata instance so it can be passed to a recorder
    pub fn metadata_proxy(
        &self,
        instance: MetadataInstance,
        contract: &Arc<MetadataContract>,
        defaults: Vec<(String, Value)>,
    ) -> RecordingResult<Value> {
        self.literals.proxy(instance, contract, defaults)
    }

    /// Clear the shared caches
    pub fn close(&self) {
        debug!(
            proxy_plans = self.proxy_types.len(),
            literal_types = self.literals.generated_types().len(),
            "closing recording environment"
        );
        self.proxy_types.clear();
        self.literals.clear();
    }
}

impl Drop for RecordingEnvironment {
    fn drop(&mut self) {
        self.close();
    }
}
