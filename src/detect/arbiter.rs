//! Arbitration Engine
//!
//! Races the local detector against the remote pool under a latency budget
//! and delivers exactly one verdict per call.
//!
//! ```text
//! local confirmed ──────────────────────────────► deliver
//!       │ no
//!       ├─ arm fallback timer ─────── expires ──► deliver local baseline
//!       └─ launch remotes ─► adjudicate each ───► deliver on consensus/exhaustion
//!                                  │
//!                         late answers feed the store
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use super::local::{LanguageScorer, LocalDetector, WhatlangScorer};
use super::remote::{PendingCalls, RemoteDetectorPool};
use super::session::{ArbitrationSession, CompletionToken};
use super::store::CorroborationStore;
use crate::config::{Config, CorroborationScope};
use crate::types::{DetectionResult, Result, SessionId};

/// Engine policy knobs
#[derive(Debug, Clone)]
pub struct ArbiterSettings {
    pub confirmed_confidence: f64,
    pub fallback_timeout: Duration,
    pub scope: CorroborationScope,
}

impl Default for ArbiterSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ArbiterSettings {
    fn from(config: &Config) -> Self {
        Self {
            confirmed_confidence: config.detection.confirmed_confidence,
            fallback_timeout: config.detection.fallback_timeout(),
            scope: config.corroboration.scope,
        }
    }
}

/// Language detection arbiter
///
/// Cheap to clone; clones share the store and the circuit breakers.
#[derive(Clone)]
pub struct Arbiter {
    local: LocalDetector,
    pool: RemoteDetectorPool,
    store: Arc<CorroborationStore>,
    settings: ArbiterSettings,
}

impl Arbiter {
    pub fn new(
        local: LocalDetector,
        pool: RemoteDetectorPool,
        store: Arc<CorroborationStore>,
        settings: ArbiterSettings,
    ) -> Self {
        Self {
            local,
            pool,
            store,
            settings,
        }
    }

    /// Build an engine from configuration with the `whatlang` scorer
    pub fn from_config(config: &Config, store: Arc<CorroborationStore>) -> Result<Self> {
        let scorer: Arc<dyn LanguageScorer> = Arc::new(WhatlangScorer::new());
        Self::from_config_with_scorer(config, scorer, store)
    }

    pub fn from_config_with_scorer(
        config: &Config,
        scorer: Arc<dyn LanguageScorer>,
        store: Arc<CorroborationStore>,
    ) -> Result<Self> {
        config.validate()?;
        let local = LocalDetector::new(
            scorer,
            Arc::new(config.preferences()),
            config.detection.low_confidence,
        );
        let pool = RemoteDetectorPool::from_config(&config.remote)?;
        Ok(Self::new(local, pool, store, ArbiterSettings::from(config)))
    }

    /// Same engine without remote detectors
    pub fn local_only(&self) -> Self {
        Self {
            pool: RemoteDetectorPool::empty(),
            ..self.clone()
        }
    }

    pub fn pool(&self) -> &RemoteDetectorPool {
        &self.pool
    }

    pub fn store(&self) -> &Arc<CorroborationStore> {
        &self.store
    }

    pub fn settings(&self) -> &ArbiterSettings {
        &self.settings
    }

    /// Detect the language of `text` and hand the verdict to `on_result`.
    ///
    /// `on_result` runs exactly once, on a spawned task, never before this
    /// function returns.
    pub fn detect_language<F>(&self, text: impl Into<String>, on_result: F) -> JoinHandle<()>
    where
        F: FnOnce(DetectionResult) + Send + 'static,
    {
        let engine = self.clone();
        let text = text.into();
        tokio::spawn(async move {
            let result = engine.detect(&text).await;
            on_result(result);
        })
    }

    /// Detect the language of `text`. Never fails; degrades to the local baseline.
    pub async fn detect(&self, text: &str) -> DetectionResult {
        let id = SessionId::generate();
        let span = info_span!("detect", session = %id);

        async {
            let local = self.local.detect(text, self.settings.confirmed_confidence);
            if local.result.confirmed {
                info!(
                    language = %local.result.language,
                    "Local detection confirmed, skipping remote detection"
                );
                return local.result;
            }

            if text.trim().is_empty() {
                debug!("Blank text, skipping remote detection");
                return local.result;
            }

            // some services are case sensitive ("Section" comes back as French)
            let race = self.pool.launch(&text.to_lowercase());
            if race.kinds.is_empty() {
                debug!("No remote detector admitted, using local result");
                return local.result;
            }

            let baseline = local.result.clone();
            let (token, verdict) = CompletionToken::new();
            let session = ArbitrationSession::new(
                id,
                local,
                race.kinds,
                self.settings.scope,
                token,
            );
            tokio::spawn(drive(
                session,
                race.calls,
                self.settings.fallback_timeout,
                Arc::clone(&self.store),
                self.local.clone(),
            ));

            verdict.await.unwrap_or_else(|_| {
                warn!("Arbitration driver stopped without a verdict, using local result");
                baseline
            })
        }
        .instrument(span)
        .await
    }

}

/// Single dispatcher for one session: the fallback timer and every remote
/// settlement pass through here, one at a time.
#[instrument(name = "arbitrate", skip_all, fields(pending = calls.len()))]
async fn drive(
    mut session: ArbitrationSession,
    mut calls: PendingCalls,
    fallback: Duration,
    store: Arc<CorroborationStore>,
    local: LocalDetector,
) {
    let preferences = local.preferences();
    let deadline = tokio::time::sleep(fallback);
    tokio::pin!(deadline);

    while !session.is_complete() {
        tokio::select! {
            settled = calls.next() => {
                let verdict = {
                    let mut ledger = store.lock();
                    match settled {
                        Some((kind, outcome)) => {
                            session.adjudicate(&mut ledger, preferences, kind, outcome)
                        }
                        None => Some(session.baseline().clone()),
                    }
                };
                if let Some(result) = verdict {
                    session.complete(result, "remote");
                }
            }
            () = &mut deadline => {
                debug!(timeout_ms = fallback.as_millis() as u64, "Remote detection over time");
                let baseline = session.baseline().clone();
                session.complete(baseline, "fallback");
            }
        }
    }

    // in-flight calls finish silently; their answers still corroborate later calls
    while let Some((kind, outcome)) = calls.next().await {
        let mut ledger = store.lock();
        session.absorb_late(&mut ledger, preferences, kind, outcome);
    }
    debug!(session = %session.id(), "Session drained");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::local::tests::FixedScorer;
    use crate::detect::remote::tests::MockDetector;
    use crate::detect::remote::{CircuitBreakerConfig, RemoteDetector};
    use crate::language::Preferences;
    use crate::types::{DetectError, DetectionSourceKind};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FALLBACK_MS: u64 = 2000;

    struct Harness {
        scorer: FixedScorer,
        preferred: Vec<&'static str>,
        detectors: Vec<Arc<dyn RemoteDetector>>,
        scope: CorroborationScope,
        store: Arc<CorroborationStore>,
    }

    impl Harness {
        fn new(scorer: FixedScorer, preferred: &[&'static str]) -> Self {
            Self {
                scorer,
                preferred: preferred.to_vec(),
                detectors: Vec::new(),
                scope: CorroborationScope::Session,
                store: Arc::new(CorroborationStore::new(64, Duration::from_secs(600))),
            }
        }

        fn remote(mut self, detector: Arc<dyn RemoteDetector>) -> Self {
            self.detectors.push(detector);
            self
        }

        fn scope(mut self, scope: CorroborationScope) -> Self {
            self.scope = scope;
            self
        }

        fn store(mut self, store: Arc<CorroborationStore>) -> Self {
            self.store = store;
            self
        }

        fn build(self) -> Arbiter {
            let local = LocalDetector::new(
                Arc::new(self.scorer),
                Arc::new(Preferences::new(self.preferred)),
                0.2,
            );
            let pool = self.detectors.into_iter().fold(
                RemoteDetectorPool::new(Duration::from_secs(10), CircuitBreakerConfig::default()),
                |pool, detector| pool.with_detector(detector),
            );
            Arbiter::new(
                local,
                pool,
                self.store,
                ArbiterSettings {
                    confirmed_confidence: 0.8,
                    fallback_timeout: Duration::from_millis(FALLBACK_MS),
                    scope: self.scope,
                },
            )
        }
    }

    fn answering(kind: DetectionSourceKind, language: &str, delay_ms: u64) -> Arc<MockDetector> {
        Arc::new(MockDetector::answering(kind, language, delay_ms))
    }

    /// Records the text it was asked about
    struct RecordingDetector {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RemoteDetector for RecordingDetector {
        fn kind(&self) -> DetectionSourceKind {
            DetectionSourceKind::Tencent
        }

        async fn detect(&self, text: &str) -> std::result::Result<DetectionResult, DetectError> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(DetectionResult::new(DetectionSourceKind::Tencent, "en", "en"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confident_local_skips_remote() {
        let tencent = answering(DetectionSourceKind::Tencent, "en", 10);
        let engine = Harness::new(FixedScorer::new(&[("en", 0.95)]), &["en", "zh-CHS"])
            .remote(tencent.clone())
            .build();

        let result = engine.detect("a confident english sentence").await;
        assert!(result.confirmed);
        assert_eq!(result.language, "en");
        assert_eq!(result.source, DetectionSourceKind::Statistical);
        assert_eq!(tencent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_agreeing_remotes_confirm_first_source() {
        let engine = Harness::new(FixedScorer::silent(), &["en", "fr"])
            .remote(answering(DetectionSourceKind::Tencent, "fr", 300))
            .remote(answering(DetectionSourceKind::Baidu, "fr", 100))
            .build();

        let result = engine.detect("bonjour le monde").await;
        assert!(result.confirmed);
        assert_eq!(result.language, "fr");
        assert_eq!(result.source, DetectionSourceKind::Baidu);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_remotes_useless_gives_auto() {
        let engine = Harness::new(FixedScorer::silent(), &["ja"])
            .remote(Arc::new(MockDetector::failing(DetectionSourceKind::Tencent, 50)))
            .remote(answering(DetectionSourceKind::Baidu, "de", 80))
            .build();

        let result = engine.detect("hello world").await;
        assert!(result.is_auto());
        assert!(!result.confirmed);
        assert!(engine.store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_timer_delivers_baseline_once() {
        let engine = Harness::new(FixedScorer::silent(), &["en", "zh-CHS"])
            .remote(answering(DetectionSourceKind::Tencent, "en", 5000))
            .remote(answering(DetectionSourceKind::Baidu, "en", 6000))
            .scope(CorroborationScope::Global)
            .build();

        let deliveries = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = tokio::sync::oneshot::channel();
        let counter = Arc::clone(&deliveries);
        let handle = engine.detect_language("hello world", move |result| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(result);
        });

        let started = tokio::time::Instant::now();
        let result = rx.await.unwrap();
        handle.await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(FALLBACK_MS));
        assert!(started.elapsed() < Duration::from_millis(5000));
        assert_eq!(result.source, DetectionSourceKind::Simple);
        assert_eq!(result.language, "en");
        assert!(!result.confirmed);

        // let the late answers land
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(deliveries.load(Ordering::SeqCst), 1);
        assert_eq!(engine.store().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hello_world_without_network() {
        let engine = Harness::new(FixedScorer::silent(), &["en", "zh-CHS"]).build();
        let result = engine.detect("hello world").await;
        assert_eq!(result.language, "en");
        assert!(!result.confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chinese_without_network() {
        let engine = Harness::new(FixedScorer::silent(), &["en", "zh-CHS"]).build();
        let result = engine.detect("你好").await;
        assert_eq!(result.language, "zh-CHS");
        assert!(!result.confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_scope_is_idempotent() {
        let engine = Harness::new(FixedScorer::silent(), &["en", "fr"])
            .remote(answering(DetectionSourceKind::Tencent, "fr", 100))
            .remote(answering(DetectionSourceKind::Baidu, "en", 200))
            .build();

        let first = engine.detect("texte ambigu").await;
        let second = engine.detect("texte ambigu").await;
        assert_eq!(first, second);
        assert_eq!(first.source, DetectionSourceKind::Baidu);
        assert!(!first.confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_scope_corroborates_across_calls() {
        let engine = Harness::new(FixedScorer::silent(), &["en", "fr"])
            .remote(answering(DetectionSourceKind::Tencent, "fr", 100))
            .remote(answering(DetectionSourceKind::Baidu, "en", 200))
            .scope(CorroborationScope::Global)
            .build();

        let first = engine.detect("texte ambigu").await;
        assert!(!first.confirmed);

        // Tencent's second "fr" matches the answer it gave on the first call
        let second = engine.detect("texte ambigu").await;
        assert!(second.confirmed);
        assert_eq!(second.language, "fr");
        assert_eq!(second.source, DetectionSourceKind::Tencent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_store_corroborates() {
        let store = Arc::new(CorroborationStore::new(8, Duration::from_secs(600)));
        store.lock().record(
            DetectionResult::new(DetectionSourceKind::Baidu, "jp", "ja"),
            &SessionId::from("earlier".to_string()),
        );

        let engine = Harness::new(FixedScorer::silent(), &["ja", "en"])
            .remote(answering(DetectionSourceKind::Tencent, "ja", 100))
            .scope(CorroborationScope::Global)
            .store(Arc::clone(&store))
            .build();

        let result = engine.detect("こんにちは").await;
        assert!(result.confirmed);
        assert_eq!(result.source, DetectionSourceKind::Baidu);
        assert_eq!(result.raw_language, "jp");
        assert!(store.snapshot()[0].confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_uses_local_ranking() {
        let engine = Harness::new(
            FixedScorer::new(&[("fr", 0.5), ("en", 0.3)]),
            &["en", "fr"],
        )
        .remote(answering(DetectionSourceKind::Tencent, "en", 100))
        .remote(answering(DetectionSourceKind::Apple, "fr", 150))
        .remote(Arc::new(MockDetector::failing(DetectionSourceKind::Baidu, 200)))
        .build();

        let result = engine.detect("quelque chose").await;
        assert!(result.confirmed);
        assert_eq!(result.language, "fr");
        assert_eq!(result.source, DetectionSourceKind::Apple);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_without_match_uses_latest_candidate() {
        let engine = Harness::new(FixedScorer::silent(), &["en", "fr"])
            .remote(answering(DetectionSourceKind::Tencent, "en", 100))
            .remote(answering(DetectionSourceKind::Baidu, "fr", 200))
            .build();

        let result = engine.detect("xyz").await;
        assert!(!result.confirmed);
        assert_eq!(result.source, DetectionSourceKind::Baidu);
        assert_eq!(result.language, "fr");
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_never_synchronous() {
        let engine = Harness::new(FixedScorer::new(&[("en", 0.99)]), &["en"]).build();
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);

        let handle = engine.detect_language("confident text", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(delivered.load(Ordering::SeqCst), 0);

        handle.await.unwrap();
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_text_skips_remote() {
        let tencent = answering(DetectionSourceKind::Tencent, "en", 10);
        let engine = Harness::new(FixedScorer::silent(), &["en"])
            .remote(tencent.clone())
            .build();

        let result = engine.detect("   ").await;
        assert!(result.is_auto());
        assert_eq!(tencent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_text_is_lowercased() {
        let recorder = Arc::new(RecordingDetector {
            seen: Mutex::new(Vec::new()),
        });
        let engine = Harness::new(FixedScorer::silent(), &["en"])
            .remote(recorder.clone())
            .build();

        engine.detect("Section Header").await;
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["section header"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_only_ignores_pool() {
        let tencent = answering(DetectionSourceKind::Tencent, "fr", 10);
        let engine = Harness::new(FixedScorer::silent(), &["en", "fr"])
            .remote(tencent.clone())
            .build()
            .local_only();

        let result = engine.detect("hello world").await;
        assert_eq!(result.language, "en");
        assert_eq!(tencent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_default_engine_short_text_uses_heuristic() {
        let engine = Arbiter::from_config(&Config::default(), Arc::new(CorroborationStore::default()))
            .unwrap();

        let result = engine.detect("hello world").await;
        assert_eq!(result.language, "en");
        assert_eq!(result.source, DetectionSourceKind::Simple);
        assert!(!result.confirmed);

        let result = engine.detect("你好").await;
        assert_eq!(result.language, "zh-CHS");
        assert_eq!(result.source, DetectionSourceKind::Simple);
        assert!(!result.confirmed);
    }
}
