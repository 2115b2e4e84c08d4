//! Retrying extractor - bounded navigate/read loop for flaky pages.
//!
//! Each attempt moves through `Navigating -> Reading`, then either
//! `Succeeded`, back to `Navigating`, or `Exhausted`:
//!
//! - Navigating: load `target.url`, wait for the page to render, and apply
//!   form selections. A navigation error ends the attempt.
//! - Reading: read the target element and parse it for the target's field
//!   kind.
//! - Blank, absent or unparseable text ends the attempt. The next attempt
//!   always re-navigates: these pages need a fresh load to re-render.
//! - A timestamp that does not match the expected layout is fatal and is
//!   not retried.
//!
//! Terminal failures capture the page markup through the diagnostic dumper
//! before returning. A dump failure is logged and never replaces the
//! extraction failure being reported.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{ConfigResult, NavigationError, TimestampParseError};
use crate::pipeline::diagnostics::DiagnosticDumper;
use crate::pipeline::reader::{ElementReader, SelectionOutcome};
use crate::pipeline::timestamp::TimestampNormalizer;
use crate::pipeline::waiter::PageWaiter;
use crate::traits::browser::BrowserSession;
use crate::types::config::ExtractorConfig;
use crate::types::outcome::{
    ExtractionFailure, ExtractionOutcome, ExtractionResult, FailureCause, ParsedValue,
};
use crate::types::target::{ExtractionTarget, FieldKind};

/// Result of interpreting one read.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRead {
    Parsed(ParsedValue),
    /// Blank or not yet in the expected shape; worth another load
    NotReady,
    /// Present but malformed in a way reloading will not fix
    Fatal(TimestampParseError),
}

/// Count from event-count text: first whitespace token as an integer.
///
/// `"2 Events"` -> 2. Thousands separators are accepted (`"1,204 Events"`).
pub fn parse_event_count(text: &str) -> Option<u64> {
    let token = text.split_whitespace().next()?;
    token.replace(',', "").parse().ok()
}

pub struct RetryingExtractor {
    config: ExtractorConfig,
    waiter: PageWaiter,
    normalizer: TimestampNormalizer,
    dumper: DiagnosticDumper,
}

impl RetryingExtractor {
    pub fn new(config: ExtractorConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            waiter: PageWaiter::new(config.wait),
            normalizer: TimestampNormalizer::new(config.source_tz, config.canonical_tz),
            dumper: DiagnosticDumper::new(config.diagnostic_dir.clone()),
            config,
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Interpret raw element text for `kind`.
    pub fn parse_field(&self, kind: FieldKind, raw: &str) -> FieldRead {
        if raw.trim().is_empty() {
            return FieldRead::NotReady;
        }

        match kind {
            FieldKind::EventCount => match parse_event_count(raw) {
                Some(n) => FieldRead::Parsed(ParsedValue::Count(n)),
                None => FieldRead::NotReady,
            },
            FieldKind::LastUpdatedTimestamp => match self.normalizer.normalize(raw) {
                Ok(ts) => FieldRead::Parsed(ParsedValue::Timestamp(ts)),
                Err(e) => FieldRead::Fatal(e),
            },
            FieldKind::GenericText => FieldRead::Parsed(ParsedValue::Text(raw.trim().to_string())),
        }
    }

    /// Extract `target` without external cancellation.
    pub async fn extract<S>(&self, session: &S, target: &ExtractionTarget) -> ExtractionOutcome
    where
        S: BrowserSession + ?Sized,
    {
        self.extract_with_cancel(session, target, &CancellationToken::new())
            .await
    }

    /// Extract `target`, checking `cancel` at the top of every attempt and
    /// during waits.
    pub async fn extract_with_cancel<S>(
        &self,
        session: &S,
        target: &ExtractionTarget,
        cancel: &CancellationToken,
    ) -> ExtractionOutcome
    where
        S: BrowserSession + ?Sized,
    {
        let run_id = Uuid::now_v7();
        let span = info_span!(
            "extract",
            %run_id,
            url = %target.url,
            selector = %target.selector,
            field = %target.field_kind,
        );

        self.run(run_id, session, target, cancel).instrument(span).await
    }

    async fn run<S>(
        &self,
        run_id: Uuid,
        session: &S,
        target: &ExtractionTarget,
        cancel: &CancellationToken,
    ) -> ExtractionOutcome
    where
        S: BrowserSession + ?Sized,
    {
        let max_attempts = self.config.max_attempts;
        let mut run = RunState::new(run_id, target);

        loop {
            if cancel.is_cancelled() {
                return Err(run.cancelled());
            }
            run.attempts += 1;
            debug!(attempt = run.attempts, max_attempts, "Navigating");

            // Navigating
            let navigated = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(run.cancelled()),
                r = self.load(session, target) => r,
            };

            match navigated {
                Err(e) => {
                    warn!(attempt = run.attempts, error = %e, "Navigation failed");
                    run.last_error = Some(e.to_string());
                }
                Ok(_) => {
                    // Reading
                    match ElementReader::new(session).read_text(&target.selector).await {
                        Ok(Some(raw)) => {
                            let read = self.parse_field(target.field_kind, &raw);
                            run.last_raw_text = raw;

                            match read {
                                FieldRead::Parsed(value) => {
                                    if let Some(result) = ExtractionResult::new(
                                        run_id,
                                        run.last_raw_text.clone(),
                                        value,
                                        run.attempts,
                                    ) {
                                        info!(attempts = run.attempts, value = %result.value(), "Extraction succeeded");
                                        return Ok(result);
                                    }
                                }
                                FieldRead::NotReady => {
                                    debug!(attempt = run.attempts, raw = %run.last_raw_text, "Text not ready");
                                }
                                FieldRead::Fatal(e) => {
                                    let cause = FailureCause::TimestampParse { error: e };
                                    return Err(self.fail(session, run, cause).await);
                                }
                            }
                        }
                        Ok(None) => {
                            debug!(attempt = run.attempts, "Target element not rendered");
                        }
                        Err(e) => {
                            warn!(attempt = run.attempts, error = %e, "Reading target element failed");
                            run.last_error = Some(e.to_string());
                        }
                    }
                }
            }

            if run.attempts >= max_attempts {
                let cause = FailureCause::Exhausted {
                    last_error: run.last_error.clone(),
                };
                return Err(self.fail(session, run, cause).await);
            }

            let delay = self.config.backoff.delay_after(run.attempts);
            if !delay.is_zero() {
                debug!(delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(run.cancelled()),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    /// Navigate, wait for the page, then apply form selections.
    ///
    /// One future so a cancellation lands anywhere in the load.
    async fn load<S>(&self, session: &S, target: &ExtractionTarget) -> Result<bool, NavigationError>
    where
        S: BrowserSession + ?Sized,
    {
        let seen = self
            .waiter
            .await_element(session, &target.url, &target.selector)
            .await?;
        self.apply_selections(session, target).await;
        Ok(seen)
    }

    /// Choose each configured `<select>` option. Failures are logged only.
    async fn apply_selections<S>(&self, session: &S, target: &ExtractionTarget)
    where
        S: BrowserSession + ?Sized,
    {
        let reader = ElementReader::new(session);

        for selection in &target.selections {
            match reader.select(selection).await {
                Ok(outcome) if outcome.confirms(&selection.option) => {
                    debug!(selector = %selection.locator, option = %selection.option, "Selection applied");
                }
                Ok(SelectionOutcome::Missing) => {
                    debug!(selector = %selection.locator, "Select element not found");
                }
                Ok(SelectionOutcome::Applied { value }) => {
                    warn!(
                        selector = %selection.locator,
                        expected = %selection.option,
                        actual = ?value,
                        "Selection not reflected in element value"
                    );
                }
                Err(e) => {
                    warn!(
                        selector = %selection.locator,
                        option = %selection.option,
                        error = %e,
                        "Unable to set element"
                    );
                }
            }
        }
    }

    async fn fail<S>(&self, session: &S, run: RunState<'_>, cause: FailureCause) -> ExtractionFailure
    where
        S: BrowserSession + ?Sized,
    {
        let diagnostic_path = self.capture(session).await;
        let failure = run.into_failure(cause, diagnostic_path);

        error!(
            attempts = failure.attempts,
            cause = %failure.cause,
            diagnostic_path = ?failure.diagnostic_path,
            "Extraction failed"
        );
        failure
    }

    /// Best-effort markup capture.
    async fn capture<S>(&self, session: &S) -> Option<PathBuf>
    where
        S: BrowserSession + ?Sized,
    {
        let markup = match session.full_markup().await {
            Ok(markup) => markup,
            Err(e) => {
                warn!(error = %e, "Could not read page source for diagnostics");
                return None;
            }
        };

        match self.dumper.dump(&markup).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Failed to save page source");
                None
            }
        }
    }
}

/// Mutable bookkeeping for one run; consumed into the terminal failure.
struct RunState<'t> {
    run_id: Uuid,
    target: &'t ExtractionTarget,
    attempts: u32,
    last_raw_text: String,
    last_error: Option<String>,
}

impl<'t> RunState<'t> {
    fn new(run_id: Uuid, target: &'t ExtractionTarget) -> Self {
        Self {
            run_id,
            target,
            attempts: 0,
            last_raw_text: String::new(),
            last_error: None,
        }
    }

    fn cancelled(self) -> ExtractionFailure {
        info!(attempts = self.attempts, "Extraction cancelled");
        self.into_failure(FailureCause::Cancelled, None)
    }

    fn into_failure(self, cause: FailureCause, diagnostic_path: Option<PathBuf>) -> ExtractionFailure {
        ExtractionFailure {
            run_id: self.run_id,
            target: self.target.clone(),
            attempts: self.attempts,
            last_raw_text: self.last_raw_text,
            diagnostic_path,
            cause,
        }
    }
}
