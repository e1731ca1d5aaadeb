//! Filter screen state machine.
//!
//! ```text
//! Empty -> HasSource -> (Selecting <-> Applying) -> HasResult -> {Empty | HasSource}
//! ```
//!
//! Each call to [`Workflow::begin_apply`] gets a new attempt id. A response is
//! only applied when its id still matches the attempt the workflow is waiting
//! for, so a late reply that was overtaken by a new selection, a new upload or
//! a newer apply is dropped instead of overwriting the preview.

use super::image::{ImageHandle, pretty_bytes_size};
use bytes::Bytes;
use filter_client::{FilterRequest, FilterSelection, FilterService, Percentage, ServiceConfig};
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// A failed apply keeps the last successful result on screen.
    #[default]
    KeepPrevious,
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Empty,
    HasSource,
    Selecting,
    Applying,
    HasResult,
}

/// Byte sizes before and after a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeInfo {
    pub original: u64,
    pub processed: u64,
}

impl SizeInfo {
    pub fn label(&self) -> String {
        format!(
            "{} -> {}",
            pretty_bytes_size(self.original),
            pretty_bytes_size(self.processed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutput {
    pub image: ImageHandle,
    pub selection: FilterSelection,
    pub size_info: Option<SizeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyTicket {
    pub attempt: u64,
    pub request: FilterRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Failed(String),
    /// The response belonged to an attempt that is no longer current.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("No image selected")]
    MissingSource,

    #[error("No filter selected")]
    MissingSelection,

    #[error("The selected filter takes no parameter")]
    NoParameter,
}

#[derive(Debug, Clone, Default)]
enum State {
    #[default]
    Empty,
    HasSource {
        source: ImageHandle,
    },
    Selecting {
        source: ImageHandle,
        selection: FilterSelection,
        retained: Option<FilterOutput>,
        error: Option<String>,
    },
    Applying {
        source: ImageHandle,
        selection: FilterSelection,
        attempt: u64,
        retained: Option<FilterOutput>,
    },
    HasResult {
        source: ImageHandle,
        selection: FilterSelection,
        output: FilterOutput,
    },
}

#[derive(Debug, Clone)]
pub struct Workflow {
    state: State,
    last_attempt: u64,
    service: ServiceConfig,
    policy: FailurePolicy,
}

impl Workflow {
    pub fn new(service: ServiceConfig, policy: FailurePolicy) -> Workflow {
        Workflow {
            state: State::Empty,
            last_attempt: 0,
            service,
            policy,
        }
    }

    pub fn stage(&self) -> Stage {
        match self.state {
            State::Empty => Stage::Empty,
            State::HasSource { .. } => Stage::HasSource,
            State::Selecting { .. } => Stage::Selecting,
            State::Applying { .. } => Stage::Applying,
            State::HasResult { .. } => Stage::HasResult,
        }
    }

    pub fn source(&self) -> Option<&ImageHandle> {
        match &self.state {
            State::Empty => None,
            State::HasSource { source }
            | State::Selecting { source, .. }
            | State::Applying { source, .. }
            | State::HasResult { source, .. } => Some(source),
        }
    }

    pub fn selection(&self) -> Option<FilterSelection> {
        match &self.state {
            State::Selecting { selection, .. }
            | State::Applying { selection, .. }
            | State::HasResult { selection, .. } => Some(*selection),
            _ => None,
        }
    }

    /// Latest successful result, including one kept after a failed retry.
    pub fn result(&self) -> Option<&FilterOutput> {
        match &self.state {
            State::HasResult { output, .. } => Some(output),
            State::Selecting { retained, .. } | State::Applying { retained, .. } => {
                retained.as_ref()
            }
            _ => None,
        }
    }

    /// What the screen shows: the result when there is one, otherwise the source.
    pub fn preview(&self) -> Option<&ImageHandle> {
        self.result()
            .map(|output| &output.image)
            .or_else(|| self.source())
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            State::Selecting { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    pub fn is_applying(&self) -> bool {
        matches!(self.state, State::Applying { .. })
    }

    pub fn pending_attempt(&self) -> Option<u64> {
        match self.state {
            State::Applying { attempt, .. } => Some(attempt),
            _ => None,
        }
    }

    pub fn set_source(&mut self, source: ImageHandle) {
        log::debug!("source set to {source:?}");
        self.state = State::HasSource { source };
    }

    pub fn reset(&mut self) {
        self.state = State::Empty;
    }

    /// Changing the selection hides any result computed for the old one.
    pub fn select_filter(&mut self, selection: FilterSelection) -> Result<(), WorkflowError> {
        let source = self.source().cloned().ok_or(WorkflowError::MissingSource)?;

        log::info!("selected filter: {selection}");
        self.state = State::Selecting {
            source,
            selection,
            retained: None,
            error: None,
        };
        Ok(())
    }

    pub fn set_percentage(&mut self, value: i64) -> Result<Percentage, WorkflowError> {
        let selection = self.selection().ok_or(WorkflowError::MissingSelection)?;
        if selection.percentage().is_none() {
            return Err(WorkflowError::NoParameter);
        }

        let percentage = Percentage::new(value);
        if percentage.get() as i64 != value {
            log::info!("percentage {value} clamped to {percentage}");
        }

        self.select_filter(selection.with_percentage(percentage))?;
        Ok(percentage)
    }

    /// Moves to `Applying` and returns the request to send. Calling this again
    /// before the first request settles supersedes it.
    pub fn begin_apply(&mut self) -> Result<ApplyTicket, WorkflowError> {
        let state = mem::take(&mut self.state);

        let (source, selection, retained) = match state {
            State::Selecting {
                source,
                selection,
                retained,
                ..
            }
            | State::Applying {
                source,
                selection,
                retained,
                ..
            } => (source, selection, retained),
            State::HasResult {
                source,
                selection,
                output,
            } => (source, selection, Some(output)),
            other => {
                let err = if matches!(other, State::Empty) {
                    WorkflowError::MissingSource
                } else {
                    WorkflowError::MissingSelection
                };
                self.state = other;
                return Err(err);
            }
        };

        self.last_attempt += 1;
        let attempt = self.last_attempt;

        let request = FilterRequest::new(
            &self.service,
            &selection,
            source.bytes.clone(),
            &source.content_type,
        );

        log::info!("apply #{attempt}: {selection} on {}", source.name);
        self.state = State::Applying {
            source,
            selection,
            attempt,
            retained,
        };

        Ok(ApplyTicket { attempt, request })
    }

    pub fn finish_apply(
        &mut self,
        attempt: u64,
        result: filter_client::Result<Bytes>,
    ) -> ApplyOutcome {
        let (source, selection, retained) = match mem::take(&mut self.state) {
            State::Applying {
                source,
                selection,
                attempt: pending,
                retained,
            } if pending == attempt => (source, selection, retained),
            other => {
                log::debug!("dropped stale response of apply #{attempt}");
                self.state = other;
                return ApplyOutcome::Stale;
            }
        };

        match result {
            Ok(body) => {
                let size_info = selection.percentage().map(|_| SizeInfo {
                    original: source.len(),
                    processed: body.len() as u64,
                });

                let name = format!("{}-{}", selection.kind().endpoint(), source.name);
                let image = ImageHandle::new(name, body);
                log::info!("apply #{attempt} done: {} ({})", image.name, image.size_label());

                self.state = State::HasResult {
                    source,
                    selection,
                    output: FilterOutput {
                        image,
                        selection,
                        size_info,
                    },
                };
                ApplyOutcome::Applied
            }
            Err(e) => {
                let message = format!("Failed to apply filter. {e}");
                log::warn!("apply #{attempt}: {message}");

                let retained = match self.policy {
                    FailurePolicy::KeepPrevious => retained,
                    FailurePolicy::Discard => None,
                };

                self.state = State::Selecting {
                    source,
                    selection,
                    retained,
                    error: Some(message.clone()),
                };
                ApplyOutcome::Failed(message)
            }
        }
    }

    pub async fn apply_filter(
        &mut self,
        service: &dyn FilterService,
    ) -> Result<ApplyOutcome, WorkflowError> {
        let ApplyTicket { attempt, request } = self.begin_apply()?;
        let result = service.apply(request).await;
        Ok(self.finish_apply(attempt, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filter_client::{Error, FilterKind};

    fn source() -> ImageHandle {
        ImageHandle::new("cat.jpg", vec![0xff, 0xd8, 0xff, 0xe0, 0, 0, 0, 0])
    }

    fn workflow(policy: FailurePolicy) -> Workflow {
        let mut workflow = Workflow::new(ServiceConfig::default(), policy);
        workflow.set_source(source());
        workflow
    }

    fn server_error() -> filter_client::Error {
        Error::Status {
            url: "http://127.0.0.1:5000/grayscale".to_string(),
            status: 500,
        }
    }

    fn apply_ok(workflow: &mut Workflow, body: &'static [u8]) {
        let ticket = workflow.begin_apply().unwrap();
        assert_eq!(
            workflow.finish_apply(ticket.attempt, Ok(Bytes::from_static(body))),
            ApplyOutcome::Applied
        );
    }

    #[test]
    fn test_initial_state() {
        let workflow = Workflow::new(ServiceConfig::default(), FailurePolicy::default());
        assert_eq!(workflow.stage(), Stage::Empty);
        assert!(workflow.preview().is_none());
        assert!(workflow.result().is_none());
        assert!(workflow.error().is_none());
    }

    #[test]
    fn test_select_requires_source() {
        let mut workflow = Workflow::new(ServiceConfig::default(), FailurePolicy::default());
        assert_eq!(
            workflow.select_filter(FilterSelection::Grayscale),
            Err(WorkflowError::MissingSource)
        );
        assert_eq!(workflow.stage(), Stage::Empty);
    }

    #[test]
    fn test_apply_without_source_is_noop() {
        let mut workflow = Workflow::new(ServiceConfig::default(), FailurePolicy::default());
        assert_eq!(workflow.begin_apply(), Err(WorkflowError::MissingSource));
        assert_eq!(workflow.stage(), Stage::Empty);
    }

    #[test]
    fn test_apply_without_selection_is_noop() {
        let mut workflow = workflow(FailurePolicy::default());
        assert_eq!(workflow.begin_apply(), Err(WorkflowError::MissingSelection));
        assert_eq!(workflow.stage(), Stage::HasSource);
        assert_eq!(workflow.source(), Some(&source()));
    }

    #[test]
    fn test_apply_success() {
        let mut workflow = workflow(FailurePolicy::default());
        workflow.select_filter(FilterSelection::Grayscale).unwrap();
        assert_eq!(workflow.stage(), Stage::Selecting);

        let ticket = workflow.begin_apply().unwrap();
        assert_eq!(workflow.stage(), Stage::Applying);
        assert!(workflow.is_applying());
        assert_eq!(ticket.request.url, "http://127.0.0.1:5000/grayscale");
        assert_eq!(ticket.request.image, source().bytes);
        assert_eq!(ticket.request.content_type, "image/jpeg");
        assert_eq!(workflow.preview(), Some(&source()));

        let outcome = workflow.finish_apply(ticket.attempt, Ok(Bytes::from_static(b"gray")));
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(workflow.stage(), Stage::HasResult);
        assert!(!workflow.is_applying());

        let output = workflow.result().unwrap();
        assert_eq!(output.image.bytes.as_ref(), b"gray");
        assert_eq!(output.image.name, "grayscale-cat.jpg");
        assert_eq!(output.size_info, None);
        assert_eq!(workflow.preview(), Some(&output.image));
    }

    #[test]
    fn test_success_clears_error() {
        let mut workflow = workflow(FailurePolicy::default());
        workflow.select_filter(FilterSelection::BlurEdges).unwrap();

        let ticket = workflow.begin_apply().unwrap();
        workflow.finish_apply(ticket.attempt, Err(server_error()));
        assert!(workflow.error().is_some());

        apply_ok(&mut workflow, b"blurred");
        assert!(workflow.error().is_none());
        assert_eq!(workflow.preview().unwrap().bytes.as_ref(), b"blurred");
    }

    #[test]
    fn test_selecting_other_filter_clears_result() {
        for kind in [FilterKind::Grayscale, FilterKind::BlurEdges, FilterKind::Resize] {
            let mut workflow = workflow(FailurePolicy::default());
            let selection = FilterSelection::from_kind(kind, Percentage::default());
            workflow.select_filter(selection).unwrap();
            apply_ok(&mut workflow, b"out");
            assert!(workflow.result().is_some());

            let other = if kind == FilterKind::Grayscale {
                FilterSelection::BlurEdges
            } else {
                FilterSelection::Grayscale
            };
            workflow.select_filter(other).unwrap();
            assert!(workflow.result().is_none());
            assert_eq!(workflow.preview(), Some(&source()));
            assert_eq!(workflow.selection(), Some(other));
        }
    }

    #[test]
    fn test_failure_keeps_previous_result() {
        let mut workflow = workflow(FailurePolicy::KeepPrevious);
        workflow.select_filter(FilterSelection::Grayscale).unwrap();
        apply_ok(&mut workflow, b"first");

        let ticket = workflow.begin_apply().unwrap();
        let outcome = workflow.finish_apply(ticket.attempt, Err(server_error()));
        assert!(matches!(outcome, ApplyOutcome::Failed(ref m) if !m.is_empty()));

        assert_eq!(workflow.stage(), Stage::Selecting);
        assert!(workflow.error().unwrap().contains("500"));
        assert_eq!(workflow.result().unwrap().image.bytes.as_ref(), b"first");
        assert_eq!(workflow.preview().unwrap().bytes.as_ref(), b"first");
    }

    #[test]
    fn test_failure_discards_previous_result() {
        let mut workflow = workflow(FailurePolicy::Discard);
        workflow.select_filter(FilterSelection::Grayscale).unwrap();
        apply_ok(&mut workflow, b"first");

        let ticket = workflow.begin_apply().unwrap();
        workflow.finish_apply(ticket.attempt, Err(server_error()));
        assert!(workflow.error().is_some());
        assert!(workflow.result().is_none());
        assert_eq!(workflow.preview(), Some(&source()));
    }

    #[test]
    fn test_retry_after_failure() {
        let mut workflow = workflow(FailurePolicy::default());
        workflow.select_filter(FilterSelection::Grayscale).unwrap();

        let ticket = workflow.begin_apply().unwrap();
        workflow.finish_apply(ticket.attempt, Err(server_error()));
        assert_eq!(workflow.stage(), Stage::Selecting);
        assert_eq!(workflow.selection(), Some(FilterSelection::Grayscale));

        apply_ok(&mut workflow, b"ok");
        assert_eq!(workflow.stage(), Stage::HasResult);
    }

    #[test]
    fn test_resize_records_sizes() {
        let mut workflow = workflow(FailurePolicy::default());
        workflow
            .select_filter(FilterSelection::Resize(Percentage::default()))
            .unwrap();
        assert_eq!(workflow.set_percentage(25), Ok(Percentage::new(25)));

        let ticket = workflow.begin_apply().unwrap();
        assert_eq!(ticket.request.url, "http://127.0.0.1:5000/resize");
        assert_eq!(ticket.request.field("percentage"), Some("25"));

        workflow.finish_apply(ticket.attempt, Ok(Bytes::from_static(b"abc")));
        let info = workflow.result().unwrap().size_info.unwrap();
        assert_eq!(info, SizeInfo { original: 8, processed: 3 });
        assert_eq!(info.label(), "8 B -> 3 B");
    }

    #[test]
    fn test_set_percentage_is_clamped() {
        let mut workflow = workflow(FailurePolicy::default());
        workflow
            .select_filter(FilterSelection::Resize(Percentage::default()))
            .unwrap();

        assert_eq!(workflow.set_percentage(0), Ok(Percentage::new(1)));
        assert_eq!(workflow.set_percentage(250), Ok(Percentage::new(99)));
        let ticket = workflow.begin_apply().unwrap();
        assert_eq!(ticket.request.field("percentage"), Some("99"));
    }

    #[test]
    fn test_set_percentage_preconditions() {
        let mut workflow = workflow(FailurePolicy::default());
        assert_eq!(workflow.set_percentage(10), Err(WorkflowError::MissingSelection));

        workflow.select_filter(FilterSelection::Grayscale).unwrap();
        assert_eq!(workflow.set_percentage(10), Err(WorkflowError::NoParameter));
    }

    #[test]
    fn test_set_percentage_clears_result() {
        let mut workflow = workflow(FailurePolicy::default());
        workflow
            .select_filter(FilterSelection::Resize(Percentage::default()))
            .unwrap();
        apply_ok(&mut workflow, b"half");

        workflow.set_percentage(10).unwrap();
        assert!(workflow.result().is_none());
        assert_eq!(
            workflow.selection(),
            Some(FilterSelection::Resize(Percentage::new(10)))
        );
    }

    #[test]
    fn test_stale_response_after_new_selection() {
        let mut workflow = workflow(FailurePolicy::default());
        workflow.select_filter(FilterSelection::Grayscale).unwrap();
        let ticket = workflow.begin_apply().unwrap();

        workflow.select_filter(FilterSelection::BlurEdges).unwrap();
        let outcome = workflow.finish_apply(ticket.attempt, Ok(Bytes::from_static(b"late")));

        assert_eq!(outcome, ApplyOutcome::Stale);
        assert_eq!(workflow.stage(), Stage::Selecting);
        assert_eq!(workflow.selection(), Some(FilterSelection::BlurEdges));
        assert!(workflow.result().is_none());
    }

    #[test]
    fn test_overlapping_applies_keep_latest() {
        let mut workflow = workflow(FailurePolicy::default());
        workflow.select_filter(FilterSelection::Grayscale).unwrap();

        let first = workflow.begin_apply().unwrap();
        let second = workflow.begin_apply().unwrap();
        assert!(second.attempt > first.attempt);
        assert_eq!(workflow.pending_attempt(), Some(second.attempt));

        assert_eq!(
            workflow.finish_apply(first.attempt, Ok(Bytes::from_static(b"first"))),
            ApplyOutcome::Stale
        );
        assert!(workflow.is_applying());

        assert_eq!(
            workflow.finish_apply(second.attempt, Ok(Bytes::from_static(b"second"))),
            ApplyOutcome::Applied
        );
        assert_eq!(workflow.result().unwrap().image.bytes.as_ref(), b"second");

        assert_eq!(
            workflow.finish_apply(second.attempt, Ok(Bytes::from_static(b"again"))),
            ApplyOutcome::Stale
        );
    }

    #[test]
    fn test_new_source_invalidates_pending_apply() {
        let mut workflow = workflow(FailurePolicy::default());
        workflow.select_filter(FilterSelection::Grayscale).unwrap();
        let ticket = workflow.begin_apply().unwrap();

        let other = ImageHandle::new("dog.png", b"\x89PNG\r\n\x1a\n".to_vec());
        workflow.set_source(other.clone());
        assert_eq!(
            workflow.finish_apply(ticket.attempt, Err(server_error())),
            ApplyOutcome::Stale
        );
        assert_eq!(workflow.stage(), Stage::HasSource);
        assert_eq!(workflow.preview(), Some(&other));
        assert!(workflow.error().is_none());
    }

    #[test]
    fn test_reset() {
        let mut workflow = workflow(FailurePolicy::default());
        workflow.select_filter(FilterSelection::Grayscale).unwrap();
        apply_ok(&mut workflow, b"done");

        workflow.reset();
        assert_eq!(workflow.stage(), Stage::Empty);
        assert!(workflow.preview().is_none());
    }
}
