//! Glues the screens together: intake on `/`, filtering on `/filter` and the
//! final image on `/output`.

use super::{
    image::ImageHandle,
    intake,
    navigation::{NavigationState, Navigator, Screen},
    output,
    workflow::{ApplyOutcome, FailurePolicy, SizeInfo, Stage, Workflow, WorkflowError},
};
use filter_client::{FilterKind, FilterSelection, FilterService, Percentage, ServiceConfig};
use std::{
    fmt,
    path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("`{action}` is not available on {screen}")]
    WrongScreen { action: &'static str, screen: Screen },

    #[error("No readable image was provided")]
    NoImage,

    #[error("No filtered image yet. Apply a filter first")]
    MissingResult,

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Download failed. {0}")]
    Download(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub service: ServiceConfig,
    pub policy: FailurePolicy,
    pub default_percentage: Percentage,
    pub save_dir: PathBuf,
    pub filename: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            policy: FailurePolicy::default(),
            default_percentage: Percentage::default(),
            save_dir: PathBuf::new(),
            filename: "output-image.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub screen: Screen,
    pub stage: Stage,
    pub selection: Option<FilterSelection>,
    pub error: Option<String>,
    pub preview: Option<ImageHandle>,
    pub size_info: Option<SizeInfo>,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "screen: {}", self.screen)?;

        if self.screen == Screen::Filter {
            write!(f, ", stage: {:?}", self.stage)?;
            match self.selection {
                Some(selection) => write!(f, ", filter: {selection}")?,
                None => write!(f, ", filter: none")?,
            }
        }

        match &self.preview {
            Some(image) => write!(f, ", image: {} ({})", image.name, image.size_label())?,
            None if self.screen == Screen::Output => write!(f, ", no output image")?,
            None => write!(f, ", no image selected")?,
        }

        if let Some(info) = self.size_info {
            write!(f, ", size: {}", info.label())?;
        }

        if let Some(error) = &self.error {
            write!(f, ", error: {error}")?;
        }

        Ok(())
    }
}

pub struct Session {
    navigator: Navigator,
    workflow: Workflow,
    output: Option<ImageHandle>,
    service: Box<dyn FilterService>,
    options: SessionOptions,
}

impl Session {
    pub fn new(options: SessionOptions, service: Box<dyn FilterService>) -> Session {
        Session {
            navigator: Navigator::default(),
            workflow: Workflow::new(options.service.clone(), options.policy),
            output: None,
            service,
            options,
        }
    }

    pub fn screen(&self) -> Screen {
        self.navigator.current()
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn output_image(&self) -> Option<&ImageHandle> {
        self.output.as_ref()
    }

    fn expect_screen(&self, action: &'static str, screens: &[Screen]) -> Result<()> {
        let screen = self.screen();
        if screens.contains(&screen) {
            Ok(())
        } else {
            Err(SessionError::WrongScreen { action, screen })
        }
    }

    fn go(&mut self, screen: Screen, state: Option<NavigationState>) {
        self.navigator.navigate(screen, state);

        match (screen, self.navigator.take_state()) {
            (Screen::Filter, Some(NavigationState::Image(image))) => self.workflow.set_source(image),
            (Screen::Output, Some(NavigationState::Image(image))) => self.output = Some(image),
            (Screen::Home, Some(NavigationState::Reset)) => {
                self.workflow.reset();
                self.output = None;
            }
            (_, Some(state)) => log::debug!("{screen} ignored {state:?}"),
            (_, None) => (),
        }
    }

    /// Reads the picked files and moves to the filter screen with the last
    /// readable one. On failure the session stays where it is.
    pub async fn open(&mut self, paths: &[impl AsRef<Path>]) -> Result<&ImageHandle> {
        self.expect_screen("open", &[Screen::Home, Screen::Filter])?;

        let image = intake::accept_files(paths)
            .await
            .ok_or(SessionError::NoImage)?;

        self.go(Screen::Filter, Some(NavigationState::Image(image)));
        self.workflow.source().ok_or(SessionError::NoImage)
    }

    pub fn select(&mut self, kind: FilterKind) -> Result<FilterSelection> {
        self.expect_screen("select", &[Screen::Filter])?;

        let percentage = self
            .workflow
            .selection()
            .and_then(|s| s.percentage())
            .unwrap_or(self.options.default_percentage);
        let selection = FilterSelection::from_kind(kind, percentage);

        self.workflow.select_filter(selection)?;
        Ok(selection)
    }

    pub fn set_percentage(&mut self, value: i64) -> Result<Percentage> {
        self.expect_screen("percentage", &[Screen::Filter])?;
        Ok(self.workflow.set_percentage(value)?)
    }

    pub async fn apply(&mut self) -> Result<ApplyOutcome> {
        self.expect_screen("apply", &[Screen::Filter])?;
        Ok(self.workflow.apply_filter(self.service.as_ref()).await?)
    }

    pub fn back(&mut self) -> Result<()> {
        self.expect_screen("back", &[Screen::Filter])?;
        self.go(Screen::Home, Some(NavigationState::Reset));
        Ok(())
    }

    /// Carries the current result to the output screen.
    pub fn proceed(&mut self) -> Result<&ImageHandle> {
        self.expect_screen("proceed", &[Screen::Filter])?;

        let image = self
            .workflow
            .result()
            .map(|output| output.image.clone())
            .ok_or(SessionError::MissingResult)?;

        self.go(Screen::Output, Some(NavigationState::Image(image)));
        self.output.as_ref().ok_or(SessionError::MissingResult)
    }

    pub fn start_over(&mut self) {
        self.go(Screen::Home, Some(NavigationState::Reset));
    }

    /// Saves the image shown on the current screen. `Ok(None)` means there
    /// was nothing to save.
    pub fn download(&self) -> Result<Option<PathBuf>> {
        self.expect_screen("download", &[Screen::Filter, Screen::Output])?;

        let image = match self.screen() {
            Screen::Output => self.output.as_ref(),
            _ => self.workflow.result().map(|output| &output.image),
        };

        output::download(image, &self.options.save_dir, &self.options.filename)
            .map_err(|e| SessionError::Download(format!("{e:#}")))
    }

    pub fn status(&self) -> SessionStatus {
        let screen = self.screen();

        let (preview, size_info) = match screen {
            Screen::Home => (None, None),
            Screen::Filter => (
                self.workflow.preview().cloned(),
                self.workflow.result().and_then(|output| output.size_info),
            ),
            Screen::Output => (self.output.clone(), None),
        };

        SessionStatus {
            screen,
            stage: self.workflow.stage(),
            selection: self.workflow.selection(),
            error: self.workflow.error().map(str::to_string),
            preview,
            size_info,
        }
    }
}
