//! Workflow engine behind the three screens.
//!
//! `/` takes the source image, `/filter` applies one remote filter at a time
//! and `/output` shows and saves the final image.

pub mod image;
pub mod intake;
pub mod navigation;
pub mod output;
pub mod session;
pub mod workflow;

pub use image::ImageHandle;
pub use navigation::{NavigationState, Navigator, Screen};
pub use session::{Session, SessionError, SessionOptions, SessionStatus};
pub use workflow::{
    ApplyOutcome, ApplyTicket, FailurePolicy, FilterOutput, SizeInfo, Stage, Workflow,
    WorkflowError,
};
