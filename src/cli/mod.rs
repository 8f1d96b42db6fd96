pub mod orchestration;

pub use orchestration::{
    bump_project, project_tag, Detection, ReleaseOutcome, ReleaseReport, ReleaseRequest,
    ReleaseWorkflow,
};
