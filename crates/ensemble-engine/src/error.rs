use thiserror::Error;

/// Errors raised while the controller is running. Per SPEC_FULL.md §7's
/// error table, a submission error is logged and the job is skipped without
/// aborting the run (`EngineError::Submission` is constructed for its
/// structured log fields, not propagated); everything else here does
/// surface from [`crate::Controller::run`] and stops the controller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The workload manager rejected a submission.
    #[error("submission failed for group '{group}': {reason}")]
    Submission {
        /// Group the submission was for.
        group: String,
        /// Why the workload manager rejected it.
        reason: String,
    },
    /// The elasticity RPC failed or was rejected.
    #[error("elasticity request failed: {0}")]
    Elasticity(#[from] ensemble_elasticity::ElasticityError),
    /// A `custom` action referenced a handler that is not registered.
    #[error("no handler registered for custom action '{0}'")]
    UnknownHandler(String),
}
