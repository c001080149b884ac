use std::sync::Arc;

use ensemble_elasticity::ElasticityClient;
use ensemble_ledger::JobLedger;
use ensemble_metrics::MetricsRegistry;
use ensemble_types::{Action, ActionName, JobGroup, Rule};
use serde_json::json;

use crate::error::EngineError;
use crate::handlers::{ActionDescriptor, CustomContext, HandlerRegistry};
use crate::stop::StopSignal;
use crate::workload_manager::{JobEvent, WorkloadManager};

/// Context an [`ActionExecutor`] needs to evaluate and fire a single rule.
/// Built fresh by the caller (ingest/heartbeat loop) for each rule, since the
/// jobs a `submit` rule addresses must be resolved before the rule itself is
/// borrowed mutably out of the [`ensemble_config::RuleStore`].
pub struct EvalContext<'a> {
    /// Ledger mutated by submit/finish handling.
    pub ledger: &'a mut JobLedger,
    /// Metrics read by `when` guards and written by submit bookkeeping.
    pub metrics: &'a mut MetricsRegistry,
    /// Job group occurrences addressed by a `submit` action's label (all
    /// occurrences of that name, or every group if the label is absent).
    pub jobs: Vec<JobGroup>,
    /// The event that caused this evaluation, if any (absent for
    /// `heartbeat`/`start`/`metric` triggers).
    pub event: Option<JobEvent>,
}

/// C4: decides whether a rule fires this occurrence, and dispatches fired
/// actions to the submit, elasticity, custom-handler, or shutdown paths.
/// Grounded on `Action.perform()`/`perform_backoff()` and
/// `MemberBase.run_action()` in the original implementation.
pub struct ActionExecutor {
    workload_manager: Arc<dyn WorkloadManager>,
    elasticity: Option<ElasticityClient>,
    handlers: HandlerRegistry,
    group: String,
    version: String,
    member: String,
    resize_target: String,
    stop: Arc<StopSignal>,
}

impl ActionExecutor {
    /// Build an executor. `group`/`version` address the orchestrated
    /// resource's API group/version and `member`/`resize_target` its
    /// plural kind and instance name (SPEC_FULL.md §4.6/§4.7's resize
    /// payload `{version, group, grow|shrink}` and
    /// `ActionRequest(member=plural(member_name), name=identifier, ...)`).
    /// `member` is taken already pluralised (e.g. `"miniclusters"`) --
    /// English pluralisation is a deployment-time naming decision, not
    /// something this executor derives at runtime. All four are deployment
    /// configuration, not per-rule data.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workload_manager: Arc<dyn WorkloadManager>,
        elasticity: Option<ElasticityClient>,
        handlers: HandlerRegistry,
        group: impl Into<String>,
        version: impl Into<String>,
        member: impl Into<String>,
        resize_target: impl Into<String>,
        stop: Arc<StopSignal>,
    ) -> Self {
        ActionExecutor {
            workload_manager,
            elasticity,
            handlers,
            group: group.into(),
            version: version.into(),
            member: member.into(),
            resize_target: resize_target.into(),
            stop,
        }
    }

    /// Evaluate `rule` against `ctx`, advancing its repetition/backoff
    /// counters and firing its action if this occurrence qualifies.
    ///
    /// A `when` guard that cannot yet be resolved against `ctx.metrics`
    /// silently skips the rule without advancing its counters (it may become
    /// resolvable on a later occurrence).
    pub async fn evaluate(&mut self, rule: &mut Rule, mut ctx: EvalContext<'_>) -> Result<(), EngineError> {
        if rule.is_disabled() {
            return Ok(());
        }
        if let Some(when) = rule.when {
            match ctx.metrics.get(&rule.effective_name()) {
                None => return Ok(()),
                Some(reading) if !when.matches(reading) => return Ok(()),
                Some(_) => {}
            }
        }
        if !rule.action.perform() {
            return Ok(());
        }
        let rule: &Rule = rule;
        self.fire(rule, &mut ctx).await
    }

    async fn fire(&mut self, rule: &Rule, ctx: &mut EvalContext<'_>) -> Result<(), EngineError> {
        match rule.action.name {
            ActionName::Submit => self.fire_submit(&ctx.jobs, ctx.ledger).await,
            ActionName::Grow => self.fire_resize(&rule.action, false).await,
            ActionName::Shrink => self.fire_resize(&rule.action, true).await,
            ActionName::Terminate => {
                self.stop.request();
                Ok(())
            }
            ActionName::Custom => self.fire_custom(rule, ctx).await,
        }
    }

    async fn fire_custom(&mut self, rule: &Rule, ctx: &mut EvalContext<'_>) -> Result<(), EngineError> {
        let label = rule
            .action
            .label
            .as_deref()
            .ok_or_else(|| EngineError::UnknownHandler("<unnamed>".to_string()))?;
        let handler = self
            .handlers
            .get(label)
            .ok_or_else(|| EngineError::UnknownHandler(label.to_string()))?;
        let descriptor = handler.call(CustomContext {
            rule,
            event: ctx.event.as_ref(),
        });
        if let Some(descriptor) = descriptor {
            self.dispatch_descriptor(descriptor, ctx).await?;
        }
        Ok(())
    }

    /// Re-dispatch a handler-returned [`ActionDescriptor`] exactly one
    /// level; any action it in turn would want to trigger is logged and
    /// dropped (SPEC_FULL.md §4.4, Open Question ii).
    async fn dispatch_descriptor(
        &mut self,
        descriptor: ActionDescriptor,
        ctx: &mut EvalContext<'_>,
    ) -> Result<(), EngineError> {
        match descriptor.name {
            ActionName::Submit => self.fire_submit(&ctx.jobs, ctx.ledger).await,
            ActionName::Grow => self.fire_resize_raw(descriptor.value.unwrap_or(0.0), false).await,
            ActionName::Shrink => self.fire_resize_raw(descriptor.value.unwrap_or(0.0), true).await,
            ActionName::Terminate => {
                self.stop.request();
                Ok(())
            }
            ActionName::Custom => {
                tracing::warn!(
                    label = descriptor.label.as_deref().unwrap_or(""),
                    "dropping second-level custom re-dispatch"
                );
                Ok(())
            }
        }
    }

    /// Expand every addressed group into job instances (`JobGroup::expand`,
    /// mirroring `extract_jobs`/`submit` in
    /// `ensemble/members/flux/queue.py`) and submit each one. A rejected
    /// submission is logged and skipped, and the remaining instances still
    /// run (SPEC_FULL.md §7's error table: submission errors "log, skip that
    /// job, do not advance rule counters").
    async fn fire_submit(&self, jobs: &[JobGroup], ledger: &mut JobLedger) -> Result<(), EngineError> {
        let now = now_seconds();
        for group in jobs {
            for instance in group.expand() {
                match self.workload_manager.submit(&instance).await {
                    Ok(job_id) => ledger.insert(job_id, instance.group_name.clone(), now),
                    Err(err) => {
                        let submission_err = EngineError::Submission {
                            group: instance.group_name.clone(),
                            reason: err.to_string(),
                        };
                        tracing::warn!(error = %submission_err, "submit failed, skipping job");
                    }
                }
            }
        }
        Ok(())
    }

    async fn fire_resize(&mut self, action: &Action, shrink: bool) -> Result<(), EngineError> {
        let magnitude = action.value.unwrap_or(0.0);
        self.fire_resize_raw(magnitude, shrink).await
    }

    async fn fire_resize_raw(&mut self, magnitude: f64, shrink: bool) -> Result<(), EngineError> {
        let Some(client) = self.elasticity.as_mut() else {
            tracing::warn!("resize action fired with no elasticity client configured, dropping");
            return Ok(());
        };
        let payload = json!({
            "version": self.version,
            "group": self.group,
            "grow": if shrink { serde_json::Value::Null } else { json!(magnitude) },
            "shrink": if shrink { json!(magnitude) } else { serde_json::Value::Null },
        });
        let action_name = if shrink { "shrink" } else { "grow" };
        client
            .action_request(&self.member, &self.resize_target, action_name, payload)
            .await?;
        Ok(())
    }
}

fn now_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
