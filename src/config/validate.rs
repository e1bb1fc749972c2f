// src/config/validate.rs

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::{ForemanError, Result};
use crate::types::PolicyKind;

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = ForemanError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_plan(&raw)?;
        Ok(PlanFile::new_unchecked(raw.manager, raw.worker))
    }
}

/// Run every semantic check on a raw plan.
pub fn validate_raw_plan(plan: &RawPlanFile) -> Result<()> {
    ensure_has_workers(plan)?;
    validate_pool(plan)?;
    validate_workers(plan)?;
    validate_references(plan)?;
    Ok(())
}

fn config_error(msg: String) -> ForemanError {
    ForemanError::ConfigError(msg)
}

fn ensure_has_workers(plan: &RawPlanFile) -> Result<()> {
    if plan.worker.is_empty() {
        return Err(config_error(
            "plan must contain at least one [worker.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pool(plan: &RawPlanFile) -> Result<()> {
    let pool = &plan.manager.config.pool;
    let (core, max) = (pool.core_threads(), pool.max_threads());

    if core == 0 {
        return Err(config_error(
            "[manager.pool].core_threads must be >= 1 (got 0)".to_string(),
        ));
    }
    if max < core {
        return Err(config_error(format!(
            "[manager.pool].max_threads ({max}) must be >= core_threads ({core})"
        )));
    }
    Ok(())
}

fn validate_workers(plan: &RawPlanFile) -> Result<()> {
    for (name, spec) in &plan.worker {
        if spec.cmd.trim().is_empty() {
            return Err(config_error(format!("worker '{name}' has an empty `cmd`")));
        }
    }
    Ok(())
}

fn validate_references(plan: &RawPlanFile) -> Result<()> {
    let topological = plan.manager.policy == PolicyKind::Topological;

    for (name, spec) in &plan.worker {
        for (field, refs) in [("after", &spec.after), ("before", &spec.before)] {
            if refs.is_empty() {
                continue;
            }
            if !topological {
                return Err(config_error(format!(
                    "worker '{name}' uses `{field}`, which requires policy = \"topological\""
                )));
            }
            for other in refs {
                if other == name {
                    return Err(config_error(format!(
                        "worker '{name}' cannot reference itself in `{field}`"
                    )));
                }
                if !plan.worker.contains_key(other) {
                    return Err(config_error(format!(
                        "worker '{name}' has unknown reference '{other}' in `{field}`"
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_str;

    fn check(toml: &str) -> Result<PlanFile> {
        PlanFile::try_from(parse_str(toml).unwrap())
    }

    fn config_message(result: Result<PlanFile>) -> String {
        match result {
            Err(ForemanError::ConfigError(msg)) => msg,
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn empty_plan_is_rejected() {
        assert!(config_message(check("")).contains("at least one"));
    }

    #[test]
    fn ordering_requires_topological_policy() {
        let msg = config_message(check(
            r#"
[worker.a]
cmd = "true"
[worker.b]
cmd = "true"
after = ["a"]
"#,
        ));
        assert!(msg.contains("topological"), "{msg}");
    }

    #[test]
    fn unknown_and_self_references_are_rejected() {
        let unknown = config_message(check(
            r#"
[manager]
policy = "topological"
[worker.a]
cmd = "true"
before = ["ghost"]
"#,
        ));
        assert!(unknown.contains("ghost"));

        let selfref = config_message(check(
            r#"
[manager]
policy = "topological"
[worker.a]
cmd = "true"
after = ["a"]
"#,
        ));
        assert!(selfref.contains("itself"));
    }

    #[test]
    fn pool_sizes_are_checked() {
        let msg = config_message(check(
            r#"
[manager.pool]
core_threads = 4
max_threads = 2
[worker.a]
cmd = "true"
"#,
        ));
        assert!(msg.contains("max_threads"));
    }

    #[test]
    fn empty_command_is_rejected() {
        let msg = config_message(check("[worker.a]\ncmd = \"  \"\n"));
        assert!(msg.contains("empty"));
    }

    #[test]
    fn cycles_pass_validation() {
        // Cycles are reported when the manager is built.
        check(
            r#"
[manager]
policy = "topological"
[worker.a]
cmd = "true"
after = ["b"]
[worker.b]
cmd = "true"
after = ["a"]
"#,
        )
        .unwrap();
    }
}
