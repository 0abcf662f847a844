// src/config/build.rs

//! Merge CLI flags over the config file into a [`JobConfig`].
//!
//! Scalars from the CLI replace file values; handler lists and environment
//! entries from the CLI are appended after the file's.

use crate::cli::CliArgs;
use crate::config::identity::resolve_run_as;
use crate::config::job::{JobConfig, OverlapGuardConfig, default_lock_dir};
use crate::config::model::RawConfigFile;
use crate::config::validate::{parse_environment, validate_job_config};
use crate::errors::Result;
use crate::hooks::{HookLists, HookSet};

pub fn build_job_config(file: RawConfigFile, args: &CliArgs) -> Result<JobConfig> {
    let hooks = HookLists {
        pre: merge_set(file.pre, file.pre_async, &args.pre, &args.pre_async),
        notice: merge_set(file.notice, file.notice_async, &args.notice, &args.notice_async),
        success: merge_set(file.success, file.success_async, &args.success, &args.success_async),
        failure: merge_set(file.failure, file.failure_async, &args.failure, &args.failure_async),
        post: merge_set(file.post, file.post_async, &args.post, &args.post_async),
    };

    let mut env_entries = file.environments;
    env_entries.extend(args.env.iter().cloned());
    let environment = parse_environment(&env_entries)?;

    let user = args.user.as_deref().or(file.user.as_deref());
    let group = args.group.as_deref().or(file.group.as_deref());
    let run_as = resolve_run_as(user, group)?;

    let overlap_guard = (file.without_overlapping || args.without_overlapping).then(|| {
        OverlapGuardConfig {
            enabled: true,
            directory: args
                .mutexdir
                .clone()
                .or(file.mutexdir)
                .unwrap_or_else(default_lock_dir),
            explicit_id: args.mutex.clone().or(file.mutex),
        }
    });

    let cfg = JobConfig {
        command_args: args.command.clone(),
        tag: args.tag.clone().or(file.tag),
        working_directory: args.working_directory.clone().or(file.working_directory),
        environment,
        run_as,
        quiet: args.quiet || file.quiet,
        hooks,
        log_file: args.log_file.clone().or(file.log_file),
        log_prefix: args.log_prefix.clone().or(file.log_prefix),
        overlap_guard,
        timeout_seconds: args.timeout.or(file.timeout),
    };

    validate_job_config(&cfg)?;
    Ok(cfg)
}

fn merge_set(
    mut file_sync: Vec<String>,
    mut file_async: Vec<String>,
    cli_sync: &[String],
    cli_async: &[String],
) -> HookSet {
    file_sync.extend_from_slice(cli_sync);
    file_async.extend_from_slice(cli_async);
    HookSet::new(file_sync, file_async)
}
