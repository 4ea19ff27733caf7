// Replay command - one reporter per recorded test task, one build

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::cli::Cli;
use crate::config::ReportConfig;
use crate::replay::{EventReplayer, ExceptionPrinter, ReplayStats};
use crate::report::{ConsoleSink, LogSink, TestReport};
use crate::state::GlobalCounter;

const STDIN_MARKER: &str = "-";

pub fn run_replay(cli: &Cli, config: ReportConfig) -> Result<ReplayStats> {
    let sink: Arc<dyn LogSink> = Arc::new(ConsoleSink::new(cli.log_level));
    replay_build(&cli.event_files, config, sink, cli.print_env)
}

/// Replay every task of one build against a shared counter.
///
/// In parallel mode tasks replay on their own threads, so their events
/// interleave the way concurrently running test tasks do.
pub fn replay_build(
    sources: &[PathBuf],
    config: ReportConfig,
    sink: Arc<dyn LogSink>,
    print_env: bool,
) -> Result<ReplayStats> {
    let config = Arc::new(config);
    let counter = Arc::new(GlobalCounter::new());
    let sources: Vec<PathBuf> = if sources.is_empty() {
        vec![PathBuf::from(STDIN_MARKER)]
    } else {
        sources.to_vec()
    };

    info!("Replaying {} test task(s)", sources.len());

    let results: Vec<Result<ReplayStats>> = if config.parallel && sources.len() > 1 {
        std::thread::scope(|scope| {
            let handles: Vec<_> = sources
                .iter()
                .map(|source| {
                    let config = config.clone();
                    let sink = sink.clone();
                    let counter = counter.clone();
                    scope.spawn(move || replay_task(source, config, sink, counter, print_env))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(anyhow::anyhow!("replay thread panicked")))
                })
                .collect()
        })
    } else {
        sources
            .iter()
            .map(|source| replay_task(source, config.clone(), sink.clone(), counter.clone(), print_env))
            .collect()
    };

    let mut total = ReplayStats::default();
    let mut first_error = None;
    for result in results {
        match result {
            Ok(stats) => {
                total.events += stats.events;
                total.tests += stats.tests;
                total.failures += stats.failures;
            }
            Err(err) if first_error.is_none() => first_error = Some(err),
            Err(_) => {}
        }
    }

    counter.finish_build()?;

    match first_error {
        Some(err) => Err(err),
        None => Ok(total),
    }
}

fn replay_task(
    source: &Path,
    config: Arc<ReportConfig>,
    sink: Arc<dyn LogSink>,
    counter: Arc<GlobalCounter>,
    print_env: bool,
) -> Result<ReplayStats> {
    let report = TestReport::new(config.clone(), sink.clone(), counter);
    let mut env: BTreeMap<String, String> = BTreeMap::new();
    let host = report.attach(&mut env)?;

    if print_env {
        for (key, value) in &env {
            println!("{}={}", key, value);
        }
    }

    let engine_prints_cause =
        config.logging.show_logs_failed_only && config.logging.show_only_cause_exception;
    let printer = host.and_then(|host| ExceptionPrinter::for_host(host, engine_prints_cause, sink));

    let reader = open_source(source)?;
    let mut replayer = EventReplayer::new(&report).with_exception_printer(printer);
    replayer
        .replay(reader)
        .with_context(|| format!("Failed to replay {}", source.display()))
}

fn open_source(source: &Path) -> Result<Box<dyn BufRead>> {
    if source == Path::new(STDIN_MARKER) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(source)
        .with_context(|| format!("Failed to open event file {}", source.display()))?;
    Ok(Box::new(BufReader::new(file)))
}
