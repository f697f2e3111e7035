// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{debug, error, info};

use crate::{
    error::{Error, Result},
    template::TemplateFile,
};

use super::{generate_output, GenerateOptions, Output, OutputSpec};

struct Job {
    index: usize,
    spec: OutputSpec,
}

struct JobResult {
    index: usize,
    result: Result<Output>,
}

/// Renders every output spec from one shared template on `worker_count` threads.
///
/// Each worker instantiates its own copy of the template, so outputs never see each other's
/// tokens. Results come back in the order of `specs`; one failing output doesn't stop the
/// others.
pub fn generate_all(
    template: Arc<TemplateFile>,
    specs: Vec<OutputSpec>,
    options: Arc<GenerateOptions>,
    worker_count: usize,
) -> Vec<(String, Result<Output>)> {
    let worker_count = worker_count.clamp(1, specs.len().max(1));
    let names: Vec<String> = specs.iter().map(|spec| spec.name.clone()).collect();

    let (job_sender, job_receiver) = bounded::<Job>(worker_count * 2);
    let (result_sender, result_receiver) = unbounded::<JobResult>();

    let workers: Vec<JoinHandle<()>> = (0..worker_count)
        .map(|worker_id| {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let template = Arc::clone(&template);
            let options = Arc::clone(&options);
            thread::spawn(move || run_worker(worker_id, job_rx, result_tx, template, options))
        })
        .collect();
    drop(job_receiver);
    drop(result_sender);

    info!(
        template = template.name(),
        outputs = names.len(),
        workers = worker_count,
        "generating outputs"
    );

    for (index, spec) in specs.into_iter().enumerate() {
        if job_sender.send(Job { index, spec }).is_err() {
            error!("all workers stopped before every output was submitted");
            break;
        }
    }
    // Disconnect so workers exit once the queue drains.
    drop(job_sender);

    let mut results: Vec<Option<Result<Output>>> = names.iter().map(|_| None).collect();
    for job_result in result_receiver.iter() {
        results[job_result.index] = Some(job_result.result);
    }

    for (i, worker) in workers.into_iter().enumerate() {
        if let Err(err) = worker.join() {
            error!("worker {} panicked: {:?}", i, err);
        }
    }

    names
        .into_iter()
        .zip(results)
        .map(|(name, result)| {
            let result = result.unwrap_or_else(|| Err(Error::WorkerFailed(name.clone())));
            (name, result)
        })
        .collect()
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<Job>,
    result_sender: Sender<JobResult>,
    template: Arc<TemplateFile>,
    options: Arc<GenerateOptions>,
) {
    debug!("worker {} started", worker_id);

    for job in job_receiver.iter() {
        let result = generate_output(&template, &job.spec, &options);
        if let Err(err) = &result {
            error!(output = job.spec.name.as_str(), "failed to render output: {}", err);
        }

        let job_result = JobResult {
            index: job.index,
            result,
        };
        if result_sender.send(job_result).is_err() {
            break;
        }
    }

    debug!("worker {} finished", worker_id);
}
