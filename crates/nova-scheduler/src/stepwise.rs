use std::panic::{self, AssertUnwindSafe};

use crate::{Cancelled, CancellationToken, ProgressSender, TaskError};

/// A computation that advances in small, resumable steps.
///
/// Implementations keep all intermediate state in `self`, so a driver may stop calling
/// [`iteration`](SequentialTask::iteration) at any point and resume later (or never).
pub trait SequentialTask {
    /// Called once before the first iteration.
    fn prepare(&mut self) {}

    /// Advance by one step. Returns `true` once the task is complete.
    fn iteration(&mut self) -> bool;

    fn is_done(&self) -> bool;

    /// Abort the task. After `stop` the task reports `is_done() == true`.
    fn stop(&mut self);

    /// Completed fraction in `0.0..=1.0`, if the task can estimate it.
    fn progress(&self) -> Option<f64> {
        None
    }
}

/// Drive `task` to completion on the current thread.
///
/// The token is checked between iterations; on cancellation the task is stopped and
/// `Err(Cancelled)` is returned. Work already done by earlier iterations is kept.
pub fn run_to_completion<T>(task: &mut T, token: &CancellationToken) -> Result<(), Cancelled>
where
    T: SequentialTask + ?Sized,
{
    task.prepare();
    while !task.is_done() {
        if token.is_cancelled() {
            task.stop();
            return Err(Cancelled);
        }
        if task.iteration() {
            break;
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct StepwiseOptions {
    /// Title of the progress report, if a [`ProgressSender`] is supplied.
    pub title: String,
    /// Number of iterations between cooperative yields.
    pub yield_every: usize,
    /// Number of iterations between progress reports.
    pub report_every: usize,
}

impl Default for StepwiseOptions {
    fn default() -> Self {
        Self {
            title: "Working".to_string(),
            yield_every: 64,
            report_every: 256,
        }
    }
}

/// Drive `task` from an async context, yielding to the Tokio scheduler every
/// `options.yield_every` iterations so other work on the same runtime stays responsive.
///
/// A panic inside an iteration is caught, logged, and reported as [`TaskError::Panicked`]; the
/// task is stopped in that case as well as on cancellation.
pub async fn run_stepwise<T>(
    task: &mut T,
    token: &CancellationToken,
    progress: Option<&ProgressSender>,
    options: &StepwiseOptions,
) -> Result<(), TaskError>
where
    T: SequentialTask + ?Sized,
{
    let report = progress.map(|sender| sender.start(options.title.clone()));
    let yield_every = options.yield_every.max(1);
    let report_every = options.report_every.max(1);

    task.prepare();
    let mut steps = 0usize;
    while !task.is_done() {
        if token.is_cancelled() {
            task.stop();
            if let Some(report) = &report {
                report.finish(Some("cancelled".to_string()));
            }
            return Err(TaskError::Cancelled);
        }

        match panic::catch_unwind(AssertUnwindSafe(|| task.iteration())) {
            Ok(true) => break,
            Ok(false) => {}
            Err(payload) => {
                tracing::error!(
                    target = "nova.scheduler",
                    panic = %panic_message(&*payload),
                    steps,
                    "stepwise task panicked"
                );
                task.stop();
                return Err(TaskError::Panicked);
            }
        }

        steps += 1;
        if let Some(report) = &report {
            if steps % report_every == 0 {
                let percentage = task.progress().map(|p| (p.clamp(0.0, 1.0) * 100.0) as u32);
                report.report(None, percentage);
            }
        }
        if steps % yield_every == 0 {
            tokio::task::yield_now().await;
        }
    }

    tracing::debug!(target = "nova.scheduler", steps, "stepwise task finished");
    if let Some(report) = &report {
        report.finish(None);
    }
    Ok(())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProgressEvent;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Counter {
        prepared: bool,
        count: usize,
        limit: usize,
        stopped: bool,
    }

    impl SequentialTask for Counter {
        fn prepare(&mut self) {
            self.prepared = true;
        }

        fn iteration(&mut self) -> bool {
            self.count += 1;
            self.is_done()
        }

        fn is_done(&self) -> bool {
            self.stopped || self.count >= self.limit
        }

        fn stop(&mut self) {
            self.stopped = true;
        }

        fn progress(&self) -> Option<f64> {
            Some(self.count as f64 / self.limit as f64)
        }
    }

    #[test]
    fn sync_driver_runs_until_done() {
        let mut task = Counter {
            limit: 10,
            ..Counter::default()
        };
        run_to_completion(&mut task, &CancellationToken::new()).unwrap();
        assert!(task.prepared);
        assert_eq!(task.count, 10);
        assert!(!task.stopped);
    }

    #[test]
    fn sync_driver_stops_on_cancelled_token() {
        let mut task = Counter {
            limit: 10,
            ..Counter::default()
        };
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(run_to_completion(&mut task, &token), Err(Cancelled));
        assert_eq!(task.count, 0);
        assert!(task.stopped);
    }

    #[tokio::test]
    async fn async_driver_reports_progress() {
        let mut task = Counter {
            limit: 8,
            ..Counter::default()
        };
        let sender = ProgressSender::new(64);
        let mut rx = sender.subscribe();
        let options = StepwiseOptions {
            title: "count".to_string(),
            yield_every: 2,
            report_every: 4,
        };

        run_stepwise(&mut task, &CancellationToken::new(), Some(&sender), &options)
            .await
            .unwrap();
        assert_eq!(task.count, 8);

        let mut percentages = Vec::new();
        let mut ended = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                ProgressEvent::Report { percentage, .. } => percentages.push(percentage),
                ProgressEvent::End { .. } => ended = true,
                ProgressEvent::Begin { .. } => {}
            }
        }
        assert_eq!(percentages, vec![Some(50)]);
        assert!(ended);
    }

    struct Exploding;

    impl SequentialTask for Exploding {
        fn iteration(&mut self) -> bool {
            panic!("boom")
        }

        fn is_done(&self) -> bool {
            false
        }

        fn stop(&mut self) {}
    }

    #[tokio::test]
    async fn async_driver_catches_panics() {
        let result = run_stepwise(
            &mut Exploding,
            &CancellationToken::new(),
            None,
            &StepwiseOptions::default(),
        )
        .await;
        assert_eq!(result, Err(TaskError::Panicked));
    }
}
