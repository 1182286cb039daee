use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tracing::debug;

use sy_core::{AudioSample, JobStatus};

use crate::assembler;
use crate::backend::GenerationApi;
use crate::error::AppError;
use crate::events::PollEvent;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

const GENERIC_FAILURE: &str = "generation failed on the server";

/// Drives one job from submission to a terminal state.
///
/// Status queries for a job are strictly sequential: the next request is
/// issued only after the previous response resolved and the interval
/// elapsed. Any transport or parse failure halts polling immediately; the
/// poller never retries on its own.
pub struct JobPoller<A: GenerationApi> {
    api: A,
    interval: Duration,
}

impl<A: GenerationApi> JobPoller<A> {
    pub fn new(api: A, interval: Duration) -> Self {
        Self { api, interval }
    }

    /// Poll until the job completes or fails, emitting progress over
    /// `events`. The receiver may be dropped at any point (the caller
    /// navigated away); events are then silently discarded.
    pub async fn run(
        &self,
        job_id: &str,
        events: &UnboundedSender<PollEvent>,
    ) -> Result<Vec<AudioSample>, AppError> {
        loop {
            let report = match self.api.status(job_id).await {
                Ok(report) => report,
                Err(err) => return Err(self.fail(events, err)),
            };

            match report.status {
                JobStatus::Pending | JobStatus::Running => {
                    let step = report.current_step.unwrap_or_else(|| {
                        match report.status {
                            JobStatus::Pending => "waiting for worker",
                            _ => "generating",
                        }
                        .to_string()
                    });
                    // Server progress is passed through verbatim, even if it
                    // regresses between reports.
                    let _ = events.send(PollEvent::Progress {
                        percent: report.progress,
                        step,
                    });
                    sleep(self.interval).await;
                }
                JobStatus::Completed => {
                    let _ = events.send(PollEvent::Downloading);
                    debug!(job_id, "job complete, fetching archive");

                    let archive = match self.api.download(job_id).await {
                        Ok(archive) => archive,
                        Err(err) => return Err(self.fail(events, err)),
                    };
                    let samples = match assembler::assemble(&archive) {
                        Ok(samples) => samples,
                        Err(err) => return Err(self.fail(events, err)),
                    };

                    let _ = events.send(PollEvent::Done {
                        sample_count: samples.len(),
                    });
                    return Ok(samples);
                }
                JobStatus::Failed => {
                    let error = report
                        .error
                        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                    let _ = events.send(PollEvent::Failed {
                        error: error.clone(),
                    });
                    return Err(AppError::ServerReported(error));
                }
            }
        }
    }

    fn fail(&self, events: &UnboundedSender<PollEvent>, err: AppError) -> AppError {
        let _ = events.send(PollEvent::Progress {
            percent: 0,
            step: String::new(),
        });
        let _ = events.send(PollEvent::Failed {
            error: err.to_string(),
        });
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    use crate::assembler::tests::build_archive;
    use crate::backend::schemas::JobStatusResponse;

    fn report(status: JobStatus, progress: u8) -> JobStatusResponse {
        JobStatusResponse {
            status,
            progress,
            current_step: None,
            error: None,
        }
    }

    enum Scripted {
        Report(JobStatusResponse),
        ConnectionRefused,
    }

    struct ScriptedApi {
        script: Mutex<VecDeque<Scripted>>,
        archive: Vec<u8>,
        status_calls: AtomicUsize,
        download_calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(script: Vec<Scripted>, archive: Vec<u8>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                archive,
                status_calls: AtomicUsize::new(0),
                download_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerationApi for &ScriptedApi {
        async fn status(&self, _job_id: &str) -> Result<JobStatusResponse, AppError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("poller queried status after the script ended");
            match next {
                Scripted::Report(report) => Ok(report),
                Scripted::ConnectionRefused => {
                    // Port 1 is never listening; produces a genuine
                    // reqwest connect error without leaving localhost.
                    let err = reqwest::Client::new()
                        .get("http://127.0.0.1:1/")
                        .send()
                        .await
                        .expect_err("connect to a closed port");
                    Err(AppError::Transport(err))
                }
            }
        }

        async fn download(&self, _job_id: &str) -> Result<Vec<u8>, AppError> {
            self.download_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.archive.clone())
        }
    }

    fn drain(mut rx: UnboundedReceiver<PollEvent>) -> Vec<PollEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn kick_archive() -> Vec<u8> {
        build_archive(
            r#"{"samples":[{"filename":"a.wav","description":"kick"}]}"#,
            &[("a.wav", b"RIFFkick")],
        )
    }

    #[tokio::test]
    async fn test_polls_to_completion_and_assembles() {
        let api = ScriptedApi::new(
            vec![
                Scripted::Report(report(JobStatus::Pending, 0)),
                Scripted::Report(report(JobStatus::Running, 40)),
                Scripted::Report(report(JobStatus::Running, 80)),
                Scripted::Report(report(JobStatus::Completed, 100)),
            ],
            kick_archive(),
        );
        let poller = JobPoller::new(&api, Duration::from_millis(1));
        let (tx, rx) = unbounded_channel();

        let samples = poller.run("job-42", &tx).await.unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].filename, "a.wav");
        assert_eq!(samples[0].description, "kick");
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 4);
        assert_eq!(api.download_calls.load(Ordering::SeqCst), 1);

        let events = drain(rx);
        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                PollEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![0, 40, 80]);
        assert_eq!(events.last(), Some(&PollEvent::Done { sample_count: 1 }));
    }

    #[tokio::test]
    async fn test_server_failure_halts_polling() {
        let mut failed = report(JobStatus::Failed, 40);
        failed.error = Some("model timeout".to_string());
        let api = ScriptedApi::new(vec![Scripted::Report(failed)], Vec::new());
        let poller = JobPoller::new(&api, Duration::from_millis(1));
        let (tx, rx) = unbounded_channel();

        let err = poller.run("job-42", &tx).await.unwrap_err();

        match err {
            AppError::ServerReported(message) => assert_eq!(message, "model timeout"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.download_calls.load(Ordering::SeqCst), 0);
        assert!(drain(rx).contains(&PollEvent::Failed {
            error: "model timeout".to_string()
        }));
    }

    #[tokio::test]
    async fn test_failure_without_message_uses_fallback() {
        let api = ScriptedApi::new(
            vec![Scripted::Report(report(JobStatus::Failed, 0))],
            Vec::new(),
        );
        let poller = JobPoller::new(&api, Duration::from_millis(1));
        let (tx, _rx) = unbounded_channel();

        let err = poller.run("job-9", &tx).await.unwrap_err();
        assert!(matches!(err, AppError::ServerReported(m) if m == GENERIC_FAILURE));
    }

    #[tokio::test]
    async fn test_transport_failure_stops_and_resets_progress() {
        let api = ScriptedApi::new(
            vec![
                Scripted::Report(report(JobStatus::Running, 40)),
                Scripted::ConnectionRefused,
            ],
            Vec::new(),
        );
        let poller = JobPoller::new(&api, Duration::from_millis(1));
        let (tx, rx) = unbounded_channel();

        let err = poller.run("job-42", &tx).await.unwrap_err();

        assert!(matches!(err, AppError::Transport(_)));
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 2);
        let events = drain(rx);
        assert!(events.contains(&PollEvent::Progress {
            percent: 0,
            step: String::new()
        }));
    }

    #[tokio::test]
    async fn test_progress_regression_passes_through() {
        let api = ScriptedApi::new(
            vec![
                Scripted::Report(report(JobStatus::Running, 80)),
                Scripted::Report(report(JobStatus::Running, 60)),
                Scripted::Report(report(JobStatus::Completed, 100)),
            ],
            kick_archive(),
        );
        let poller = JobPoller::new(&api, Duration::from_millis(1));
        let (tx, rx) = unbounded_channel();

        poller.run("job-42", &tx).await.unwrap();

        let percents: Vec<u8> = drain(rx)
            .into_iter()
            .filter_map(|e| match e {
                PollEvent::Progress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect();
        // Regressions are reported verbatim, no monotonic clamp.
        assert_eq!(percents, vec![80, 60]);
    }

    #[tokio::test]
    async fn test_abandoned_receiver_does_not_panic() {
        let api = ScriptedApi::new(
            vec![
                Scripted::Report(report(JobStatus::Running, 10)),
                Scripted::Report(report(JobStatus::Completed, 100)),
            ],
            kick_archive(),
        );
        let poller = JobPoller::new(&api, Duration::from_millis(1));
        let (tx, rx) = unbounded_channel();
        drop(rx);

        let samples = poller.run("job-42", &tx).await.unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_archive_surfaces_after_completion() {
        let api = ScriptedApi::new(
            vec![Scripted::Report(report(JobStatus::Completed, 100))],
            b"not a zip".to_vec(),
        );
        let poller = JobPoller::new(&api, Duration::from_millis(1));
        let (tx, _rx) = unbounded_channel();

        let err = poller.run("job-42", &tx).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedResult(_)));
    }
}
