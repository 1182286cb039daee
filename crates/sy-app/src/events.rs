/// Observable poller state, emitted over a channel so a frontend can mirror
/// job progress. The receiver may be dropped at any time; senders treat a
/// closed channel as abandonment and drop the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Progress { percent: u8, step: String },
    Downloading,
    Done { sample_count: usize },
    Failed { error: String },
}
