//! In-memory build repository for tests
//!
//! Replays scripted responses and records every call it receives.

use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use odevio_client::{ClientError, Result};
use odevio_core::domain::artifact::ArtifactDescriptor;
use odevio_core::domain::job::BuildJob;
use odevio_core::dto::build::BuildForm;

use super::BuildRepository;

pub const BUILD_KEY: &str = "b-42";

#[derive(Debug, Clone)]
enum Reply {
    Job(BuildJob),
    Rejected(u16, String),
}

impl Reply {
    fn into_result(self) -> Result<BuildJob> {
        match self {
            Reply::Job(job) => Ok(job),
            Reply::Rejected(status, body) => Err(ClientError::api_error(status, body)),
        }
    }
}

pub fn job(status_code: Option<&str>, error_message: Option<&str>) -> BuildJob {
    BuildJob {
        key: BUILD_KEY.to_string(),
        status_code: status_code.map(str::to_string),
        error_message: error_message.map(str::to_string),
    }
}

pub struct FakeBuildRepository {
    submission: Reply,
    polls: Mutex<VecDeque<Reply>>,
    ipa: Option<ArtifactDescriptor>,
    /// Forms received by `create_build`
    pub forms: Mutex<Vec<BuildForm>>,
    /// Entry names of every uploaded archive
    pub uploads: Mutex<Vec<Vec<String>>>,
    /// Keys passed to `get_build`
    pub polled_keys: Mutex<Vec<String>>,
    pub ipa_requests: AtomicUsize,
}

impl FakeBuildRepository {
    /// Submission succeeds with the given initial status
    pub fn new(initial_status: Option<&str>) -> Self {
        Self {
            submission: Reply::Job(job(initial_status, None)),
            polls: Mutex::new(VecDeque::new()),
            ipa: None,
            forms: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            polled_keys: Mutex::new(Vec::new()),
            ipa_requests: AtomicUsize::new(0),
        }
    }

    pub fn rejecting_submission(mut self, status: u16, body: &str) -> Self {
        self.submission = Reply::Rejected(status, body.to_string());
        self
    }

    /// Queues the next poll reply
    pub fn then_status(self, status_code: &str) -> Self {
        self.push(Reply::Job(job(Some(status_code), None)))
    }

    pub fn then_failed(self, error_message: &str) -> Self {
        self.push(Reply::Job(job(Some("failed"), Some(error_message))))
    }

    pub fn then_rejected(self, status: u16, body: &str) -> Self {
        self.push(Reply::Rejected(status, body.to_string()))
    }

    pub fn with_ipa(mut self, url: &str) -> Self {
        self.ipa = Some(ArtifactDescriptor {
            url: url.to_string(),
        });
        self
    }

    fn push(self, reply: Reply) -> Self {
        self.polls.lock().unwrap().push_back(reply);
        self
    }

    pub fn poll_count(&self) -> usize {
        self.polled_keys.lock().unwrap().len()
    }

    pub fn ipa_request_count(&self) -> usize {
        self.ipa_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildRepository for FakeBuildRepository {
    async fn create_build(&self, form: &BuildForm, archive: &Path) -> Result<BuildJob> {
        let zip = zip::ZipArchive::new(File::open(archive)?)
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();

        self.uploads.lock().unwrap().push(names);
        self.forms.lock().unwrap().push(form.clone());
        self.submission.clone().into_result()
    }

    async fn get_build(&self, key: &str) -> Result<BuildJob> {
        self.polled_keys.lock().unwrap().push(key.to_string());
        // Once the script runs out the build stays queued
        let reply = self
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Job(job(Some("queued"), None)));
        reply.into_result()
    }

    async fn get_ipa(&self, _key: &str) -> Result<ArtifactDescriptor> {
        self.ipa_requests.fetch_add(1, Ordering::SeqCst);
        self.ipa
            .clone()
            .ok_or_else(|| ClientError::api_error(404, "Not found."))
    }
}
