// Scripted process runner for unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::errors::DownloadError;
use super::traits::{ProcessOutput, ProcessRunner, ProgressEmitter};

pub struct FakeStep {
    result: Result<ProcessOutput, DownloadError>,
    creates: Vec<(PathBuf, Vec<u8>)>,
}

impl FakeStep {
    pub fn ok() -> Self {
        Self::stdout("")
    }

    pub fn stdout(stdout: &str) -> Self {
        Self {
            result: Ok(ProcessOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
            creates: Vec::new(),
        }
    }

    pub fn fail(code: i32, stderr: &str) -> Self {
        Self {
            result: Ok(ProcessOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
            creates: Vec::new(),
        }
    }

    pub fn error(err: DownloadError) -> Self {
        Self {
            result: Err(err),
            creates: Vec::new(),
        }
    }

    /// Write a placeholder file when the step runs, like a real download would
    pub fn creating(self, path: impl Into<PathBuf>) -> Self {
        self.writing(path, "data")
    }

    pub fn writing(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.creates.push((path.into(), content.as_bytes().to_vec()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Default)]
pub struct FakeRunner {
    steps: Mutex<VecDeque<FakeStep>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeRunner {
    pub fn new(steps: Vec<FakeStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        _progress: &ProgressEmitter,
    ) -> Result<ProcessOutput, DownloadError> {
        self.calls.lock().unwrap().push(RecordedCall {
            program: program.to_path_buf(),
            args: args.to_vec(),
        });

        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected call to {}", program.display()));

        for (path, content) in &step.creates {
            std::fs::write(path, content).unwrap();
        }
        step.result
    }
}
