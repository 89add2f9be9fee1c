use crate::api::{ApiError, Transport};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

type Request = (String, Vec<(String, String)>);

/// Answers each path from a queue of canned responses and records requests.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<String, u16>>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_ok(&self, path: &str, body: impl Into<String>) {
        self.queue(path, Ok(body.into()));
    }

    pub(crate) fn push_status(&self, path: &str, status: u16) {
        self.queue(path, Err(status));
    }

    fn queue(&self, path: &str, response: Result<String, u16>) {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_owned())
            .or_default()
            .push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ApiError> {
        self.requests.lock().unwrap().push((
            path.to_owned(),
            query
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        ));
        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(body)) => Ok(body),
            Some(Err(status)) => Err(ApiError::Status(status)),
            None => Err(ApiError::Http(format!("no scripted response for {path}"))),
        }
    }
}
