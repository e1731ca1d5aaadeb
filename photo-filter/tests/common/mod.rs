#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use filter_client::{Error, FilterRequest, FilterService};
use photo_filter::logic::{Session, SessionOptions};
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

pub const JPEG: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

pub enum Reply {
    Body(&'static [u8]),
    Status(u16),
}

#[derive(Default)]
struct Inner {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<FilterRequest>>,
}

/// Scripted stand-in for the remote service that records every request.
#[derive(Clone, Default)]
pub struct FakeService {
    inner: Arc<Inner>,
}

impl FakeService {
    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> FakeService {
        let service = FakeService::default();
        service.inner.replies.lock().unwrap().extend(replies);
        service
    }

    pub fn requests(&self) -> Vec<FilterRequest> {
        self.inner.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FilterService for FakeService {
    async fn apply(&self, request: FilterRequest) -> filter_client::Result<Bytes> {
        let url = request.url.clone();
        self.inner.requests.lock().unwrap().push(request);

        let reply = self
            .inner
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected filter request");

        match reply {
            Reply::Body(body) => Ok(Bytes::from_static(body)),
            Reply::Status(status) => Err(Error::Status { url, status }),
        }
    }
}

pub fn session(save_dir: &Path, service: &FakeService) -> Session {
    let options = SessionOptions {
        save_dir: save_dir.to_path_buf(),
        ..Default::default()
    };
    Session::new(options, Box::new(service.clone()))
}

pub fn write_image(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
