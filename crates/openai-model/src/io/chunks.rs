#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

/// The body broke off before the server finished sending it.
#[derive(Debug, PartialEq, Eq)]
pub struct ReadError(pub String);

/// Where the bytes of a streamed body come from.
pub enum Chunks {
    Body(Response),
    /// Canned chunks, handed out one per read.
    #[cfg(test)]
    Preset(VecDeque<Bytes>),
}

impl From<Response> for Chunks {
    fn from(resp: Response) -> Self {
        Chunks::Body(resp)
    }
}

impl Chunks {
    #[cfg(test)]
    pub fn preset(chunks: &[&'static [u8]]) -> Self {
        Chunks::Preset(chunks.iter().copied().map(Bytes::from_static).collect())
    }

    /// Returns the next piece of the body, or `None` once it has ended.
    pub async fn read(&mut self) -> Result<Option<Bytes>, ReadError> {
        match self {
            Chunks::Body(resp) => resp
                .chunk()
                .await
                .map_err(|err| {
                    ReadError(format!("reading the event stream failed: {err}"))
                }),
            #[cfg(test)]
            Chunks::Preset(queue) => Ok(queue.pop_front()),
        }
    }
}
