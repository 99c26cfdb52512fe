use std::error::Error;
use std::future::ready;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a model provider, which is an entry for listing
/// models, sampling requests, etc.
///
/// Once the provider is created, it should behave like a stateless object.
/// Everything that varies between two calls (the model identifier, the
/// transcript, the sampling parameters) travels in the [`ModelRequest`],
/// so one provider can serve any number of conversations.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Sends a request to the model.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;

    /// Lists the model identifiers this provider can serve.
    ///
    /// Providers without a listing endpoint return an empty list.
    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'static
    {
        ready(Ok(Vec::new()))
    }
}
