//! Client abstraction the lifecycle behaviours drive.

/// What a status request found.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StatusReading {
    /// The resource exists and reports this status.
    Present(String),
    /// The resource does not exist (for HTTP APIs, a 404).
    Gone,
}

/// How the service answered a delete request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteAck {
    /// The delete was accepted or is already under way. Clients should map
    /// a rejection caused by an in-progress deletion (an HTTP 400 on many
    /// block storage APIs) to this variant.
    Accepted,
    /// The resource did not exist when the delete was issued.
    AlreadyGone,
}

/// Minimal interface implemented by API clients for one resource kind.
///
/// Implementations perform their own I/O and may apply their own request
/// timeouts; the behaviours only bound the overall wait.
pub trait ResourceClient {
    /// Parameters accepted by [`ResourceClient::create`].
    type Request;
    /// Error type returned by the client.
    type Error: std::error::Error;

    /// Issues a create request and returns the new resource's id.
    ///
    /// # Errors
    ///
    /// Returns the client error when the request fails.
    fn create(&self, request: &Self::Request) -> Result<String, Self::Error>;

    /// Fetches the current status of `id`.
    ///
    /// # Errors
    ///
    /// Returns the client error when the request fails for any reason other
    /// than the resource not existing.
    fn status(&self, id: &str) -> Result<StatusReading, Self::Error>;

    /// Issues a delete request for `id`.
    ///
    /// # Errors
    ///
    /// Returns the client error when the service rejects the request.
    fn delete(&self, id: &str) -> Result<DeleteAck, Self::Error>;
}
