pub mod canonical;
pub mod client;
pub mod digest;
pub mod error;
pub mod key;
pub mod signing;
pub mod token;
pub mod transport;

pub use canonical::{CanonicalPayload, HttpMethod, Tag, join_url};
pub use client::{Client, ClientConfig, Credentials, RequestOptions};
pub use error::{AuthError, ServerError};
pub use key::{KeyError, PublicKey, SecretKey};
pub use signing::{AssertionSigner, HTTP_AUTH_KIND, SchnorrSigner, SignedAssertion, sign_payload};
pub use transport::{ReqwestTransport, Request, Response, Transport, TransportError};
