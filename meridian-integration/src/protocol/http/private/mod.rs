use crate::{
    error::SocketError,
    protocol::http::{BuildStrategy, rest::RestRequest},
};
use hmac::Mac;
use reqwest::{RequestBuilder, Request};

/// Hex/base64 signature encoding.
pub mod encoder;

use encoder::Encoder;

/// Exchange-specific logic for turning a [`RestRequest`] into the exact bytes that get signed.
///
/// Binance signs the fully-assembled query string (including `timestamp` and `recvWindow`); a
/// different venue might sign a different canonical form, which is why this is a trait rather
/// than baked into [`RequestSigner`].
pub trait Signer {
    /// API key sent alongside the signature.
    fn api_key(&self) -> &str;

    /// Build the exact string that gets HMAC'd for this request (eg/ the query string).
    fn bytes_to_sign<Request>(&self, request: &Request, builder: &RequestBuilder) -> String
    where
        Request: RestRequest;

    /// Attach the signature (and any other auth headers/params) to the builder.
    fn add_signature(
        &self,
        builder: RequestBuilder,
        signature: String,
    ) -> Result<Request, reqwest::Error>;
}

/// [`BuildStrategy`] that HMAC-signs every [`RestRequest`] using exchange-specific [`Signer`]
/// logic, a keyed [`Mac`], and a signature [`Encoder`].
#[derive(Debug)]
pub struct RequestSigner<SignerImpl, Hmac, Enc> {
    pub signer: SignerImpl,
    pub mac: Hmac,
    pub encoder: Enc,
}

impl<SignerImpl, Hmac, Enc> RequestSigner<SignerImpl, Hmac, Enc> {
    pub fn new(signer: SignerImpl, mac: Hmac, encoder: Enc) -> Self {
        Self {
            signer,
            mac,
            encoder,
        }
    }
}

impl<SignerImpl, HmacImpl, Enc> BuildStrategy for RequestSigner<SignerImpl, HmacImpl, Enc>
where
    SignerImpl: Signer,
    HmacImpl: Mac + Clone,
    Enc: Encoder,
{
    fn build<Request>(
        &self,
        request: Request,
        builder: RequestBuilder,
    ) -> Result<reqwest::Request, SocketError>
    where
        Request: RestRequest,
    {
        let bytes_to_sign = self.signer.bytes_to_sign(&request, &builder);

        let mut mac = self.mac.clone();
        mac.update(bytes_to_sign.as_bytes());
        let signature = self.encoder.encode(mac.finalize().into_bytes());

        self.signer
            .add_signature(builder, signature)
            .map_err(SocketError::from)
    }
}
