use derive_more::Constructor;
use hmac::Hmac;
use meridian_integration::protocol::http::{
    private::{RequestSigner, Signer, encoder::HexEncoder},
    rest::RestRequest,
};
use reqwest::RequestBuilder;
use sha2::Sha256;

/// Binance USD-M futures signs the fully-assembled query string with HMAC-SHA256, hex-encoded.
pub type BinanceFuturesSigner = RequestSigner<BinanceSigner, Hmac<Sha256>, HexEncoder>;

#[derive(Debug, Clone, Constructor)]
pub struct BinanceSigner {
    api_key: String,
}

impl Signer for BinanceSigner {
    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn bytes_to_sign<Request>(&self, request: &Request, _builder: &RequestBuilder) -> String
    where
        Request: RestRequest,
    {
        request
            .query_params()
            .map(|params| serde_urlencoded::to_string(params).unwrap_or_default())
            .unwrap_or_default()
    }

    fn add_signature(
        &self,
        builder: RequestBuilder,
        signature: String,
    ) -> Result<reqwest::Request, reqwest::Error> {
        const HEADER_API_KEY: &str = "X-MBX-APIKEY";
        const QUERY_KEY_SIGNATURE: &str = "signature";

        builder
            .header(HEADER_API_KEY, self.api_key.as_str())
            .query(&[(QUERY_KEY_SIGNATURE, signature)])
            .build()
    }
}
