/// Http REST request/response primitives: [`http::rest::client::RestClient`],
/// [`http::private`] request signing, and [`http::public`] unauthenticated building.
pub mod http;
