//! Authentication and access control: password-backed registration and
//! login, signed bearer tokens, and the extractors that resolve a request's
//! principal.

mod extract;
mod routes;
mod token;

pub use extract::{AdminClaims, bearer_token};
pub use routes::{LoginData, RegisterData, get_me, post_login, post_register};
pub use token::{Claims, TokenKeys, decode_token, encode_token};
