mod signer;

pub use signer::{generate_auth_token, RdsTokenSigner, TOKEN_TTL};
