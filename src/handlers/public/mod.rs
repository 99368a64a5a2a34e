//! Token-secured endpoints that need no JWT: the signatory page and the
//! public letter view. Possession of the opaque token is the credential.

pub mod letter;
pub mod signature;
