//! Cryptographic core.
//!
//! - [`vault`]: AES-256-GCM protection of GitHub access tokens at rest
//! - [`sealer`]: libsodium sealed boxes for GitHub Actions secret values
//!
//! Both are synchronous, stateless apart from the read-only vault key, and
//! safe to call concurrently from any number of requests.

pub mod sealer;
pub mod sensitive;
pub mod vault;

pub use sealer::{seal, RepoPublicKey, SealError, SealedSecret};
pub use sensitive::Sensitive;
pub use vault::{TokenVault, VaultError};
