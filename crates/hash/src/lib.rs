//! Hash algorithms known to vigil, and the codec for the `hashnames` record.
//!
//! The [registry](registry) is a fixed, process-wide table. Every lookup hands
//! out a `&'static` [`HashAlgorithm`], so descriptors can be compared by name
//! and passed around freely without ownership concerns.
//!
//! The [codec](codec) turns one or two algorithms into the `new[:old]` string
//! stored in a database header, and back again.

pub mod codec;
pub mod error;
pub mod registry;

pub use crate::codec::HashNames;
pub use crate::registry::{DEFAULT_ALGORITHM, HashAlgorithm, Hasher, algorithms, lookup};
