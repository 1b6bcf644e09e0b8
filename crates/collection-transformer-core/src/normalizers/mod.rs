//! Same-generation canonicalization engines.
//!
//! Normalizers are registered per generation; only v1 exists today. The v2
//! family has no normalizer because v2 documents are already the nested,
//! self-describing shape that v1 normalization converges toward.

pub(crate) mod v1;
