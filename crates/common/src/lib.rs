// docpush-common: pure pipeline pieces (event filter, subscription outcomes, body patch).

pub mod subscription;
pub mod transform;
pub mod webhook;
