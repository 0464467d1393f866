#![allow(dead_code, unused_imports)]

pub use datahook_test_utils::{builders, eventually, init_tracing, with_timeout};
