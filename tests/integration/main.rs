//! HTTP-level integration tests against an in-memory DocVault.

mod helpers;

mod fs_test;
mod grant_test;
mod role_test;
mod share_test;
