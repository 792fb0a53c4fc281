//! Test-only crate. The tests live in `tests/` and drive the `ql-api`
//! router end to end over in-memory and mocked collaborators.
