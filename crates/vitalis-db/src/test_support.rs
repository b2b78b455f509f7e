//! Shared test utilities for vitalis-db unit tests.
