//! Document-level conversion tests against Apple export fixtures.
