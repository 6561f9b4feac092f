//! Public library API for loading versioned, self-describing chunk streams.

/// Stream transports, schema reconciliation, chunk relinking, and the result graph.
pub mod blend;
