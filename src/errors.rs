//! Merge failure conditions

/// All the ways a brush build or merge can fail
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CsgError {
    /// The flat vertex soup is not a whole number of triangles
    #[error("vertex count {0} is not a multiple of 3")]
    InvalidVertexCount(usize),
    /// A hole loop could not be bridged into its outline during
    /// face reconstruction
    #[error("no valid bridge segment found while joining a hole to its outline")]
    HoleBridgingFailed,
}
