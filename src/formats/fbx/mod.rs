pub use baker::bake_buffer;

mod array;
mod baker;
mod geometry;
mod number;
mod property;
mod text;
mod transform;

/// The magic prefix of the binary FBX serialization.
const BINARY_MAGIC: &[u8] = b"Kaydara FBX Binary";

/// Whether the leading bytes of a file identify the binary FBX
/// serialization, which the baker does not process.
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes.starts_with(BINARY_MAGIC)
}
