pub mod claims;
pub mod serializer;

pub use claims::AccessClaims;
pub use serializer::JwtSerializer;
