pub mod bundle_indexing;
pub mod quaternion_wide;
pub mod transform_wide;
pub mod vector;
pub mod vector3_wide;

pub use self::bundle_indexing::BundleIndexing;
pub use self::quaternion_wide::QuaternionWide;
pub use self::transform_wide::TransformWide;
pub use self::vector::Vector;
pub use self::vector3_wide::Vector3Wide;
