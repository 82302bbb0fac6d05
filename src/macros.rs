//! # Internal Macros
//!
//! Boilerplate reducers shared across the crate.
//!
//! ## le_accessors!
//!
//! Generates getter/setter pairs for zerocopy little-endian wrapper fields
//! (`U16`, `U32`, `U64`). On-disk structs keep their fields private and
//! expose native-typed accessors instead:
//!
//! ```ignore
//! use zerocopy::little_endian::{U32, U64};
//!
//! #[repr(C)]
//! struct DiskHeader {
//!     page_id: U64,
//!     storage_id: U32,
//! }
//!
//! impl DiskHeader {
//!     le_accessors! {
//!         page_id: u64 => U64,
//!         storage_id: u32 => U32,
//!     }
//! }
//! ```

/// Generates getter and setter methods for little-endian zerocopy fields.
#[macro_export]
macro_rules! le_accessors {
    ($($field:ident : $native:ty => $le:ty),* $(,)?) => {
        $(
            ::paste::paste! {
                #[inline]
                pub fn $field(&self) -> $native {
                    self.$field.get()
                }

                #[inline]
                pub fn [<set_ $field>](&mut self, value: $native) {
                    self.$field = <$le>::new(value);
                }
            }
        )*
    };
}
