//! Row structs and DTOs.
//!
//! Each submodule holds the `FromRow` entity matching its table plus the
//! create DTO and, where rows are mutable, an all-`Option` update DTO.

pub mod category;
pub mod product;
pub mod product_image;
pub mod user;
