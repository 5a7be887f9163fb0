//! Anatomical face modules.
//!
//! Regions built from photo findings are aggregated into seven fixed zones,
//! each carrying its own issues and a run-length encoded mask.

mod card;
mod layout;
mod masks;

pub use card::{build_modules, MODULE_CARD_TYPE};
pub use layout::{module_box, ShrinkFactors, DEFAULT_FACE_OVAL};
pub use masks::{build_module_mask, region_bitmap, ModuleMask, ModuleMaskConfig};
