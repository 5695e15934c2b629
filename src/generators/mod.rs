//! Descriptor and asset emission.
//!
//! Narrow collaborator surfaces the pipelines call during `configure`:
//! a platform manifest, the gradle descriptor set, and launcher icons.
//! Emission is deterministic — the same [`crate::BuildOptions`] always
//! produce byte-identical output — so `configure` is idempotent.

mod gradle;
mod icon;
mod manifest;

pub use gradle::{GradleScaffold, ModuleSpec};
pub use icon::{DefaultIconGenerator, IconGenerator, ICON_DENSITIES};
pub use manifest::{DefaultManifestGenerator, ManifestGenerator};
