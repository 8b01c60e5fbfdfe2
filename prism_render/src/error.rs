use crate::filter::Polarity;
use crate::shaders::MaterialHandle;
use snafu::Snafu;

/// Failure to mutate a filter list.
#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum FilterError {
    /// A list that already admits one polarity cannot take elements of the
    /// other without an explicit reconfigure-and-clear.
    #[snafu(display("tried to add a {adding:?} element to a {existing:?} filter"))]
    PolarityConflict {
        adding: Polarity,
        existing: Polarity,
    },
}

/// Failure to locate a compiled shader variant for a material.
#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum ShaderLookupError {
    /// No material in the fallback chain had compiled shaders of every
    /// requested type that also satisfied the caller's predicate.
    #[snafu(display("no renderable shader variant for material {material:?}"))]
    NoRenderableVariant { material: Option<MaterialHandle> },

    /// A null material can only resolve to a default when the lookup carries
    /// a domain constraint.
    #[snafu(display("cannot resolve a null material without a domain constraint"))]
    NullMaterialWithoutDomain,
}
