//! Material shader lookup collaborator.
//!
//! The framework never compiles shaders itself; it walks the engine's
//! material fallback chains until a candidate has compiled shaders of every
//! requested type. A failed lookup is a recoverable result, so a missing
//! shader permutation degrades to a skipped draw instead of a crash.

use crate::error::{NoRenderableVariantSnafu, NullMaterialWithoutDomainSnafu, ShaderLookupError};
use crate::view::FeatureLevel;
use bon::Builder;
use slotmap::new_key_type;
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a material owned by the engine's material catalog.
    pub struct MaterialHandle;

    /// Handle to one compiled shader in the catalog's shader storage.
    pub struct ShaderHandle;
}

/// The broad pipeline domain a material was authored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialDomain {
    Surface,
    PostProcess,
    UserInterface,
}

/// Names one shader permutation a pass wants compiled, e.g. a vertex or
/// fragment entry of a custom pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderTypeTag(pub &'static str);

/// Parameters of a material shader lookup.
#[derive(Debug, Clone, Builder)]
pub struct ShaderFindSettings {
    /// Pass your view's current feature level rather than the global maximum
    /// where possible.
    pub feature_level: FeatureLevel,
    /// Required if the lookup should be able to fall back to the domain's
    /// default material; without it a null material cannot be resolved.
    pub domain: Option<MaterialDomain>,
    /// Set only when the requested shaders are mesh-material shaders.
    pub vertex_factory: Option<&'static str>,
}

/// A fallback material that could end up rendering the requested shaders.
#[derive(Debug, Clone, Copy)]
pub struct ShaderMatchCandidate {
    pub material: MaterialHandle,
    pub domain: MaterialDomain,
}

/// The chosen material plus its compiled shaders, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderMatch {
    pub material: MaterialHandle,
    pub shaders: SmallVec<[ShaderHandle; 4]>,
}

/// What the engine's material system exposes for fallback-walking lookups.
pub trait MaterialCatalog {
    /// The engine default material of a domain. Always renderable.
    fn default_material(&self, domain: MaterialDomain) -> MaterialHandle;

    /// The next material to try when `material` has no usable shaders.
    fn fallback_of(&self, material: MaterialHandle) -> Option<MaterialHandle>;

    fn domain_of(&self, material: MaterialHandle) -> Option<MaterialDomain>;

    /// Compiled shaders of every requested type, if the material has them at
    /// the settings' feature level. Never a partial answer.
    fn compiled_shaders(
        &self,
        material: MaterialHandle,
        shader_types: &[ShaderTypeTag],
        settings: &ShaderFindSettings,
    ) -> Option<SmallVec<[ShaderHandle; 4]>>;
}

/// Walks a material's fallback chain until one candidate matches the domain
/// constraint, passes the caller's predicate, and has compiled shaders of
/// every requested type.
///
/// A `None` material resolves to the default material of the constrained
/// domain. Exhausting the chain reports
/// [`ShaderLookupError::NoRenderableVariant`] so the caller can skip the
/// draw and keep the frame going.
pub fn find_material_shaders(
    catalog: &dyn MaterialCatalog,
    material: Option<MaterialHandle>,
    shader_types: &[ShaderTypeTag],
    settings: &ShaderFindSettings,
    mut accept: impl FnMut(&ShaderMatchCandidate) -> bool,
) -> Result<ShaderMatch, ShaderLookupError> {
    let start = match material {
        Some(material) => material,
        None => match settings.domain {
            Some(domain) => catalog.default_material(domain),
            None => return NullMaterialWithoutDomainSnafu.fail(),
        },
    };

    let mut current = Some(start);
    while let Some(candidate) = current {
        if let Some(domain) = catalog.domain_of(candidate)
            && settings.domain.is_none_or(|wanted| wanted == domain)
            && accept(&ShaderMatchCandidate {
                material: candidate,
                domain,
            })
            && let Some(shaders) = catalog.compiled_shaders(candidate, shader_types, settings)
        {
            return Ok(ShaderMatch {
                material: candidate,
                shaders,
            });
        }

        current = catalog.fallback_of(candidate);
    }

    NoRenderableVariantSnafu { material }.fail()
}
