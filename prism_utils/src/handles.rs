use slotmap::new_key_type;

new_key_type! {
    /// Stable handle of a render pass component, issued by the world on spawn.
    pub struct PassComponentKey;

    /// Weak reference to a drawable primitive owned by the scene.
    ///
    /// Never extends the primitive's lifetime; holders validate it per access.
    pub struct PrimitiveHandle;
}
