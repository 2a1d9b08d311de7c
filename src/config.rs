/// Manager-level settings, fixed at construction.
///
/// A concrete `ManagerConfig` binds the policy choices of a scheduler
/// instance. Separate managers may use different configurations; the
/// configuration never changes after `Manager::with_config`.
#[derive(Debug, Default, Clone, Copy)]
#[must_use]
pub struct ManagerConfig {
    /// Permit `execute`/`finish` to be re-entered from inside a running
    /// block.
    ///
    /// Off by default: accidental re-entry from a block is almost always a
    /// bug and is rejected with a panic. Callers whose nested passes are
    /// known not to create cycles may opt in. Forced on-demand resolution
    /// is unaffected by this flag; it is guarded separately by the
    /// duplicate-free computing stack.
    pub allow_recursive_execution: bool,
}
